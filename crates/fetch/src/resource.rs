use std::{fmt, future::Future, marker::PhantomData, sync::Arc};

use eyre::Result;
use futures::FutureExt;
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::watch;

use crate::cache::{EntryState, FetchCache, Fetcher, ResourceKey, RevalidateHandle};

/// Snapshot of a typed resource.
#[derive(Clone, Debug)]
pub struct ResourceState<T> {
    /// Last fetched data; stale while a revalidation is outstanding.
    pub data: Option<T>,
    /// Error from the most recent fetch, if it failed.
    pub error: Option<String>,
    /// Whether a fetch is outstanding or the resource is gated on readiness.
    pub is_loading: bool,
}

impl<T> ResourceState<T> {
    const fn loading() -> Self {
        Self { data: None, error: None, is_loading: true }
    }
}

/// A consumer handle to one cached resource.
///
/// Handles sharing a key share one cache entry; dropping a handle never
/// cancels an in-flight fetch, whose response lands in the cache (or is
/// discarded harmlessly if the cache was reset in the meantime).
pub struct Resource<T> {
    handle: RevalidateHandle,
    rx: Option<watch::Receiver<EntryState>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Resource<T> {
    fn clone(&self) -> Self {
        Self { handle: self.handle.clone(), rx: self.rx.clone(), _marker: PhantomData }
    }
}

impl<T> fmt::Debug for Resource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource").field("key", &self.handle.key).finish_non_exhaustive()
    }
}

impl FetchCache {
    /// Create a typed resource bound to `key`.
    ///
    /// A `None` key produces a detached resource: it reports loading and
    /// issues no fetch; recreate it once a concrete key is available. With a
    /// concrete key an initial fetch is triggered unless the cache already
    /// holds data for it. Must be called from within a Tokio runtime.
    pub fn resource<T, F, Fut>(&self, key: Option<ResourceKey>, fetch: F) -> Resource<T>
    where
        T: Serialize + DeserializeOwned,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let Some(key) = key else {
            return Resource {
                handle: RevalidateHandle { key: None, cache: self.clone(), fetcher: None },
                rx: None,
                _marker: PhantomData,
            };
        };

        let fetcher: Fetcher = Arc::new(move || {
            let fut = fetch();
            async move {
                let value = fut.await?;
                Ok(serde_json::to_value(value)?)
            }
            .boxed()
        });

        let entry = self.entry(&key);
        let rx = entry.state.subscribe();
        let resource = Resource {
            handle: RevalidateHandle {
                key: Some(key),
                cache: self.clone(),
                fetcher: Some(fetcher),
            },
            rx: Some(rx),
            _marker: PhantomData,
        };
        resource.handle.prime();
        resource
    }
}

impl<T: DeserializeOwned> Resource<T> {
    /// Current snapshot of the resource.
    ///
    /// A payload that fails to deserialize surfaces in the error slot rather
    /// than panicking.
    pub fn state(&self) -> ResourceState<T> {
        let Some(rx) = &self.rx else { return ResourceState::loading() };
        let entry = rx.borrow().clone();

        let mut error = entry.error.as_ref().map(|e| e.to_string());
        let data = entry.data.as_ref().and_then(|value| {
            match serde_json::from_value::<T>((**value).clone()) {
                Ok(data) => Some(data),
                Err(e) => {
                    error = Some(format!("malformed payload: {e}"));
                    None
                }
            }
        });

        ResourceState { data, error, is_loading: entry.is_loading }
    }
}

impl<T> Resource<T> {
    /// Key this resource is bound to, if any.
    pub fn key(&self) -> Option<&ResourceKey> {
        self.handle.key.as_ref()
    }

    /// Whether the resource is detached (readiness-gated or missing id).
    pub fn is_detached(&self) -> bool {
        self.rx.is_none()
    }

    /// Force a refetch of the underlying cache entry.
    pub fn revalidate(&self) {
        self.handle.revalidate();
    }

    /// A non-generic clone of the revalidation capability.
    pub fn revalidator(&self) -> RevalidateHandle {
        self.handle.clone()
    }

    /// Wait until the underlying entry transitions.
    ///
    /// Detached resources never transition; this future then never resolves.
    pub async fn changed(&mut self) {
        match &mut self.rx {
            Some(rx) => {
                let _ = rx.changed().await;
            }
            None => std::future::pending::<()>().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Resource, ResourceState};
    use crate::cache::{FetchCache, ResourceKey};

    use std::sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    };

    use serde::de::DeserializeOwned;
    use tokio::sync::Notify;

    async fn settle<T: DeserializeOwned>(resource: &mut Resource<T>) -> ResourceState<T> {
        loop {
            let state = resource.state();
            if !state.is_loading {
                return state;
            }
            resource.changed().await;
        }
    }

    #[tokio::test]
    async fn initial_fetch_populates_data() {
        let cache = FetchCache::new();
        let mut resource: Resource<u32> =
            cache.resource(Some(ResourceKey::new("/incidents/meta")), || async { Ok(41) });
        let state = settle(&mut resource).await;
        assert_eq!(state.data, Some(41));
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn concurrent_revalidations_collapse_to_one_request() {
        let cache = FetchCache::new();
        let calls = Arc::new(AtomicU32::new(0));
        let gate = Arc::new(Notify::new());

        let key = ResourceKey::new("/incidents?limit=20&offset=0");
        let calls_in = Arc::clone(&calls);
        let gate_in = Arc::clone(&gate);
        let mut resource: Resource<u32> = cache.resource(Some(key), move || {
            let calls = Arc::clone(&calls_in);
            let gate = Arc::clone(&gate_in);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                gate.notified().await;
                Ok(7)
            }
        });

        // construction primed one fetch; these must collapse into it
        resource.revalidate();
        resource.revalidate();

        gate.notify_one();
        let state = settle(&mut resource).await;
        assert_eq!(state.data, Some(7));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn detached_resource_issues_no_fetch() {
        let cache = FetchCache::new();
        let calls = Arc::new(AtomicU32::new(0));
        let calls_in = Arc::clone(&calls);
        let resource: Resource<u32> = cache.resource(None, move || {
            let calls = Arc::clone(&calls_in);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(1)
            }
        });

        assert!(resource.is_detached());
        let state = resource.state();
        assert!(state.is_loading);
        assert!(state.data.is_none());
        assert!(state.error.is_none());

        // revalidation requests on a detached resource are ignored
        resource.revalidate();
        tokio::task::yield_now().await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn fetch_error_keeps_stale_data() {
        let cache = FetchCache::new();
        let calls = Arc::new(AtomicU32::new(0));
        let calls_in = Arc::clone(&calls);
        let mut resource: Resource<u32> =
            cache.resource(Some(ResourceKey::new("/incidents/inc-1")), move || {
                let calls = Arc::clone(&calls_in);
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                        Ok(5)
                    } else {
                        Err(eyre::eyre!("backend unavailable"))
                    }
                }
            });

        let state = settle(&mut resource).await;
        assert_eq!(state.data, Some(5));

        resource.revalidate();
        let state = settle(&mut resource).await;
        assert_eq!(state.data, Some(5));
        assert!(state.error.as_deref().unwrap().contains("backend unavailable"));
    }

    #[tokio::test]
    async fn late_response_after_consumer_drop_is_harmless() {
        let cache = FetchCache::new();
        let calls = Arc::new(AtomicU32::new(0));
        let gate = Arc::new(Notify::new());

        let key = ResourceKey::new("/incidents/inc-9");
        let calls_in = Arc::clone(&calls);
        let gate_in = Arc::clone(&gate);
        let first: Resource<u32> = cache.resource(Some(key.clone()), move || {
            let calls = Arc::clone(&calls_in);
            let gate = Arc::clone(&gate_in);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                gate.notified().await;
                Ok(9)
            }
        });
        drop(first);

        // a second consumer binds while the orphaned fetch is still in flight
        let mut second: Resource<u32> =
            cache.resource(Some(key), || async { Ok(9) });
        gate.notify_one();
        let state = settle(&mut second).await;
        assert_eq!(state.data, Some(9));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn malformed_payload_surfaces_as_error() {
        let cache = FetchCache::new();
        // cache a string where the consumer expects a number
        let mut producer: Resource<String> = cache.resource(
            Some(ResourceKey::new("/incidents/meta")),
            || async { Ok("not-a-number".to_owned()) },
        );
        let _ = settle(&mut producer).await;

        let consumer: Resource<u32> =
            cache.resource(Some(ResourceKey::new("/incidents/meta")), || async { Ok(3) });
        let state = consumer.state();
        assert!(state.data.is_none());
        assert!(state.error.as_deref().unwrap().starts_with("malformed payload"));
    }

    #[tokio::test]
    async fn reset_forces_refetch_for_new_consumers() {
        let cache = FetchCache::new();
        let calls = Arc::new(AtomicU32::new(0));

        let calls_a = Arc::clone(&calls);
        let mut a: Resource<u32> =
            cache.resource(Some(ResourceKey::new("/incidents/meta")), move || {
                let calls = Arc::clone(&calls_a);
                async move { Ok(calls.fetch_add(1, Ordering::SeqCst)) }
            });
        let _ = settle(&mut a).await;
        cache.reset();

        let calls_b = Arc::clone(&calls);
        let mut b: Resource<u32> =
            cache.resource(Some(ResourceKey::new("/incidents/meta")), move || {
                let calls = Arc::clone(&calls_b);
                async move { Ok(calls.fetch_add(1, Ordering::SeqCst)) }
            });
        let state = settle(&mut b).await;
        assert_eq!(state.data, Some(1));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
