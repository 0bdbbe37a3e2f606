use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use dashmap::DashMap;
use eyre::Result;
use futures::future::BoxFuture;
use serde_json::Value;
use tokio::sync::watch;
use tracing::debug;

/// Cache key derived from an endpoint path plus its serialized query string.
///
/// Two requests with identical resolved parameters produce identical keys and
/// therefore share one cache entry.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ResourceKey(String);

impl ResourceKey {
    /// Wrap an already-serialized path-and-query string.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The path-and-query string this key was built from.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Snapshot of a cache entry, broadcast to consumers on every transition.
#[derive(Clone, Debug, Default)]
pub(crate) struct EntryState {
    pub(crate) data: Option<Arc<Value>>,
    pub(crate) error: Option<Arc<str>>,
    pub(crate) is_loading: bool,
}

#[derive(Debug)]
pub(crate) struct Entry {
    pub(crate) state: watch::Sender<EntryState>,
    in_flight: AtomicBool,
}

impl Entry {
    fn new() -> Self {
        let initial = EntryState { data: None, error: None, is_loading: true };
        Self { state: watch::channel(initial).0, in_flight: AtomicBool::new(false) }
    }
}

/// Type-erased fetch closure bound to a resource key.
pub(crate) type Fetcher = Arc<dyn Fn() -> BoxFuture<'static, Result<Value>> + Send + Sync>;

/// Process-wide cache of keyed resources.
///
/// Cloning is cheap and all clones share the same entries. Entries are
/// created lazily when a resource binds its key and survive until
/// [`FetchCache::reset`].
#[derive(Clone, Debug, Default)]
pub struct FetchCache {
    entries: Arc<DashMap<ResourceKey, Arc<Entry>>>,
}

impl FetchCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every cache entry. Intended for test isolation.
    ///
    /// Resources created before the reset keep observing their old, detached
    /// entries; recreate them to bind the fresh ones.
    pub fn reset(&self) {
        self.entries.clear();
    }

    /// Number of live cache entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn entry(&self, key: &ResourceKey) -> Arc<Entry> {
        let entry = self.entries.entry(key.clone()).or_insert_with(|| Arc::new(Entry::new()));
        Arc::clone(entry.value())
    }
}

/// Typed revalidation capability: forces a refetch of the bound resource.
///
/// This is the argument-free mutator handed to poll watchers; completion is
/// observable through the resource's state channel. Detached handles (no key,
/// e.g. while the API client is not ready) ignore revalidation requests.
#[derive(Clone)]
pub struct RevalidateHandle {
    pub(crate) key: Option<ResourceKey>,
    pub(crate) cache: FetchCache,
    pub(crate) fetcher: Option<Fetcher>,
}

impl fmt::Debug for RevalidateHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RevalidateHandle").field("key", &self.key).finish_non_exhaustive()
    }
}

impl RevalidateHandle {
    /// Refetch the bound entry, updating the cache when the response lands.
    ///
    /// At most one request per key is in flight at a time; revalidations that
    /// arrive while one is outstanding collapse into it. Must be called from
    /// within a Tokio runtime.
    pub fn revalidate(&self) {
        let (Some(key), Some(fetcher)) = (self.key.as_ref(), self.fetcher.as_ref()) else {
            return;
        };
        let entry = self.cache.entry(key);
        if entry.in_flight.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).is_err()
        {
            // collapse into the outstanding request
            return;
        }
        entry.state.send_modify(|state| state.is_loading = true);

        let fetcher = Arc::clone(fetcher);
        let key = key.clone();
        tokio::spawn(async move {
            let result = fetcher().await;
            entry.in_flight.store(false, Ordering::Release);
            match result {
                Ok(value) => {
                    entry.state.send_modify(|state| {
                        state.data = Some(Arc::new(value));
                        state.error = None;
                        state.is_loading = false;
                    });
                }
                Err(e) => {
                    debug!(key = %key, error = %e, "resource fetch failed");
                    // keep stale data visible alongside the error
                    entry.state.send_modify(|state| {
                        state.error = Some(Arc::from(format!("{e:#}")));
                        state.is_loading = false;
                    });
                }
            }
        });
    }

    /// Trigger the initial fetch unless the entry already holds data.
    pub(crate) fn prime(&self) {
        let Some(key) = self.key.as_ref() else { return };
        let entry = self.cache.entry(key);
        let has_data = entry.state.borrow().data.is_some();
        if !has_data {
            self.revalidate();
        }
    }
}
