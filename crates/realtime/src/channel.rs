use std::{
    collections::HashMap,
    fmt,
    sync::{
        Arc, Mutex, Weak,
        atomic::{AtomicU64, Ordering},
    },
};

use tracing::debug;

use crate::event::PushEvent;

type Handler = Arc<dyn Fn(&PushEvent) + Send + Sync>;

#[derive(Default)]
struct Inner {
    next_id: AtomicU64,
    topics: Mutex<HashMap<String, Vec<(u64, Handler)>>>,
}

/// Named-event subscription channel.
///
/// Subscribers bind a handler to an event name and receive every event
/// emitted under that name until their [`Subscription`] is dropped. Cloning
/// the channel is cheap; all clones share the same subscriber table.
#[derive(Clone, Default)]
pub struct PushChannel {
    inner: Arc<Inner>,
}

impl fmt::Debug for PushChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PushChannel").finish_non_exhaustive()
    }
}

impl PushChannel {
    /// Create an empty channel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `handler` to `event`, returning a guard that unbinds on drop.
    pub fn bind<F>(&self, event: &str, handler: F) -> Subscription
    where
        F: Fn(&PushEvent) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let mut topics = self.inner.topics.lock().expect("lock poisoned");
        topics.entry(event.to_owned()).or_default().push((id, Arc::new(handler)));
        Subscription { inner: Arc::downgrade(&self.inner), event: event.to_owned(), id }
    }

    /// Deliver `event` to every handler bound to its name.
    ///
    /// Handlers run on the emitting task; they are expected to be cheap
    /// (typically a revalidation trigger that spawns).
    pub fn emit(&self, event: &PushEvent) {
        let handlers: Vec<Handler> = {
            let topics = self.inner.topics.lock().expect("lock poisoned");
            topics.get(&event.event).map(|subs| subs.iter().map(|(_, h)| Arc::clone(h)).collect())
        }
        .unwrap_or_default();

        debug!(event = %event.event, subscribers = handlers.len(), "dispatching push event");
        for handler in handlers {
            handler(event);
        }
    }

    /// Number of handlers currently bound to `event`.
    pub fn subscriber_count(&self, event: &str) -> usize {
        let topics = self.inner.topics.lock().expect("lock poisoned");
        topics.get(event).map_or(0, Vec::len)
    }

    fn unbind(inner: &Inner, event: &str, id: u64) {
        let mut topics = inner.topics.lock().expect("lock poisoned");
        if let Some(subs) = topics.get_mut(event) {
            subs.retain(|(sub_id, _)| *sub_id != id);
            if subs.is_empty() {
                topics.remove(event);
            }
        }
    }
}

/// Guard for one handler binding; dropping it unbinds the handler.
///
/// Release happens on every exit path, so a panicking or early-returning
/// consumer can never leak its subscription. Unbinding is idempotent and
/// keyed by subscription identity, never by handler address.
#[derive(Debug)]
pub struct Subscription {
    inner: Weak<Inner>,
    event: String,
    id: u64,
}

impl Subscription {
    /// Event name this subscription is bound to.
    pub fn event(&self) -> &str {
        &self.event
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            PushChannel::unbind(&inner, &self.event, self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::PushChannel;
    use crate::event::{INCIDENT_CHANGE, INCIDENT_COMMENT, PushEvent};

    use std::sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    };

    #[test]
    fn emit_reaches_only_matching_subscribers() {
        let channel = PushChannel::new();
        let changes = Arc::new(AtomicU32::new(0));
        let comments = Arc::new(AtomicU32::new(0));

        let c = Arc::clone(&changes);
        let _on_change = channel.bind(INCIDENT_CHANGE, move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        let c = Arc::clone(&comments);
        let _on_comment = channel.bind(INCIDENT_COMMENT, move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        channel.emit(&PushEvent::new(INCIDENT_CHANGE, Some("inc-1".to_owned())));
        assert_eq!(changes.load(Ordering::SeqCst), 1);
        assert_eq!(comments.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn dropping_subscription_stops_delivery() {
        let channel = PushChannel::new();
        let seen = Arc::new(AtomicU32::new(0));

        let s = Arc::clone(&seen);
        let subscription = channel.bind(INCIDENT_CHANGE, move |_| {
            s.fetch_add(1, Ordering::SeqCst);
        });
        channel.emit(&PushEvent::new(INCIDENT_CHANGE, None));
        assert_eq!(seen.load(Ordering::SeqCst), 1);

        drop(subscription);
        channel.emit(&PushEvent::new(INCIDENT_CHANGE, None));
        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert_eq!(channel.subscriber_count(INCIDENT_CHANGE), 0);
    }

    #[test]
    fn rebinding_after_drop_delivers_once() {
        let channel = PushChannel::new();
        let seen = Arc::new(AtomicU32::new(0));

        let s = Arc::clone(&seen);
        let first = channel.bind(INCIDENT_CHANGE, move |_| {
            s.fetch_add(1, Ordering::SeqCst);
        });
        drop(first);

        let s = Arc::clone(&seen);
        let _second = channel.bind(INCIDENT_CHANGE, move |_| {
            s.fetch_add(1, Ordering::SeqCst);
        });
        channel.emit(&PushEvent::new(INCIDENT_CHANGE, None));
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn subscription_outliving_channel_is_harmless() {
        let seen = Arc::new(AtomicU32::new(0));
        let subscription = {
            let channel = PushChannel::new();
            let s = Arc::clone(&seen);
            channel.bind(INCIDENT_CHANGE, move |_| {
                s.fetch_add(1, Ordering::SeqCst);
            })
        };
        // the channel is gone; dropping the guard must not panic
        drop(subscription);
    }
}
