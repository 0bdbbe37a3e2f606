use std::sync::Arc;

use fetch::{Resource, RevalidateHandle};
use primitives::ChangeToken;
use realtime::{INCIDENT_CHANGE, INCIDENT_COMMENT, PushChannel, Subscription};
use tokio::sync::watch;

/// Revalidates a bound resource whenever a named push event arrives.
///
/// The subscription is established on construction (unless paused) and
/// released on drop, so a watcher can never leak handlers across its
/// lifetime. One event triggers exactly one revalidation; overlapping
/// revalidations collapse in the fetch cache.
#[derive(Debug)]
pub struct PollWatcher {
    channel: PushChannel,
    event: String,
    revalidate: RevalidateHandle,
    subscription: Option<Subscription>,
}

impl PollWatcher {
    /// Watch `event` on `channel`, revalidating the bound resource per event.
    pub fn new(
        channel: &PushChannel,
        event: impl Into<String>,
        revalidate: RevalidateHandle,
    ) -> Self {
        Self::with_paused(channel, event, revalidate, false)
    }

    /// Like [`PollWatcher::new`], but optionally starting paused.
    pub fn with_paused(
        channel: &PushChannel,
        event: impl Into<String>,
        revalidate: RevalidateHandle,
        paused: bool,
    ) -> Self {
        let mut watcher = Self {
            channel: channel.clone(),
            event: event.into(),
            revalidate,
            subscription: None,
        };
        watcher.set_paused(paused);
        watcher
    }

    /// Suppress or re-establish the subscription.
    ///
    /// Events delivered while paused are ignored, not queued.
    pub fn set_paused(&mut self, paused: bool) {
        if paused {
            self.subscription = None;
        } else if self.subscription.is_none() {
            let revalidate = self.revalidate.clone();
            self.subscription =
                Some(self.channel.bind(&self.event, move |_event| revalidate.revalidate()));
        }
    }

    /// Whether the watcher is currently paused.
    pub fn is_paused(&self) -> bool {
        self.subscription.is_none()
    }
}

/// Revalidate `resource` whenever the server reports an incident change.
pub fn poll_incidents<T>(channel: &PushChannel, resource: &Resource<T>) -> PollWatcher {
    PollWatcher::new(channel, INCIDENT_CHANGE, resource.revalidator())
}

/// Revalidate `resource` whenever a comment lands on an incident.
pub fn poll_incident_comments<T>(channel: &PushChannel, resource: &Resource<T>) -> PollWatcher {
    PollWatcher::new(channel, INCIDENT_COMMENT, resource.revalidator())
}

/// Emits a fresh opaque [`ChangeToken`] on every matching push event.
///
/// For consumers that need to react to "something changed" without holding a
/// resource handle of their own.
#[derive(Debug)]
pub struct ChangeTokenWatcher {
    channel: PushChannel,
    event: String,
    token: Arc<watch::Sender<ChangeToken>>,
    subscription: Option<Subscription>,
}

impl ChangeTokenWatcher {
    /// Watch `event` on `channel`, regenerating the token per event.
    pub fn new(channel: &PushChannel, event: impl Into<String>) -> Self {
        let token = Arc::new(watch::channel(ChangeToken::initial()).0);
        let mut watcher =
            Self { channel: channel.clone(), event: event.into(), token, subscription: None };
        watcher.set_paused(false);
        watcher
    }

    /// Suppress or re-establish the subscription.
    pub fn set_paused(&mut self, paused: bool) {
        if paused {
            self.subscription = None;
        } else if self.subscription.is_none() {
            let token = Arc::clone(&self.token);
            self.subscription = Some(
                self.channel.bind(&self.event, move |_event| token.send_modify(|t| *t = t.next())),
            );
        }
    }

    /// Whether the watcher is currently paused.
    pub fn is_paused(&self) -> bool {
        self.subscription.is_none()
    }

    /// Subscribe to token regenerations.
    pub fn subscribe(&self) -> watch::Receiver<ChangeToken> {
        self.token.subscribe()
    }

    /// The token produced by the most recent event.
    pub fn current(&self) -> ChangeToken {
        *self.token.borrow()
    }
}
