//! Server-to-client push notification channel.
//!
//! Decoupled from request/response HTTP: a WebSocket listener feeds a
//! named-event channel, and consumers subscribe by event name to invalidate
//! their cached resources when the server reports a change.
/// Named-event subscription channel
pub mod channel;
/// Push event names and payloads
pub mod event;
/// WebSocket listener feeding the channel
pub mod listener;

pub use channel::{PushChannel, Subscription};
pub use event::{INCIDENT_CHANGE, INCIDENT_COMMENT, PushEvent, PushPayload};
pub use listener::PushListener;
