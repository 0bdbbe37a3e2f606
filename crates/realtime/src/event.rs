use serde::{Deserialize, Serialize};

/// Event emitted whenever an incident is created, updated or deleted.
pub const INCIDENT_CHANGE: &str = "incident-change";

/// Event emitted whenever a comment is posted on an incident.
pub const INCIDENT_COMMENT: &str = "incident-comment";

/// Payload carried by incident push events.
///
/// The schema is exactly this; unknown extra fields sent by newer backends
/// are ignored on deserialize.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PushPayload {
    /// Incident the event refers to, or `None` for tenant-wide changes.
    #[serde(default)]
    pub incident_id: Option<String>,
}

/// A named server-originated event.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PushEvent {
    /// Event name, e.g. [`INCIDENT_CHANGE`].
    pub event: String,
    /// Event payload.
    #[serde(default)]
    pub payload: PushPayload,
}

impl PushEvent {
    /// Build an event with the given name and optional incident id.
    pub fn new(event: impl Into<String>, incident_id: Option<String>) -> Self {
        Self { event: event.into(), payload: PushPayload { incident_id } }
    }
}
