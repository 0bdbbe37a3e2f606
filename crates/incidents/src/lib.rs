//! Incident read models and live-update plumbing.
//!
//! Composes the API client, the fetch cache and the push channel: consumers
//! ask for a read model, get back a cached [`fetch::Resource`], and
//! optionally attach a poll watcher so push events keep the resource fresh.
/// Push-driven revalidation watchers
pub mod poll;
/// Query parameter construction with stable cache keys
pub mod query;
/// Typed read models over the incident API
pub mod store;

pub use poll::{ChangeTokenWatcher, PollWatcher, poll_incident_comments, poll_incidents};
pub use query::{DEFAULT_PAGE_SIZE, FilterSet, IncidentsQuery, SortSpec};
pub use store::IncidentStore;
