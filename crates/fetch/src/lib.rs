//! SWR-style keyed fetch cache.
//!
//! Deduplicates concurrent requests to the same logical resource key, retains
//! the last known data while revalidating, and broadcasts state transitions
//! to any number of consumers. The cache is the only mutable state in the
//! sync engine and is siloed per resource key.
/// Keyed cache and revalidation machinery
pub mod cache;
/// Typed consumer-facing resource handles
pub mod resource;

pub use cache::{FetchCache, ResourceKey, RevalidateHandle};
pub use resource::{Resource, ResourceState};
