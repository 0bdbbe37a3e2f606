//! Authenticated HTTP client for the incident management API.
/// REST client with readiness gating
pub mod client;
/// Retry helpers for HTTP operations
pub mod retry;

pub use client::ApiClient;
