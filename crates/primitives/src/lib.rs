//! Core primitives for the incidentscope project.
/// Opaque change-token type
pub mod change_token;
/// Retry helpers with exponential backoff
pub mod retries;

pub use change_token::ChangeToken;
