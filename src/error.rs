//! Error types.
//!
//! Payload decoding has no error type: malformed data resolves to `None`.

use thiserror::Error;

/// Failure of the durable message store.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures reported by the presence collaborators.
///
/// None of these are fatal to the controller; they are logged and the last
/// known-good state is kept.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PresenceError {
    #[error("token fetch failed: {0}")]
    TokenFetch(String),
    #[error("token delete failed: {0}")]
    TokenDelete(String),
    #[error("registry write failed: {0}")]
    Registry(String),
    #[error("presence controller is not running")]
    ControllerClosed,
}

/// Top-level error for the composition root.
#[derive(Error, Debug)]
pub enum InboxError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Presence(#[from] PresenceError),
    #[error("invalid configuration: {0}")]
    Config(String),
}
