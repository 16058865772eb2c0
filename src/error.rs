use thiserror::Error;

/// Failure of a whole batch call.
///
/// Per-statement SQL failures never surface here; they become
/// [`EntryResult::Error`](crate::results::EntryResult::Error) entries in the response.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[error(transparent)]
    SerializationError(#[from] serde_json::Error),

    #[error("Malformed batch request: {0}")]
    MalformedRequest(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Other batch error: {0}")]
    Other(String),
}
