//! History store error types.

use thiserror::Error;

/// Errors that can occur while reading or persisting the history file.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// Failed to read or write the history file.
    #[error("history file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    /// The history file is not valid JSON, or a record failed to serialize.
    #[error("history file JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// The history file is valid JSON but not an array.
    #[error("history file is not a JSON array")]
    NotAnArray,
}

/// Result type for history operations.
pub type Result<T> = std::result::Result<T, HistoryError>;
