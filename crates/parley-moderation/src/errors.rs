//! Error types for moderation setup.

use thiserror::Error;

/// Errors that can occur while building the moderation engine.
#[derive(Debug, Error)]
pub enum ModerationError {
    /// Failed to read the blocked-word file.
    #[error("failed to read blocked-word list: {0}")]
    Io(#[from] std::io::Error),

    /// The blocked-word file is not a JSON array of strings.
    #[error("failed to parse blocked-word list: {0}")]
    Json(#[from] serde_json::Error),

    /// A blocked word could not be compiled into a heat pattern.
    #[error("invalid blocked-word pattern: {0}")]
    Regex(#[from] regex::Error),

    /// Heat threshold outside `0..=100`.
    #[error("invalid heat threshold: {0}")]
    InvalidThreshold(f64),
}

/// Result type for moderation setup.
pub type Result<T> = std::result::Result<T, ModerationError>;
