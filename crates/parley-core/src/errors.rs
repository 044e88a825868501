//! Frame-level error types.

use thiserror::Error;

/// Reasons an inbound frame cannot be handled.
///
/// These never reach the client: the frame is logged and dropped and the
/// connection stays open.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The frame is not valid JSON.
    #[error("invalid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    /// The frame is JSON but not an object.
    #[error("payload is not a JSON object")]
    NotAnObject,

    /// A `type: "message"` payload without a usable `message` field.
    #[error("invalid chat message: {0}")]
    InvalidChat(#[source] serde_json::Error),
}

impl FrameError {
    /// Short classification string for logging/metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidJson(_) => "invalid_json",
            Self::NotAnObject => "not_an_object",
            Self::InvalidChat(_) => "invalid_chat",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_json_display() {
        let json_err = serde_json::from_str::<serde_json::Value>("{bad").unwrap_err();
        let err = FrameError::InvalidJson(json_err);
        assert!(err.to_string().starts_with("invalid JSON"));
        assert_eq!(err.kind(), "invalid_json");
    }

    #[test]
    fn not_an_object_display() {
        assert_eq!(
            FrameError::NotAnObject.to_string(),
            "payload is not a JSON object"
        );
    }
}
