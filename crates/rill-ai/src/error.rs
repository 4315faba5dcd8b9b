//! Error types for rill-ai

use thiserror::Error;

/// Result type alias using rill-ai Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when talking to an inference endpoint
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Reading a local file (attachment) failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Endpoint answered with a non-success status
    #[error("Endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Request was cancelled by the caller
    #[error("Request aborted")]
    Aborted,

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Create a status error from a code and response body
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            body: body.into(),
        }
    }

    /// Whether this error is the result of a deliberate cancellation.
    ///
    /// Every other variant counts as a transport failure.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Error::Aborted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aborted_is_cancellation() {
        assert!(Error::Aborted.is_cancellation());
    }

    #[test]
    fn test_transport_failures_are_not_cancellation() {
        assert!(!Error::status(500, "boom").is_cancellation());
        assert!(!Error::InvalidConfig("bad url".into()).is_cancellation());
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        assert!(!Error::from(io).is_cancellation());
        let json = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(!Error::from(json).is_cancellation());
    }

    #[test]
    fn test_status_display_includes_code_and_body() {
        let e = Error::status(503, "model loading");
        let text = e.to_string();
        assert!(text.contains("503"), "got: {}", text);
        assert!(text.contains("model loading"), "got: {}", text);
    }
}
