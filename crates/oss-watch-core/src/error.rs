//! Error types shared across the OSS Watch workspace.

use thiserror::Error;

/// Result type used throughout OSS Watch.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur anywhere in the discovery / analysis pipelines.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Upstream rate limit was breached or the safety floor was reached.
    #[error("rate limit exceeded{}", .retry_after_secs.map(|s| format!(", retry after {s}s")).unwrap_or_default())]
    RateLimitExceeded {
        /// Seconds to wait before retrying, if known.
        retry_after_secs: Option<u64>,
    },

    /// Upstream endpoint returned a non-404 error, timed out, or returned a
    /// malformed payload.
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Requested entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Caller-supplied input failed validation before any work began.
    #[error("validation error: {0}")]
    ValidationError(String),

    /// A Store operation failed.
    #[error("store error: {0}")]
    StoreError(String),

    /// A pipeline observed its cancellation token firing.
    #[error("operation cancelled")]
    Cancelled,

    /// Serialization/deserialization failure.
    #[error("serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::NotFound("octocat/hello-world".to_string());
        assert_eq!(err.to_string(), "not found: octocat/hello-world");

        let err = Error::RateLimitExceeded {
            retry_after_secs: Some(30),
        };
        assert!(err.to_string().contains("retry after 30s"));

        let err = Error::RateLimitExceeded {
            retry_after_secs: None,
        };
        assert_eq!(err.to_string(), "rate limit exceeded");
    }
}
