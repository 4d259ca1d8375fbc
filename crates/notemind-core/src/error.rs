//! Error types for notemind.

use thiserror::Error;

/// Result type alias using notemind's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for notemind operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found or not owned by the caller
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Model reply could not be interpreted as an action.
    ///
    /// The raw reply is kept for diagnostics only and must never be treated
    /// as structured data.
    #[error("Format error: {message}")]
    Format { message: String, raw: String },

    /// Inference/generation failed
    #[error("Inference error: {0}")]
    Inference(String),

    /// Model call exceeded its time budget
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Authentication failed
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}

impl Error {
    /// Build a format error carrying the raw provider text.
    pub fn format(message: impl Into<String>, raw: impl Into<String>) -> Self {
        Error::Format {
            message: message.into(),
            raw: raw.into(),
        }
    }

    /// True for failures of the model call itself (provider error, timeout,
    /// unparseable reply). These are recovered into a retry prompt.
    pub fn is_provider_failure(&self) -> bool {
        matches!(
            self,
            Error::Inference(_) | Error::Timeout(_) | Error::Format { .. } | Error::Request(_)
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound("note 42".to_string());
        assert_eq!(err.to_string(), "Not found: note 42");
    }

    #[test]
    fn test_error_display_invalid_input() {
        let err = Error::InvalidInput("title is required".to_string());
        assert_eq!(err.to_string(), "Invalid input: title is required");
    }

    #[test]
    fn test_error_display_format_hides_raw() {
        let err = Error::format("no JSON object", "{ broken");
        assert_eq!(err.to_string(), "Format error: no JSON object");
    }

    #[test]
    fn test_error_display_timeout() {
        let err = Error::Timeout("model call exceeded 30s".to_string());
        assert_eq!(err.to_string(), "Timeout: model call exceeded 30s");
    }

    #[test]
    fn test_provider_failure_classification() {
        assert!(Error::Inference("503".into()).is_provider_failure());
        assert!(Error::Timeout("slow".into()).is_provider_failure());
        assert!(Error::format("bad", "raw").is_provider_failure());
        assert!(!Error::NotFound("x".into()).is_provider_failure());
        assert!(!Error::InvalidInput("x".into()).is_provider_failure());
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Serialization(_)));
    }
}
