//! Gemini-specific error handling.

use notemind_core::Error;

/// Gemini error classes derived from HTTP status and the `error.status` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeminiErrorCode {
    /// Missing or invalid API key.
    AuthenticationError,
    /// Quota or rate limit exhausted.
    RateLimitExceeded,
    /// Model not found or not available.
    ModelNotFound,
    /// Malformed request (bad schema, oversized prompt).
    InvalidRequest,
    /// Server error.
    ServerError,
    /// Unknown error.
    Unknown,
}

impl GeminiErrorCode {
    /// Determine error code from HTTP status and the API's status string.
    pub fn from_response(status: u16, api_status: &str) -> Self {
        match (status, api_status) {
            (401, _) | (403, _) | (_, "UNAUTHENTICATED") | (_, "PERMISSION_DENIED") => {
                Self::AuthenticationError
            }
            (429, _) | (_, "RESOURCE_EXHAUSTED") => Self::RateLimitExceeded,
            (404, _) | (_, "NOT_FOUND") => Self::ModelNotFound,
            (400, _) | (_, "INVALID_ARGUMENT") | (_, "FAILED_PRECONDITION") => {
                Self::InvalidRequest
            }
            (500..=599, _) => Self::ServerError,
            _ => Self::Unknown,
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimitExceeded | Self::ServerError)
    }
}

/// Convert a Gemini error to a notemind Error.
pub fn to_notemind_error(code: GeminiErrorCode, message: &str) -> Error {
    match code {
        GeminiErrorCode::AuthenticationError => {
            Error::Config(format!("Gemini authentication failed: {}", message))
        }
        GeminiErrorCode::ModelNotFound => {
            Error::Config(format!("Gemini model not found: {}", message))
        }
        GeminiErrorCode::RateLimitExceeded => {
            Error::Inference(format!("Rate limit exceeded: {}", message))
        }
        GeminiErrorCode::InvalidRequest => {
            Error::Inference(format!("Invalid request: {}", message))
        }
        GeminiErrorCode::ServerError => Error::Inference(format!("Server error: {}", message)),
        GeminiErrorCode::Unknown => Error::Inference(message.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_from_403() {
        let code = GeminiErrorCode::from_response(403, "PERMISSION_DENIED");
        assert_eq!(code, GeminiErrorCode::AuthenticationError);
    }

    #[test]
    fn test_error_code_from_429() {
        let code = GeminiErrorCode::from_response(429, "RESOURCE_EXHAUSTED");
        assert_eq!(code, GeminiErrorCode::RateLimitExceeded);
        assert!(code.is_retryable());
    }

    #[test]
    fn test_error_code_from_400() {
        let code = GeminiErrorCode::from_response(400, "INVALID_ARGUMENT");
        assert_eq!(code, GeminiErrorCode::InvalidRequest);
        assert!(!code.is_retryable());
    }

    #[test]
    fn test_error_code_from_503() {
        let code = GeminiErrorCode::from_response(503, "UNAVAILABLE");
        assert_eq!(code, GeminiErrorCode::ServerError);
        assert!(code.is_retryable());
    }

    #[test]
    fn test_auth_errors_map_to_config() {
        let err = to_notemind_error(GeminiErrorCode::AuthenticationError, "API key not valid");
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_server_errors_map_to_inference() {
        let err = to_notemind_error(GeminiErrorCode::ServerError, "overloaded");
        assert!(matches!(err, Error::Inference(_)));
        assert!(err.is_provider_failure());
    }
}
