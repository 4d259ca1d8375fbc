//! HTTP error mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

#[derive(Debug)]
pub enum ApiError {
    /// Infrastructure failure. Details are logged, never returned.
    Internal(notemind_core::Error),
    Unauthorized(String),
    NotFound(String),
    BadRequest(String),
    /// An upstream provider (model, OAuth) failed.
    BadGateway(String),
    ServiceUnavailable(String),
}

impl From<notemind_core::Error> for ApiError {
    fn from(err: notemind_core::Error) -> Self {
        use notemind_core::Error;
        match err {
            Error::NotFound(msg) => ApiError::NotFound(msg),
            Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            Error::Unauthorized(msg) => ApiError::Unauthorized(msg),
            e if e.is_provider_failure() => {
                tracing::warn!(subsystem = "api", error = %e, "Upstream provider failed");
                ApiError::BadGateway("The assistant is unavailable. Please try again.".to_string())
            }
            Error::Config(msg) => {
                tracing::error!(subsystem = "api", error = %msg, "Provider not configured");
                ApiError::ServiceUnavailable("The assistant is not configured.".to_string())
            }
            other => ApiError::Internal(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Internal(err) => {
                error!(
                    subsystem = "api",
                    error = %err,
                    "Request failed"
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong. Please try again.".to_string(),
                )
            }
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
            ApiError::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_error_mapping() {
        use notemind_core::Error;
        assert!(matches!(
            ApiError::from(Error::InvalidInput("Title is required".into())),
            ApiError::BadRequest(_)
        ));
        assert!(matches!(
            ApiError::from(Error::NotFound("note".into())),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            ApiError::from(Error::Timeout("30s".into())),
            ApiError::BadGateway(_)
        ));
        assert!(matches!(
            ApiError::from(Error::Internal("boom".into())),
            ApiError::Internal(_)
        ));
    }

    #[tokio::test]
    async fn test_internal_error_hides_details() {
        let resp = ApiError::Internal(notemind_core::Error::Internal("secret dsn".into()))
            .into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(!body.contains("secret dsn"));
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["error"], "Something went wrong. Please try again.");
    }
}
