//! Bearer-session authentication.

use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;

use crate::error::ApiError;
use crate::state::AppState;

/// Extractor for authenticated requests.
///
/// Resolves the `Authorization: Bearer <token>` session to its user. The
/// owner of every note operation comes from here, never from the request
/// body.
#[derive(Debug, Clone)]
pub struct RequireAuth {
    pub user_id: i64,
    pub token: String,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))?;

        match state.accounts.resolve_session(token).await? {
            Some(user_id) => Ok(RequireAuth {
                user_id,
                token: token.to_string(),
            }),
            None => Err(ApiError::Unauthorized(
                "Session expired or invalid".to_string(),
            )),
        }
    }
}
