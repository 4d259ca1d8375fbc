//! Sign-in, current user and sign-out.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use serde::Deserialize;
use tracing::{info, warn};

use crate::auth::RequireAuth;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// `GET /auth/google`: redirect to the Google consent screen.
pub async fn google_login(State(state): State<AppState>) -> Result<Response, ApiError> {
    if !state.oauth.is_configured() {
        return Err(ApiError::ServiceUnavailable(
            "Google sign-in is not configured".to_string(),
        ));
    }
    let url = state.oauth.authorize_url().await?;
    Ok(Redirect::to(&url).into_response())
}

/// `GET /auth/google/callback`: finish sign-in and issue a session.
pub async fn google_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Result<Response, ApiError> {
    if let Some(error) = query.error {
        warn!(subsystem = "api", component = "oauth", error = %error, "Google sign-in declined");
        return Err(ApiError::Unauthorized("Google sign-in was cancelled".to_string()));
    }

    let (code, oauth_state) = match (query.code, query.state) {
        (Some(code), Some(s)) if !code.is_empty() => (code, s),
        _ => {
            return Err(ApiError::BadRequest(
                "Missing authorization code".to_string(),
            ))
        }
    };
    if !state.oauth.take_state(&oauth_state).await {
        warn!(subsystem = "api", component = "oauth", "Unknown or expired OAuth state");
        return Err(ApiError::BadRequest(
            "Sign-in request expired. Please try again.".to_string(),
        ));
    }

    let profile = state.oauth.exchange(&code).await.map_err(|e| match e {
        notemind_core::Error::Unauthorized(msg) => ApiError::Unauthorized(msg),
        other if other.is_provider_failure() => {
            warn!(subsystem = "api", component = "oauth", error = %other, "Google request failed");
            ApiError::BadGateway("Google sign-in failed. Please try again.".to_string())
        }
        other => ApiError::from(other),
    })?;
    let user = state.accounts.find_or_create_google_user(&profile).await?;
    let session = state.accounts.create_session(user.id).await?;

    info!(
        subsystem = "api",
        op = "sign_in",
        user_id = user.id,
        "User signed in"
    );

    if state.frontend_url.is_empty() {
        return Ok(Json(serde_json::json!({
            "message": "Signed in",
            "user": user,
            "token": session.token,
        }))
        .into_response());
    }

    let target = format!(
        "{}/auth/callback?token={}",
        state.frontend_url,
        urlencoding::encode(&session.token)
    );
    Ok(Redirect::to(&target).into_response())
}

/// `GET /auth/me`
pub async fn me(
    State(state): State<AppState>,
    auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .accounts
        .get_user(auth.user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Session expired or invalid".to_string()))?;
    Ok(Json(serde_json::json!({ "user": user })))
}

/// `POST /auth/logout`
pub async fn logout(
    State(state): State<AppState>,
    auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    state.accounts.revoke_session(&auth.token).await?;
    info!(subsystem = "api", op = "sign_out", user_id = auth.user_id, "User signed out");
    Ok((
        StatusCode::OK,
        Json(serde_json::json!({ "message": "Signed out" })),
    ))
}
