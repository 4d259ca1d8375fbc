//! Notes REST endpoints. Every route is scoped to the session's user.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use tracing::info;

use notemind_core::{CreateNoteRequest, UpdateNoteRequest};

use crate::auth::RequireAuth;
use crate::error::ApiError;
use crate::state::AppState;

const NOTE_NOT_FOUND: &str = "Note not found";

/// Body for `POST /api/notes`. A missing title is reported as a 400 by the
/// store's validation rather than as a deserialization failure.
#[derive(Debug, Deserialize)]
pub struct CreateNoteBody {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl From<CreateNoteBody> for CreateNoteRequest {
    fn from(body: CreateNoteBody) -> Self {
        CreateNoteRequest::new(body.title)
            .with_content(body.content)
            .with_tags(body.tags)
    }
}

pub async fn list_notes(
    State(state): State<AppState>,
    auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let notes = state.notes.list_notes(auth.user_id).await?;
    Ok(Json(notes))
}

pub async fn create_note(
    State(state): State<AppState>,
    auth: RequireAuth,
    Json(body): Json<CreateNoteBody>,
) -> Result<impl IntoResponse, ApiError> {
    let note = state.notes.create_note(auth.user_id, body.into()).await?;
    info!(
        subsystem = "api",
        op = "create_note",
        user_id = auth.user_id,
        note_id = note.id,
        "Note created"
    );
    Ok((StatusCode::CREATED, Json(note)))
}

pub async fn update_note(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<i64>,
    Json(body): Json<UpdateNoteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let note = state
        .notes
        .update_note(auth.user_id, id, body)
        .await?
        .ok_or_else(|| ApiError::NotFound(NOTE_NOT_FOUND.to_string()))?;
    Ok(Json(note))
}

pub async fn delete_note(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let note = state
        .notes
        .delete_note(auth.user_id, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(NOTE_NOT_FOUND.to_string()))?;
    Ok(Json(serde_json::json!({
        "message": "Note deleted",
        "note": note,
    })))
}

pub async fn toggle_pin(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let note = state
        .notes
        .toggle_pin(auth.user_id, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(NOTE_NOT_FOUND.to_string()))?;
    Ok(Json(note))
}

pub async fn list_tags(
    State(state): State<AppState>,
    auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let tags = state.notes.list_tags(auth.user_id).await?;
    Ok(Json(tags))
}
