//! Assistant endpoints.

use std::time::Instant;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use tracing::{debug, info};

use notemind_assistant::{ConversationState, TurnInput};
use notemind_core::ConversationTurn;

use crate::auth::RequireAuth;
use crate::conversations::conversation_key;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub conversation_history: Vec<ConversationTurn>,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

/// `POST /api/ai/chat`: one conversational turn.
///
/// Pending confirmations live server-side; the client only echoes its
/// history and, optionally, a conversation id for multiple open chats.
pub async fn chat(
    State(state): State<AppState>,
    auth: RequireAuth,
    Json(req): Json<ChatRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.message.trim().is_empty() {
        return Err(ApiError::BadRequest("Message is required".to_string()));
    }

    let start = Instant::now();
    let conversation_id = conversation_key(req.conversation_id.as_deref());
    let current = state.conversations.load(auth.user_id, &conversation_id).await;
    debug!(
        subsystem = "api",
        op = "chat",
        user_id = auth.user_id,
        conversation_id = %conversation_id,
        awaiting = !current.is_idle(),
        history_len = req.conversation_history.len(),
        "Chat turn received"
    );

    let was_awaiting = !current.is_idle();
    let input = TurnInput::new(req.message).with_history(req.conversation_history);
    let (next, response) = match state
        .assistant
        .handle_turn(auth.user_id, current, input)
        .await
    {
        Ok(turn) => turn,
        Err(e) => {
            // The turn consumed any pending confirmation even though it failed.
            if was_awaiting {
                state
                    .conversations
                    .save(auth.user_id, &conversation_id, ConversationState::Idle)
                    .await;
            }
            return Err(e.into());
        }
    };
    state
        .conversations
        .save(auth.user_id, &conversation_id, next)
        .await;

    info!(
        subsystem = "api",
        op = "chat",
        user_id = auth.user_id,
        action = %response.action,
        action_performed = response.action_performed,
        duration_ms = start.elapsed().as_millis() as u64,
        "Chat turn completed"
    );
    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
pub struct GenerateNoteRequest {
    #[serde(default)]
    pub prompt: String,
}

/// `POST /api/ai/generate-note`: draft a title and body without saving.
pub async fn generate_note(
    State(state): State<AppState>,
    auth: RequireAuth,
    Json(req): Json<GenerateNoteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let draft = state.drafter.draft(&req.prompt).await?;
    debug!(
        subsystem = "api",
        op = "generate_note",
        user_id = auth.user_id,
        content_len = draft.content.len(),
        "Note draft generated"
    );
    Ok(Json(draft))
}
