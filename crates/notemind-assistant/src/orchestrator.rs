//! Turn sequencing.
//!
//! [`Assistant::handle_turn`] is a function of `(state, input)` returning
//! `(next_state, response)`. Where the state lives between turns is up to the
//! caller.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, error, info, warn};

use notemind_core::defaults::{
    CONFIRMATION_TTL_SECS, EXCERPT_CHARS, HISTORY_MAX_TURNS, MODEL_CALL_TIMEOUT_SECS,
};
use notemind_core::logging::SLOW_MODEL_CALL_MS;
use notemind_core::{ConversationTurn, Error, GenerationBackend, NoteStore, Result};

use crate::action::{validate, ActionKind, ActionProposal, Validated};
use crate::confirmation::{classify_reply, ConversationState, PendingConfirmation, Reply};
use crate::context::ContextBuilder;
use crate::envelope::{parse_envelope, Envelope};
use crate::executor::ActionExecutor;
use crate::response::ChatResponse;

pub const PROVIDER_FAILURE_MESSAGE: &str =
    "Sorry, I couldn't reach the assistant just now. Please try again.";
pub const FORMAT_FAILURE_MESSAGE: &str =
    "Sorry, I didn't understand the assistant's reply. Please try again.";
pub const UNKNOWN_ACTION_MESSAGE: &str = "I don't know how to do that.";
pub const CANCELLED_MESSAGE: &str = "Okay, I won't delete anything.";
pub const EXPIRED_MESSAGE: &str =
    "That deletion request has expired, so nothing was deleted. Please ask again if you still want to delete those notes.";

/// Tunables for the orchestrator.
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    /// Bound on a single model call.
    pub model_timeout: Duration,
    /// How long a pending confirmation stays valid.
    pub confirmation_ttl: Duration,
    pub excerpt_chars: usize,
    pub history_max_turns: usize,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            model_timeout: Duration::from_secs(MODEL_CALL_TIMEOUT_SECS),
            confirmation_ttl: Duration::from_secs(CONFIRMATION_TTL_SECS),
            excerpt_chars: EXCERPT_CHARS,
            history_max_turns: HISTORY_MAX_TURNS,
        }
    }
}

/// One user turn.
#[derive(Debug, Clone, Default)]
pub struct TurnInput {
    pub message: String,
    pub history: Vec<ConversationTurn>,
}

impl TurnInput {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            history: Vec::new(),
        }
    }

    pub fn with_history(mut self, history: Vec<ConversationTurn>) -> Self {
        self.history = history;
        self
    }
}

/// The conversational-action interpreter.
pub struct Assistant {
    store: Arc<dyn NoteStore>,
    model: Arc<dyn GenerationBackend>,
    context: ContextBuilder,
    config: AssistantConfig,
}

impl Assistant {
    pub fn new(store: Arc<dyn NoteStore>, model: Arc<dyn GenerationBackend>) -> Self {
        Self::with_config(store, model, AssistantConfig::default())
    }

    pub fn with_config(
        store: Arc<dyn NoteStore>,
        model: Arc<dyn GenerationBackend>,
        config: AssistantConfig,
    ) -> Self {
        Self {
            context: ContextBuilder::new(config.excerpt_chars, config.history_max_turns),
            store,
            model,
            config,
        }
    }

    pub fn config(&self) -> &AssistantConfig {
        &self.config
    }

    /// Process one user turn.
    ///
    /// Returns `InvalidInput` for an empty message and propagates store
    /// failures. Provider failures, unparseable replies, unknown actions and
    /// missing parameters are answered with a message and leave the
    /// conversation idle.
    pub async fn handle_turn(
        &self,
        owner: i64,
        state: ConversationState,
        input: TurnInput,
    ) -> Result<(ConversationState, ChatResponse)> {
        let message = input.message.trim();
        if message.is_empty() {
            return Err(Error::InvalidInput("Message is required".to_string()));
        }

        if let ConversationState::AwaitingConfirmation(pending) = state {
            if let Some(resolved) = self.resolve_pending(owner, pending, message).await? {
                return Ok((ConversationState::Idle, resolved));
            }
        }

        self.handle_request(owner, message, &input.history).await
    }

    /// Resolve a pending confirmation. `None` means the reply was unrelated:
    /// the pending request is dropped and the turn is handled as new.
    async fn resolve_pending(
        &self,
        owner: i64,
        pending: PendingConfirmation,
        message: &str,
    ) -> Result<Option<ChatResponse>> {
        let reply = classify_reply(message);
        let ttl = chrono::Duration::from_std(self.config.confirmation_ttl)
            .unwrap_or_else(|_| chrono::Duration::seconds(CONFIRMATION_TTL_SECS as i64));
        let expired = pending.is_expired(ttl, Utc::now());

        debug!(
            subsystem = "assistant",
            component = "confirmation",
            user_id = owner,
            reply = ?reply,
            expired,
            pending_count = pending.note_ids().len(),
            reason = pending.reason(),
            "Resolving pending confirmation"
        );

        match reply {
            Reply::Affirmative if expired => Ok(Some(ChatResponse::answer(EXPIRED_MESSAGE))),
            Reply::Affirmative => {
                let executor = ActionExecutor::new(self.store.as_ref(), owner);
                executor.execute_confirmed(pending.confirm()).await.map(Some)
            }
            Reply::Negative => Ok(Some(
                ChatResponse::answer(CANCELLED_MESSAGE).with_result(serde_json::json!({
                    "cancelled": true,
                    "noteIds": pending.note_ids(),
                })),
            )),
            Reply::Unrelated => {
                info!(
                    subsystem = "assistant",
                    component = "confirmation",
                    user_id = owner,
                    "Dropped pending confirmation after unrelated reply"
                );
                Ok(None)
            }
        }
    }

    async fn handle_request(
        &self,
        owner: i64,
        message: &str,
        history: &[ConversationTurn],
    ) -> Result<(ConversationState, ChatResponse)> {
        let now = Utc::now();
        let turn = self
            .context
            .build(self.store.as_ref(), owner, history, message, now)
            .await?;

        let raw = match self.call_model(owner, &turn.prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                if matches!(e, Error::Config(_)) {
                    error!(
                        subsystem = "assistant",
                        component = "orchestrator",
                        user_id = owner,
                        error = %e,
                        "Model provider is misconfigured"
                    );
                } else {
                    warn!(
                        subsystem = "assistant",
                        component = "orchestrator",
                        user_id = owner,
                        error = %e,
                        "Model call failed"
                    );
                }
                return Ok(idle(
                    ChatResponse::answer(PROVIDER_FAILURE_MESSAGE)
                        .with_result(serde_json::json!({ "error": "provider_unavailable" })),
                ));
            }
        };

        let proposal = match parse_envelope(&raw) {
            Ok(Envelope::Structured(obj)) => ActionProposal::from_object(&obj),
            Ok(Envelope::PlainText(text)) => {
                debug!(
                    subsystem = "assistant",
                    component = "orchestrator",
                    response_len = text.len(),
                    "Plain-text reply treated as answer"
                );
                ActionProposal::answer(text)
            }
            Err(e) => {
                warn!(
                    subsystem = "assistant",
                    component = "orchestrator",
                    user_id = owner,
                    error = %e,
                    response_len = raw.len(),
                    "Unparseable model reply"
                );
                return Ok(idle(
                    ChatResponse::answer(FORMAT_FAILURE_MESSAGE)
                        .with_result(serde_json::json!({ "error": "invalid_model_reply" })),
                ));
            }
        };

        match validate(&proposal) {
            Validated::Action(action) => {
                debug!(
                    subsystem = "assistant",
                    component = "orchestrator",
                    user_id = owner,
                    action = %action.kind(),
                    "Validated action"
                );
                let executor = ActionExecutor::new(self.store.as_ref(), owner);
                let outcome = executor.execute(action, &turn.notes, now).await?;
                Ok((outcome.next_state, outcome.response))
            }
            Validated::Clarify { kind, message } => {
                debug!(
                    subsystem = "assistant",
                    component = "orchestrator",
                    user_id = owner,
                    action = %kind,
                    "Missing parameters"
                );
                Ok(idle(ChatResponse::new(kind, message).with_parameters(
                    serde_json::Value::Object(proposal.parameters.clone()),
                )))
            }
            Validated::Unknown { name } => {
                warn!(
                    subsystem = "assistant",
                    component = "orchestrator",
                    user_id = owner,
                    action = %name,
                    "Model proposed an unknown action"
                );
                Ok(idle(
                    ChatResponse::new(ActionKind::AnswerQuestion, UNKNOWN_ACTION_MESSAGE)
                        .with_result(serde_json::json!({ "unknownAction": name })),
                ))
            }
        }
    }

    async fn call_model(
        &self,
        owner: i64,
        prompt: &notemind_core::ChatPrompt,
    ) -> Result<String> {
        let start = Instant::now();
        let result = tokio::time::timeout(self.config.model_timeout, self.model.generate_chat(prompt))
            .await
            .map_err(|_| {
                Error::Timeout(format!(
                    "Model did not answer within {}s",
                    self.config.model_timeout.as_secs()
                ))
            })?;

        let duration_ms = start.elapsed().as_millis() as u64;
        if duration_ms > SLOW_MODEL_CALL_MS {
            warn!(
                subsystem = "assistant",
                component = "orchestrator",
                user_id = owner,
                model = self.model.model_name(),
                duration_ms,
                "Slow model call"
            );
        }
        let raw = result?;
        debug!(
            subsystem = "assistant",
            component = "orchestrator",
            user_id = owner,
            model = self.model.model_name(),
            prompt_len = prompt.len(),
            response_len = raw.len(),
            duration_ms,
            "Model replied"
        );
        Ok(raw)
    }
}

fn idle(response: ChatResponse) -> (ConversationState, ChatResponse) {
    (ConversationState::Idle, response)
}
