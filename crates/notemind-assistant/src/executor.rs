//! Executes validated actions against the note store.

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{debug, info};

use notemind_core::{
    CreateNoteRequest, Error, Note, NoteStore, Result, UpdateNoteRequest,
};

use crate::action::{Action, ActionKind, NoteDraft};
use crate::confirmation::{ConfirmedDelete, ConversationState, PendingConfirmation};
use crate::query;
use crate::response::ChatResponse;

const NOT_FOUND_ONE: &str = "I couldn't find that note.";
const NOT_FOUND_MANY: &str = "I couldn't find those notes.";

/// Response plus the conversation state to carry into the next turn.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub response: ChatResponse,
    pub next_state: ConversationState,
}

impl Outcome {
    fn idle(response: ChatResponse) -> Self {
        Self {
            response,
            next_state: ConversationState::Idle,
        }
    }
}

/// Dispatches actions to a [`NoteStore`] for one owner.
pub struct ActionExecutor<'a> {
    store: &'a dyn NoteStore,
    owner: i64,
}

impl<'a> ActionExecutor<'a> {
    pub fn new(store: &'a dyn NoteStore, owner: i64) -> Self {
        Self { store, owner }
    }

    /// Execute a validated action.
    ///
    /// `notes` is the owner's note list fetched for this turn. Read-only
    /// actions run against it and confirmation requests are checked against
    /// it. Store failures propagate; invalid input and missing notes become
    /// user-facing messages with no side effects.
    pub async fn execute(
        &self,
        action: Action,
        notes: &[Note],
        now: DateTime<Utc>,
    ) -> Result<Outcome> {
        let kind = action.kind();
        let parameters = action.parameters();
        debug!(
            subsystem = "assistant",
            component = "executor",
            user_id = self.owner,
            action = %kind,
            "Executing action"
        );

        let result = match action {
            Action::CreateNote(draft) => self.create(draft).await,
            Action::CreateMultipleNotes(drafts) => self.create_many(drafts).await,
            Action::UpdateNote {
                note_id,
                title,
                content,
                tags,
            } => {
                let req = UpdateNoteRequest {
                    title: Some(title),
                    content,
                    tags,
                };
                self.update(note_id, req).await
            }
            Action::PinNote { note_id } => self.toggle_pin(note_id).await,
            Action::DeleteNote { note_id } => self.delete(note_id).await,
            Action::RequestDeleteConfirmation { note_ids, reason } => {
                return Ok(self.request_confirmation(note_ids, reason, notes, now));
            }
            Action::SearchNotes(q) => {
                let result = query::search(notes, &q, now);
                Ok(ChatResponse::new(kind, query::describe_search(&result))
                    .with_result(serde_json::to_value(&result)?))
            }
            Action::SummarizeNotes(summary_kind) => {
                let summary = query::summarize(notes, summary_kind);
                Ok(ChatResponse::new(kind, query::describe_summary(&summary))
                    .with_result(serde_json::to_value(&summary)?))
            }
            Action::AnswerQuestion { message } => {
                let message = if message.is_empty() {
                    "I'm not sure how to help with that. Could you rephrase?".to_string()
                } else {
                    message
                };
                Ok(ChatResponse::answer(message))
            }
        };

        let response = match result {
            Ok(response) => response,
            Err(Error::InvalidInput(reason)) => {
                debug!(
                    subsystem = "assistant",
                    component = "executor",
                    action = %kind,
                    error = %reason,
                    "Rejected invalid input"
                );
                ChatResponse::new(kind, format!("I couldn't do that: {}.", reason))
            }
            Err(e) => return Err(e),
        };

        Ok(Outcome::idle(response.with_parameters(parameters)))
    }

    /// Delete a batch the user has explicitly confirmed.
    ///
    /// Ids that no longer exist are reported rather than treated as errors.
    pub async fn execute_confirmed(&self, confirmed: ConfirmedDelete) -> Result<ChatResponse> {
        let requested = confirmed.note_ids();
        let deleted = self.store.delete_notes(self.owner, requested).await?;
        let missing: Vec<i64> = requested
            .iter()
            .copied()
            .filter(|id| !deleted.iter().any(|n| n.id == *id))
            .collect();

        info!(
            subsystem = "assistant",
            component = "executor",
            op = "delete_confirmed",
            user_id = self.owner,
            result_count = deleted.len(),
            missing = missing.len(),
            "Deleted confirmed notes"
        );

        let mut message = if deleted.is_empty() {
            "Those notes were already gone, so nothing was deleted.".to_string()
        } else {
            format!(
                "Deleted {} {}: {}.",
                deleted.len(),
                plural(deleted.len(), "note", "notes"),
                quoted_titles(&deleted)
            )
        };
        if !deleted.is_empty() && !missing.is_empty() {
            message.push_str(&format!(
                " {} of the selected notes had already been removed.",
                missing.len()
            ));
        }

        let mut response = ChatResponse::new(ActionKind::DeleteMultipleNotes, message)
            .with_parameters(json!({ "noteIds": requested }))
            .with_result(json!({ "deleted": deleted, "missingIds": missing }));
        if !deleted.is_empty() {
            response = response.performed();
        }
        Ok(response)
    }

    async fn create(&self, draft: NoteDraft) -> Result<ChatResponse> {
        let note = self.store.create_note(self.owner, draft_request(draft)).await?;
        info!(
            subsystem = "assistant",
            component = "executor",
            op = "create",
            user_id = self.owner,
            note_id = note.id,
            "Created note from chat"
        );
        Ok(
            ChatResponse::new(ActionKind::CreateNote, format!("Created \"{}\".", note.title))
                .with_result(json!({ "note": note }))
                .performed(),
        )
    }

    async fn create_many(&self, drafts: Vec<NoteDraft>) -> Result<ChatResponse> {
        let reqs = drafts.into_iter().map(draft_request).collect();
        let notes = self.store.create_notes(self.owner, reqs).await?;
        info!(
            subsystem = "assistant",
            component = "executor",
            op = "create_batch",
            user_id = self.owner,
            result_count = notes.len(),
            "Created notes from chat"
        );
        Ok(ChatResponse::new(
            ActionKind::CreateMultipleNotes,
            format!(
                "Created {} {}: {}.",
                notes.len(),
                plural(notes.len(), "note", "notes"),
                quoted_titles(&notes)
            ),
        )
        .with_result(json!({ "notes": notes }))
        .performed())
    }

    async fn update(&self, note_id: i64, req: UpdateNoteRequest) -> Result<ChatResponse> {
        let Some(note) = self.store.update_note(self.owner, note_id, req).await? else {
            return Ok(ChatResponse::new(ActionKind::UpdateNote, NOT_FOUND_ONE));
        };
        info!(
            subsystem = "assistant",
            component = "executor",
            op = "update",
            user_id = self.owner,
            note_id,
            "Updated note from chat"
        );
        Ok(
            ChatResponse::new(ActionKind::UpdateNote, format!("Updated \"{}\".", note.title))
                .with_result(json!({ "note": note }))
                .performed(),
        )
    }

    async fn toggle_pin(&self, note_id: i64) -> Result<ChatResponse> {
        let Some(note) = self.store.toggle_pin(self.owner, note_id).await? else {
            return Ok(ChatResponse::new(ActionKind::PinNote, NOT_FOUND_ONE));
        };
        let verb = if note.pinned { "Pinned" } else { "Unpinned" };
        Ok(
            ChatResponse::new(ActionKind::PinNote, format!("{} \"{}\".", verb, note.title))
                .with_result(json!({ "note": note }))
                .performed(),
        )
    }

    async fn delete(&self, note_id: i64) -> Result<ChatResponse> {
        let Some(note) = self.store.delete_note(self.owner, note_id).await? else {
            return Ok(ChatResponse::new(ActionKind::DeleteNote, NOT_FOUND_ONE));
        };
        info!(
            subsystem = "assistant",
            component = "executor",
            op = "delete",
            user_id = self.owner,
            note_id,
            "Deleted note from chat"
        );
        Ok(
            ChatResponse::new(ActionKind::DeleteNote, format!("Deleted \"{}\".", note.title))
                .with_result(json!({ "note": note }))
                .performed(),
        )
    }

    /// Move to awaiting confirmation for the ids that exist in `notes`.
    fn request_confirmation(
        &self,
        note_ids: Vec<i64>,
        reason: String,
        notes: &[Note],
        now: DateTime<Utc>,
    ) -> Outcome {
        let targets: Vec<&Note> = note_ids
            .iter()
            .filter_map(|id| notes.iter().find(|n| n.id == *id))
            .collect();

        if targets.is_empty() {
            return Outcome::idle(
                ChatResponse::new(ActionKind::RequestDeleteConfirmation, NOT_FOUND_MANY)
                    .with_parameters(json!({ "noteIds": note_ids, "reason": reason })),
            );
        }

        let ids: Vec<i64> = targets.iter().map(|n| n.id).collect();
        let mut message = if reason.is_empty() {
            "Are you sure you want to delete these notes?".to_string()
        } else {
            reason.clone()
        };
        message.push_str(&format!(
            "\n\nThis will permanently delete {} {}:",
            targets.len(),
            plural(targets.len(), "note", "notes")
        ));
        for note in &targets {
            message.push_str(&format!("\n- {} (#{})", note.title, note.id));
        }
        message.push_str("\n\nReply \"yes\" to delete them or \"no\" to keep them.");

        debug!(
            subsystem = "assistant",
            component = "executor",
            user_id = self.owner,
            result_count = ids.len(),
            "Awaiting delete confirmation"
        );

        let pending_notes: Vec<_> = targets
            .iter()
            .map(|n| json!({ "id": n.id, "title": n.title }))
            .collect();
        let response = ChatResponse::new(ActionKind::RequestDeleteConfirmation, message)
            .with_parameters(json!({ "noteIds": ids, "reason": reason }))
            .with_result(json!({ "pendingNotes": pending_notes }))
            .awaiting_confirmation();

        Outcome {
            response,
            next_state: ConversationState::awaiting(PendingConfirmation::new(ids, reason, now)),
        }
    }
}

fn draft_request(draft: NoteDraft) -> CreateNoteRequest {
    CreateNoteRequest::new(draft.title)
        .with_content(draft.content)
        .with_tags(draft.tags)
}

fn plural<'s>(n: usize, one: &'s str, many: &'s str) -> &'s str {
    if n == 1 {
        one
    } else {
        many
    }
}

fn quoted_titles(notes: &[Note]) -> String {
    notes
        .iter()
        .map(|n| format!("\"{}\"", n.title))
        .collect::<Vec<_>>()
        .join(", ")
}
