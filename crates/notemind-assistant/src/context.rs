//! Prompt context for one conversational turn.
//!
//! The model sees a condensed digest of the owner's notes, the closed list of
//! actions it may propose, and the deletion safety rules. Client-supplied
//! history is sanitized before it is forwarded.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use notemind_core::defaults::{EXCERPT_CHARS, HISTORY_MAX_TURNS};
use notemind_core::{excerpt, ChatPrompt, ChatRole, ConversationTurn, Note, NoteStore, Result};

use crate::action::ActionKind;

/// A note as presented to the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteDigest {
    pub id: i64,
    pub title: String,
    pub excerpt: String,
    pub tags: Vec<String>,
    pub pinned: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NoteDigest {
    pub fn from_note(note: &Note, excerpt_chars: usize) -> Self {
        Self {
            id: note.id,
            title: note.title.clone(),
            excerpt: excerpt(&note.content, excerpt_chars),
            tags: note.tags.clone(),
            pinned: note.pinned,
            created_at: note.created_at,
            updated_at: note.updated_at,
        }
    }
}

const SAFETY_RULES: &str = "\
Safety rules:
- Only use note ids that appear in the note list above.
- To delete exactly one note the user identified, use DELETE_NOTE.
- Any deletion that touches more than one note, or that selects notes by tag, \
category, date, or any other criteria instead of one explicit id, MUST use \
REQUEST_DELETE_CONFIRMATION with the matching noteIds and a short reason. \
Never propose DELETE_MULTIPLE_NOTES yourself.
- If a required parameter is unclear, use ANSWER_QUESTION and ask for it.";

const RESPONSE_FORMAT: &str = "\
Reply with exactly one JSON object and nothing else:
{\"action\": \"<ACTION>\", \"parameters\": {...}, \"message\": \"<reply to the user>\"}";

/// The enumerated action list with parameters and example shapes.
pub fn capability_manifest() -> String {
    let mut out = String::from("Available actions:\n");
    for kind in ActionKind::ALL {
        let (required, optional, example) = kind.parameter_docs();
        out.push_str("- ");
        out.push_str(kind.as_str());
        if !required.is_empty() {
            out.push_str(&format!(" | required: {}", required));
        }
        if !optional.is_empty() {
            out.push_str(&format!(" | optional: {}", optional));
        }
        out.push_str(&format!(" | example parameters: {}\n", example));
    }
    out
}

/// Drop leading turns until the first user turn, skip blank turns, and keep
/// at most `max_turns` of the most recent ones.
///
/// The result is empty or starts with a user turn.
pub fn sanitize_history(turns: &[ConversationTurn], max_turns: usize) -> Vec<ConversationTurn> {
    let non_blank: Vec<&ConversationTurn> = turns
        .iter()
        .filter(|t| !t.content.trim().is_empty())
        .collect();
    let recent = &non_blank[non_blank.len().saturating_sub(max_turns)..];
    recent
        .iter()
        .skip_while(|t| t.role != ChatRole::User)
        .map(|t| (*t).clone())
        .collect()
}

/// The notes fetched for a turn together with the prompt built from them.
///
/// Read-only actions run against `notes` rather than querying the store again.
#[derive(Debug, Clone)]
pub struct TurnContext {
    pub notes: Vec<Note>,
    pub prompt: ChatPrompt,
}

/// Builds model context from the store and the client's history.
#[derive(Debug, Clone)]
pub struct ContextBuilder {
    excerpt_chars: usize,
    history_max_turns: usize,
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self {
            excerpt_chars: EXCERPT_CHARS,
            history_max_turns: HISTORY_MAX_TURNS,
        }
    }
}

impl ContextBuilder {
    pub fn new(excerpt_chars: usize, history_max_turns: usize) -> Self {
        Self {
            excerpt_chars,
            history_max_turns,
        }
    }

    pub async fn build(
        &self,
        store: &dyn NoteStore,
        owner: i64,
        history: &[ConversationTurn],
        message: &str,
        now: DateTime<Utc>,
    ) -> Result<TurnContext> {
        let notes = store.list_notes(owner).await?;
        let history = sanitize_history(history, self.history_max_turns);

        debug!(
            subsystem = "assistant",
            component = "context",
            user_id = owner,
            result_count = notes.len(),
            history_len = history.len(),
            "Built turn context"
        );

        let prompt = ChatPrompt::new(message)
            .with_system(self.system_prompt(&notes, now)?)
            .with_history(history)
            .json();
        Ok(TurnContext { notes, prompt })
    }

    fn system_prompt(&self, notes: &[Note], now: DateTime<Utc>) -> Result<String> {
        let digests: Vec<NoteDigest> = notes
            .iter()
            .map(|n| NoteDigest::from_note(n, self.excerpt_chars))
            .collect();
        let notes_json = serde_json::to_string(&digests)?;

        Ok(format!(
            "You are a note-taking assistant. You help the user manage their notes by \
             choosing one action per message.\n\
             Current time (UTC): {now}\n\n\
             The user's notes ({count}), pinned first then most recently updated:\n\
             {notes_json}\n\n\
             {manifest}\n\
             {rules}\n\n\
             {format}",
            now = now.to_rfc3339(),
            count = digests.len(),
            notes_json = notes_json,
            manifest = capability_manifest(),
            rules = SAFETY_RULES,
            format = RESPONSE_FORMAT,
        ))
    }
}
