//! Confirmation state for destructive batch operations.
//!
//! A conversation is either idle or holding one pending batch deletion. The
//! next user turn resolves it: an affirmative reply executes the pending
//! batch, a negative reply discards it, and anything else discards it and is
//! handled as a fresh request.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A batch deletion waiting for the user's answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingConfirmation {
    note_ids: Vec<i64>,
    reason: String,
    created_at: DateTime<Utc>,
}

impl PendingConfirmation {
    pub fn new(note_ids: Vec<i64>, reason: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            note_ids,
            reason: reason.into(),
            created_at,
        }
    }

    pub fn note_ids(&self) -> &[i64] {
        &self.note_ids
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn is_expired(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        now - self.created_at > ttl
    }

    /// Consume the pending request after an affirmative reply.
    pub fn confirm(self) -> ConfirmedDelete {
        ConfirmedDelete {
            note_ids: self.note_ids,
        }
    }
}

/// Authorization to delete a batch. Only obtainable through
/// [`PendingConfirmation::confirm`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmedDelete {
    note_ids: Vec<i64>,
}

impl ConfirmedDelete {
    pub fn note_ids(&self) -> &[i64] {
        &self.note_ids
    }
}

/// Per-conversation state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ConversationState {
    #[default]
    Idle,
    AwaitingConfirmation(PendingConfirmation),
}

impl ConversationState {
    pub fn awaiting(pending: PendingConfirmation) -> Self {
        ConversationState::AwaitingConfirmation(pending)
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, ConversationState::Idle)
    }

    pub fn pending(&self) -> Option<&PendingConfirmation> {
        match self {
            ConversationState::AwaitingConfirmation(p) => Some(p),
            ConversationState::Idle => None,
        }
    }
}

/// How a user turn answers a pending confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    Affirmative,
    Negative,
    Unrelated,
}

const AFFIRMATIVE: &[&str] = &[
    "yes",
    "yep",
    "yeah",
    "confirm",
    "confirmed",
    "go ahead",
    "delete them",
    "do it",
    "proceed",
];

const NEGATIVE: &[&str] = &[
    "no",
    "nope",
    "cancel",
    "stop",
    "don't",
    "do not",
    "never mind",
    "nevermind",
    "keep them",
    "abort",
];

/// Classify a reply by whole-word keyword match. Negative wins when both
/// vocabularies match ("no, don't do it").
pub fn classify_reply(text: &str) -> Reply {
    let normalized = normalize(text);
    let has = |phrases: &[&str]| {
        phrases
            .iter()
            .any(|p| normalized.contains(&format!(" {} ", p)))
    };

    if has(NEGATIVE) {
        Reply::Negative
    } else if has(AFFIRMATIVE) {
        Reply::Affirmative
    } else {
        Reply::Unrelated
    }
}

/// Lowercase, keep letters, digits, and apostrophes, collapse everything else
/// to single spaces, and pad both ends so phrases match on word boundaries.
fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push(' ');
    let mut last_space = true;
    for c in text.chars().flat_map(char::to_lowercase) {
        let c = if c == '\u{2019}' { '\'' } else { c };
        if c.is_alphanumeric() || c == '\'' {
            out.push(c);
            last_space = false;
        } else if !last_space {
            out.push(' ');
            last_space = true;
        }
    }
    if !last_space {
        out.push(' ');
    }
    out
}
