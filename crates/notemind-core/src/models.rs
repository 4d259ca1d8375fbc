//! Data models for notemind.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::defaults::{TAG_MAX_LEN, TITLE_MAX_LEN};
use crate::error::{Error, Result};

// =============================================================================
// NOTES
// =============================================================================

/// A note owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    /// Rich-text (HTML) body, may be empty.
    pub content: String,
    /// Owner-scoped tag names, deduplicated, sorted by name.
    pub tags: Vec<String>,
    pub pinned: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Request to create a new note.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateNoteRequest {
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl CreateNoteRequest {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Validate and normalize the request in place.
    ///
    /// Trims the title, rejects empty or oversized titles, and normalizes tags.
    pub fn normalized(mut self) -> Result<Self> {
        self.title = validate_title(&self.title)?;
        self.tags = normalize_tags(&self.tags)?;
        Ok(self)
    }
}

/// Partial update for a note. Omitted fields retain their prior value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateNoteRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

impl UpdateNoteRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.tags.is_none()
    }

    pub fn normalized(mut self) -> Result<Self> {
        if let Some(title) = self.title.take() {
            self.title = Some(validate_title(&title)?);
        }
        if let Some(tags) = self.tags.take() {
            self.tags = Some(normalize_tags(&tags)?);
        }
        Ok(self)
    }
}

/// Trim a title and enforce the non-empty and length rules.
pub fn validate_title(title: &str) -> Result<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput("Title is required".to_string()));
    }
    if trimmed.chars().count() > TITLE_MAX_LEN {
        return Err(Error::InvalidInput(format!(
            "Title must be {} characters or less",
            TITLE_MAX_LEN
        )));
    }
    Ok(trimmed.to_string())
}

/// Normalize a tag list: trim names, drop empties, deduplicate keeping the
/// first occurrence. Tag names are case-sensitive.
pub fn normalize_tags(tags: &[String]) -> Result<Vec<String>> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let name = tag.trim();
        if name.is_empty() {
            continue;
        }
        if name.chars().count() > TAG_MAX_LEN {
            return Err(Error::InvalidInput(format!(
                "Tag '{}' must be {} characters or less",
                name, TAG_MAX_LEN
            )));
        }
        if !out.iter().any(|t| t == name) {
            out.push(name.to_string());
        }
    }
    Ok(out)
}

// =============================================================================
// TAGS
// =============================================================================

/// An owner-scoped tag with its usage count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub name: String,
    pub note_count: i64,
}

// =============================================================================
// USERS & SESSIONS
// =============================================================================

/// An account created on first Google sign-in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub google_id: String,
    pub display_name: String,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Profile returned by the identity provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoogleProfile {
    pub google_id: String,
    pub display_name: String,
    pub email: Option<String>,
}

/// A newly issued bearer session. The token is only ever returned here;
/// storage keeps its hash.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
}

// =============================================================================
// CONVERSATION
// =============================================================================

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    #[serde(alias = "model", alias = "bot", alias = "ai")]
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One turn of client-supplied conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: ChatRole,
    #[serde(alias = "text")]
    pub content: String,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}
