//! Core traits for notemind abstractions.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// NOTE STORE
// =============================================================================

/// Owner-scoped note persistence.
///
/// Every operation is filtered by `owner`. A note that does not exist and a
/// note owned by someone else are indistinguishable: both yield `None`.
/// Errors are reserved for infrastructure failures and invalid input.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// List the owner's notes, pinned first, then most recently updated first.
    async fn list_notes(&self, owner: i64) -> Result<Vec<Note>>;

    /// Fetch a single note.
    async fn get_note(&self, owner: i64, note_id: i64) -> Result<Option<Note>>;

    /// Create a note. Unknown tag names are created for the owner.
    ///
    /// Fails with `InvalidInput` if the title is empty after trimming.
    async fn create_note(&self, owner: i64, req: CreateNoteRequest) -> Result<Note>;

    /// Apply a partial update. Refreshes `updated_at`.
    async fn update_note(
        &self,
        owner: i64,
        note_id: i64,
        req: UpdateNoteRequest,
    ) -> Result<Option<Note>>;

    /// Delete a note, returning its prior state. Tag definitions survive.
    async fn delete_note(&self, owner: i64, note_id: i64) -> Result<Option<Note>>;

    /// Create several notes. Implementations backed by a transactional store
    /// create all of them or none.
    async fn create_notes(&self, owner: i64, reqs: Vec<CreateNoteRequest>) -> Result<Vec<Note>> {
        let mut created = Vec::with_capacity(reqs.len());
        for req in reqs {
            created.push(self.create_note(owner, req).await?);
        }
        Ok(created)
    }

    /// Delete several notes, returning the ones that existed. Ids that are
    /// missing or owned by someone else are skipped.
    async fn delete_notes(&self, owner: i64, note_ids: &[i64]) -> Result<Vec<Note>> {
        let mut deleted = Vec::with_capacity(note_ids.len());
        for &id in note_ids {
            if let Some(note) = self.delete_note(owner, id).await? {
                deleted.push(note);
            }
        }
        Ok(deleted)
    }

    /// Flip the pinned flag. Refreshes `updated_at`.
    async fn toggle_pin(&self, owner: i64, note_id: i64) -> Result<Option<Note>>;

    /// List the owner's tags with note counts, ordered by name.
    async fn list_tags(&self, owner: i64) -> Result<Vec<Tag>>;
}

// =============================================================================
// ACCOUNTS
// =============================================================================

/// User accounts and bearer sessions.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Return the user linked to the Google id, creating it on first sign-in.
    async fn find_or_create_google_user(&self, profile: &GoogleProfile) -> Result<User>;

    async fn get_user(&self, user_id: i64) -> Result<Option<User>>;

    /// Issue a new session token for the user.
    async fn create_session(&self, user_id: i64) -> Result<Session>;

    /// Resolve a bearer token to its user id if unexpired and unrevoked.
    async fn resolve_session(&self, token: &str) -> Result<Option<i64>>;

    /// Revoke a session. Returns false if the token was unknown.
    async fn revoke_session(&self, token: &str) -> Result<bool>;
}

// =============================================================================
// GENERATION
// =============================================================================

/// A fully assembled request for one model call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatPrompt {
    /// System instruction (capabilities, rules, note context).
    pub system: String,
    /// Prior turns. The first turn, if any, has the user role.
    pub history: Vec<ConversationTurn>,
    /// The new user message.
    pub message: String,
    /// Ask the provider for a JSON reply.
    pub json_output: bool,
}

impl ChatPrompt {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = system.into();
        self
    }

    pub fn with_history(mut self, history: Vec<ConversationTurn>) -> Self {
        self.history = history;
        self
    }

    pub fn json(mut self) -> Self {
        self.json_output = true;
        self
    }

    /// Approximate prompt size in bytes, for logging.
    pub fn len(&self) -> usize {
        self.system.len()
            + self.message.len()
            + self.history.iter().map(|t| t.content.len()).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Backend for text generation.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Generate a reply for an assembled multi-turn prompt.
    async fn generate_chat(&self, prompt: &ChatPrompt) -> Result<String>;

    /// Generate text from a single prompt.
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.generate_with_system("", prompt).await
    }

    /// Generate text with a system instruction.
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String> {
        self.generate_chat(&ChatPrompt::new(prompt).with_system(system))
            .await
    }

    /// Get the model name.
    fn model_name(&self) -> &str;
}
