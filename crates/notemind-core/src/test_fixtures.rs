//! In-memory implementations of the storage traits.
//!
//! Used by the assistant and API test suites so they run without PostgreSQL.
//! Behaviour mirrors the PostgreSQL repositories: owner scoping, ordering,
//! implicit tag creation, tags surviving note deletion, and monotonic
//! `updated_at`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use notemind_core::test_fixtures::InMemoryNoteStore;
//! use notemind_core::{CreateNoteRequest, NoteStore};
//!
//! let store = InMemoryNoteStore::new();
//! let note = store.create_note(1, CreateNoteRequest::new("Groceries")).await?;
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use crate::error::{Error, Result};
use crate::models::*;
use crate::traits::{AccountStore, NoteStore};

// =============================================================================
// NOTES
// =============================================================================

#[derive(Default)]
struct NoteTables {
    notes: BTreeMap<i64, Note>,
    /// Tag definitions per owner. Never pruned when notes are deleted.
    tags: HashMap<i64, BTreeSet<String>>,
}

/// In-memory `NoteStore`.
#[derive(Clone, Default)]
pub struct InMemoryNoteStore {
    tables: Arc<RwLock<NoteTables>>,
    next_id: Arc<AtomicI64>,
    delete_calls: Arc<AtomicUsize>,
    failing: Arc<AtomicBool>,
}

impl InMemoryNoteStore {
    pub fn new() -> Self {
        Self {
            next_id: Arc::new(AtomicI64::new(1)),
            ..Default::default()
        }
    }

    /// Insert a note with explicit timestamps, bypassing validation.
    pub async fn seed(
        &self,
        owner: i64,
        title: &str,
        tags: &[&str],
        pinned: bool,
        updated_at: DateTime<Utc>,
    ) -> Note {
        let id = self.allocate_id();
        let note = Note {
            id,
            user_id: owner,
            title: title.to_string(),
            content: String::new(),
            tags: sorted(tags.iter().map(|t| t.to_string())),
            pinned,
            created_at: updated_at,
            updated_at,
        };
        let mut tables = self.tables.write().await;
        let owned = tables.tags.entry(owner).or_default();
        owned.extend(note.tags.iter().cloned());
        tables.notes.insert(id, note.clone());
        note
    }

    /// Number of successful single-note deletions performed so far.
    pub fn delete_count(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    /// Make every subsequent call fail with a database error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Tag definitions currently registered for an owner.
    pub async fn tag_names(&self, owner: i64) -> Vec<String> {
        let tables = self.tables.read().await;
        tables
            .tags
            .get(&owner)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn allocate_id(&self) -> i64 {
        // Start at 1 even when constructed through Default.
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        if id == 0 {
            self.next_id.fetch_add(1, Ordering::SeqCst)
        } else {
            id
        }
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

fn sorted(tags: impl IntoIterator<Item = String>) -> Vec<String> {
    tags.into_iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// A timestamp strictly after `previous`, normally "now".
fn touch(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

#[async_trait]
impl NoteStore for InMemoryNoteStore {
    async fn list_notes(&self, owner: i64) -> Result<Vec<Note>> {
        self.check()?;
        let tables = self.tables.read().await;
        let mut notes: Vec<Note> = tables
            .notes
            .values()
            .filter(|n| n.user_id == owner)
            .cloned()
            .collect();
        notes.sort_by(|a, b| {
            b.pinned
                .cmp(&a.pinned)
                .then(b.updated_at.cmp(&a.updated_at))
                .then(b.id.cmp(&a.id))
        });
        Ok(notes)
    }

    async fn get_note(&self, owner: i64, note_id: i64) -> Result<Option<Note>> {
        self.check()?;
        let tables = self.tables.read().await;
        Ok(tables
            .notes
            .get(&note_id)
            .filter(|n| n.user_id == owner)
            .cloned())
    }

    async fn create_note(&self, owner: i64, req: CreateNoteRequest) -> Result<Note> {
        self.check()?;
        let req = req.normalized()?;
        let now = Utc::now();
        let note = Note {
            id: self.allocate_id(),
            user_id: owner,
            title: req.title,
            content: req.content,
            tags: sorted(req.tags),
            pinned: false,
            created_at: now,
            updated_at: now,
        };
        let mut tables = self.tables.write().await;
        tables
            .tags
            .entry(owner)
            .or_default()
            .extend(note.tags.iter().cloned());
        tables.notes.insert(note.id, note.clone());
        Ok(note)
    }

    async fn update_note(
        &self,
        owner: i64,
        note_id: i64,
        req: UpdateNoteRequest,
    ) -> Result<Option<Note>> {
        self.check()?;
        let req = req.normalized()?;
        let mut tables = self.tables.write().await;
        let tables = &mut *tables;
        let Some(note) = tables
            .notes
            .get_mut(&note_id)
            .filter(|n| n.user_id == owner)
        else {
            return Ok(None);
        };
        if let Some(title) = req.title {
            note.title = title;
        }
        if let Some(content) = req.content {
            note.content = content;
        }
        if let Some(tags) = req.tags {
            note.tags = sorted(tags);
            tables
                .tags
                .entry(owner)
                .or_default()
                .extend(note.tags.iter().cloned());
        }
        note.updated_at = touch(note.updated_at);
        Ok(Some(note.clone()))
    }

    async fn delete_note(&self, owner: i64, note_id: i64) -> Result<Option<Note>> {
        self.check()?;
        let mut tables = self.tables.write().await;
        let owned = tables
            .notes
            .get(&note_id)
            .map(|n| n.user_id == owner)
            .unwrap_or(false);
        if !owned {
            return Ok(None);
        }
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        Ok(tables.notes.remove(&note_id))
    }

    async fn toggle_pin(&self, owner: i64, note_id: i64) -> Result<Option<Note>> {
        self.check()?;
        let mut tables = self.tables.write().await;
        let Some(note) = tables
            .notes
            .get_mut(&note_id)
            .filter(|n| n.user_id == owner)
        else {
            return Ok(None);
        };
        note.pinned = !note.pinned;
        note.updated_at = touch(note.updated_at);
        Ok(Some(note.clone()))
    }

    async fn list_tags(&self, owner: i64) -> Result<Vec<Tag>> {
        self.check()?;
        let tables = self.tables.read().await;
        let Some(names) = tables.tags.get(&owner) else {
            return Ok(Vec::new());
        };
        Ok(names
            .iter()
            .map(|name| Tag {
                name: name.clone(),
                note_count: tables
                    .notes
                    .values()
                    .filter(|n| n.user_id == owner && n.has_tag(name))
                    .count() as i64,
            })
            .collect())
    }
}

// =============================================================================
// ACCOUNTS
// =============================================================================

#[derive(Default)]
struct AccountTables {
    users: BTreeMap<i64, User>,
    sessions: HashMap<String, (i64, DateTime<Utc>)>,
}

/// In-memory `AccountStore`. Tokens are stored as issued.
#[derive(Clone, Default)]
pub struct InMemoryAccounts {
    tables: Arc<RwLock<AccountTables>>,
    next_id: Arc<AtomicI64>,
    next_token: Arc<AtomicI64>,
}

impl InMemoryAccounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a user and a session in one step, returning `(user_id, token)`.
    pub async fn signed_in(&self, google_id: &str) -> Result<(i64, String)> {
        let user = self
            .find_or_create_google_user(&GoogleProfile {
                google_id: google_id.to_string(),
                display_name: google_id.to_string(),
                email: Some(format!("{}@example.com", google_id)),
            })
            .await?;
        let session = self.create_session(user.id).await?;
        Ok((user.id, session.token))
    }

    /// Insert a session with an explicit expiry.
    pub async fn insert_session(&self, token: &str, user_id: i64, expires_at: DateTime<Utc>) {
        self.tables
            .write()
            .await
            .sessions
            .insert(token.to_string(), (user_id, expires_at));
    }
}

#[async_trait]
impl AccountStore for InMemoryAccounts {
    async fn find_or_create_google_user(&self, profile: &GoogleProfile) -> Result<User> {
        let mut tables = self.tables.write().await;
        if let Some(user) = tables
            .users
            .values()
            .find(|u| u.google_id == profile.google_id)
        {
            return Ok(user.clone());
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let user = User {
            id,
            google_id: profile.google_id.clone(),
            display_name: profile.display_name.clone(),
            email: profile.email.clone(),
            created_at: Utc::now(),
        };
        tables.users.insert(id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, user_id: i64) -> Result<Option<User>> {
        Ok(self.tables.read().await.users.get(&user_id).cloned())
    }

    async fn create_session(&self, user_id: i64) -> Result<Session> {
        let n = self.next_token.fetch_add(1, Ordering::SeqCst) + 1;
        let token = format!("nm_st_test{:040}", n);
        let expires_at = Utc::now() + Duration::seconds(crate::defaults::SESSION_TTL_SECS);
        self.insert_session(&token, user_id, expires_at).await;
        Ok(Session {
            token,
            user_id,
            expires_at,
        })
    }

    async fn resolve_session(&self, token: &str) -> Result<Option<i64>> {
        let tables = self.tables.read().await;
        Ok(tables
            .sessions
            .get(token)
            .filter(|(_, expires_at)| *expires_at > Utc::now())
            .map(|(user_id, _)| *user_id))
    }

    async fn revoke_session(&self, token: &str) -> Result<bool> {
        Ok(self.tables.write().await.sessions.remove(token).is_some())
    }
}
