//! Server-side conversation state.
//!
//! Only conversations with a pending delete confirmation hold an entry; an
//! idle conversation is the absence of one. Keys carry the user id so one
//! user can never load another's pending state.
//!
//! Entries outlive the confirmation TTL by a factor of
//! [`RETENTION_FACTOR`]. Whether a pending request is still valid is
//! decided by the assistant from the request's own timestamp; the store
//! only bounds memory.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use lru::LruCache;
use tokio::sync::Mutex;
use tracing::debug;

use notemind_assistant::ConversationState;
use notemind_core::defaults::CONVERSATION_CAPACITY;

/// Conversation id used when the client does not send one.
pub const DEFAULT_CONVERSATION_ID: &str = "default";

/// Longest accepted client conversation id.
pub const CONVERSATION_ID_MAX_LEN: usize = 128;

/// Entries are kept this many confirmation TTLs after their last save.
pub const RETENTION_FACTOR: u32 = 2;

type Key = (i64, String);

struct Entry {
    state: ConversationState,
    saved_at: Instant,
}

#[derive(Clone)]
pub struct ConversationStore {
    entries: Arc<Mutex<LruCache<Key, Entry>>>,
    retention: Duration,
}

impl ConversationStore {
    /// `confirmation_ttl` is the assistant's confirmation window; entries
    /// are retained for [`RETENTION_FACTOR`] times that.
    pub fn new(capacity: usize, confirmation_ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Arc::new(Mutex::new(LruCache::new(capacity))),
            retention: confirmation_ttl.saturating_mul(RETENTION_FACTOR),
        }
    }

    pub fn with_ttl(confirmation_ttl: Duration) -> Self {
        Self::new(CONVERSATION_CAPACITY, confirmation_ttl)
    }

    /// Current state of a conversation. Entries past retention load as idle;
    /// a pending request that is merely past its TTL is still returned so
    /// the assistant can answer that it expired.
    pub async fn load(&self, user_id: i64, conversation_id: &str) -> ConversationState {
        let key = (user_id, conversation_id.to_string());
        let mut entries = self.entries.lock().await;
        let expired = match entries.get(&key) {
            Some(entry) if entry.saved_at.elapsed() < self.retention => {
                return entry.state.clone();
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.pop(&key);
            debug!(
                subsystem = "api",
                component = "conversations",
                user_id,
                conversation_id,
                "Dropped stale conversation state"
            );
        }
        ConversationState::Idle
    }

    /// Replace a conversation's state. Last write wins.
    pub async fn save(&self, user_id: i64, conversation_id: &str, state: ConversationState) {
        let key = (user_id, conversation_id.to_string());
        let mut entries = self.entries.lock().await;
        if state.is_idle() {
            entries.pop(&key);
        } else {
            entries.put(
                key,
                Entry {
                    state,
                    saved_at: Instant::now(),
                },
            );
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

/// Normalize a client-supplied conversation id.
///
/// Blank, oversized or non-printable ids fall back to
/// [`DEFAULT_CONVERSATION_ID`].
pub fn conversation_key(raw: Option<&str>) -> String {
    match raw.map(str::trim) {
        Some(id)
            if !id.is_empty()
                && id.len() <= CONVERSATION_ID_MAX_LEN
                && id.chars().all(|c| !c.is_control()) =>
        {
            id.to_string()
        }
        _ => DEFAULT_CONVERSATION_ID.to_string(),
    }
}
