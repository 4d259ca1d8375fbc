//! Centralized default constants for notemind.
//!
//! All crates reference these constants instead of defining their own magic
//! numbers. Organized by domain area.

// =============================================================================
// NOTES
// =============================================================================

/// Title used when a create request arrives without one.
pub const UNTITLED_NOTE: &str = "Untitled Note";

/// Maximum note title length (matches the `VARCHAR(255)` column).
pub const TITLE_MAX_LEN: usize = 255;

/// Maximum tag name length.
pub const TAG_MAX_LEN: usize = 50;

// =============================================================================
// ASSISTANT CONTEXT
// =============================================================================

/// Character budget for each note's plain-text excerpt in the model context.
pub const EXCERPT_CHARS: usize = 500;

/// Maximum number of history turns forwarded to the model.
pub const HISTORY_MAX_TURNS: usize = 40;

// =============================================================================
// QUERY RESULTS
// =============================================================================

/// Number of titles listed in a search reply before the overflow count.
pub const SEARCH_PREVIEW_LIMIT: usize = 5;

/// Number of notes in a "recent" summary when no count is requested.
pub const RECENT_SUMMARY_COUNT: usize = 5;

// =============================================================================
// TIMEOUTS
// =============================================================================

/// Upper bound on the model call for one chat turn.
pub const MODEL_CALL_TIMEOUT_SECS: u64 = 30;

/// How long a pending delete confirmation stays valid.
pub const CONFIRMATION_TTL_SECS: u64 = 600;

/// Session token lifetime.
pub const SESSION_TTL_SECS: i64 = 3600;

// =============================================================================
// SERVER
// =============================================================================

/// Default listen port.
pub const SERVER_PORT: u16 = 4000;

/// Maximum number of conversations with a pending confirmation held in memory.
pub const CONVERSATION_CAPACITY: usize = 10_000;

/// Maximum request body size for JSON endpoints (1 MiB).
pub const BODY_LIMIT_BYTES: usize = 1024 * 1024;
