//! Structured logging schema and field name constants for notemind.
//!
//! All crates use these field names for consistent structured logging so
//! log aggregation can query by the same keys across every subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events (startup, shutdown), completed mutations |
//! | DEBUG | Decision points (parsed action, state transitions) |
//! | TRACE | Per-item iteration, high-volume data |
//!
//! Note content and raw model output are never logged above DEBUG; use the
//! length fields instead.

// ─── Identity fields ───────────────────────────────────────────────────────

/// Correlation ID propagated from the `x-request-id` header.
pub const REQUEST_ID: &str = "request_id";

/// Subsystem originating the log event.
/// Values: "api", "assistant", "database", "inference"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "orchestrator", "executor", "gemini", "pool", "notes"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "handle_turn", "generate", "create", "toggle_pin"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Authenticated owner id.
pub const USER_ID: &str = "user_id";

/// Note id being operated on.
pub const NOTE_ID: &str = "note_id";

/// Action kind chosen for a chat turn.
pub const ACTION: &str = "action";

/// Conversation key for pending confirmations.
pub const CONVERSATION_ID: &str = "conversation_id";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of results returned by a query.
pub const RESULT_COUNT: &str = "result_count";

/// Byte length of a prompt.
pub const PROMPT_LEN: &str = "prompt_len";

/// Byte length of a model response.
pub const RESPONSE_LEN: &str = "response_len";

/// Number of history turns forwarded to the model.
pub const HISTORY_LEN: &str = "history_len";

// ─── Inference fields ──────────────────────────────────────────────────────

/// Model name used for generation.
pub const MODEL: &str = "model";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Whether the operation succeeded.
pub const SUCCESS: &str = "success";

/// Error message (for failed operations).
pub const ERROR_MSG: &str = "error";

/// Threshold in milliseconds above which a model call is logged as slow.
pub const SLOW_MODEL_CALL_MS: u64 = 10_000;
