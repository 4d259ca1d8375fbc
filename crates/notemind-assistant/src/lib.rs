//! # notemind-assistant
//!
//! Conversational-action interpreter for notemind.
//!
//! A chat turn flows through these stages:
//!
//! 1. [`context`] fetches the owner's notes and builds the model prompt.
//! 2. The model replies; [`envelope`] unwraps code fences or plain text.
//! 3. [`action`] validates the proposal into a typed [`Action`].
//! 4. [`confirmation`] gates batch deletions behind an explicit "yes".
//! 5. [`executor`] applies the action to the note store.
//!
//! [`Assistant`] in [`orchestrator`] ties these together. The legacy
//! single-shot note generator lives in [`draft`].

pub mod action;
pub mod confirmation;
pub mod context;
pub mod draft;
pub mod envelope;
pub mod executor;
pub mod orchestrator;
pub mod query;
pub mod response;

pub use action::{validate, Action, ActionKind, ActionProposal, SummaryKind, Validated};
pub use confirmation::{classify_reply, ConversationState, PendingConfirmation, Reply};
pub use context::{sanitize_history, ContextBuilder};
pub use draft::{NoteDraftText, NoteDrafter};
pub use envelope::{parse_envelope, Envelope};
pub use orchestrator::{Assistant, AssistantConfig, TurnInput};
pub use response::ChatResponse;
