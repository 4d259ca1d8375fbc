//! # notemind-core
//!
//! Core types, traits, and abstractions for the notemind note assistant.
//!
//! This crate provides the foundational data structures and trait definitions
//! that other notemind crates depend on.

pub mod defaults;
pub mod error;
pub mod html;
pub mod logging;
pub mod models;
pub mod search;
pub mod temporal;
pub mod traits;

// Test fixtures for downstream crates
// Note: Always compiled so integration tests (in tests/) can use the in-memory stores
pub mod test_fixtures;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use html::{excerpt, strip_html};
pub use models::*;
pub use search::NoteQuery;
pub use temporal::DateRange;
pub use traits::*;
