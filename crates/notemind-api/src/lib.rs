//! # notemind-api
//!
//! HTTP server for notemind: Google sign-in with bearer sessions, the notes
//! REST API, and the assistant chat endpoint.

pub mod auth;
pub mod config;
pub mod conversations;
pub mod error;
pub mod handlers;
pub mod oauth;
pub mod router;
pub mod state;

pub use config::ServerConfig;
pub use conversations::ConversationStore;
pub use error::ApiError;
pub use router::build_router;
pub use state::AppState;
