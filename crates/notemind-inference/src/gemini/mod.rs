//! Google Gemini inference backend.
//!
//! Talks to the Generative Language REST API:
//! `POST {base_url}/models/{model}:generateContent`.
//!
//! # Example
//!
//! ```rust,no_run
//! use notemind_core::{ChatPrompt, GenerationBackend};
//! use notemind_inference::gemini::{GeminiBackend, GeminiConfig};
//!
//! #[tokio::main]
//! async fn main() -> notemind_core::Result<()> {
//!     let backend = GeminiBackend::new(GeminiConfig {
//!         api_key: Some("AIza...".to_string()),
//!         ..Default::default()
//!     })?;
//!
//!     let prompt = ChatPrompt::new("List my pinned notes").with_system("You manage notes.");
//!     let reply = backend.generate_chat(&prompt).await?;
//!     println!("{}", reply);
//!     Ok(())
//! }
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | GEMINI_API_KEY | (none) | API key |
//! | GEMINI_MODEL | gemini-2.0-flash | Generation model |
//! | GEMINI_BASE_URL | https://generativelanguage.googleapis.com/v1beta | API endpoint |
//! | GEMINI_TIMEOUT | 60 | HTTP timeout (seconds) |

mod backend;
pub mod error;
pub mod types;

pub use backend::*;
pub use error::GeminiErrorCode;
