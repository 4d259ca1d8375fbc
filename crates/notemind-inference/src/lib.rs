//! # notemind-inference
//!
//! Language-model backends for notemind.
//!
//! - [`gemini`]: Google Generative Language API (`generateContent`)
//! - [`mock`]: deterministic scripted backend for tests (feature `mock`)

pub mod gemini;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use gemini::{GeminiBackend, GeminiConfig};

#[cfg(any(test, feature = "mock"))]
pub use mock::MockGenerationBackend;
