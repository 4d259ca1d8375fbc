//! HTTP handlers for notemind-api.

pub mod chat;
pub mod notes;
pub mod session;
