//! Shared harness: the real router on an ephemeral port, backed by the
//! in-memory stores and a scripted model.

#![allow(dead_code)]

use std::sync::Arc;

use notemind_api::{build_router, AppState, ServerConfig};
use notemind_core::test_fixtures::{InMemoryAccounts, InMemoryNoteStore};
use notemind_inference::MockGenerationBackend;

pub struct TestServer {
    pub base_url: String,
    pub client: reqwest::Client,
    pub notes: InMemoryNoteStore,
    pub accounts: InMemoryAccounts,
    pub model: MockGenerationBackend,
}

impl TestServer {
    pub async fn start(model: MockGenerationBackend) -> Self {
        Self::start_with(model, test_config()).await
    }

    pub async fn start_with(model: MockGenerationBackend, config: ServerConfig) -> Self {
        let notes = InMemoryNoteStore::new();
        let accounts = InMemoryAccounts::new();
        let state = AppState::new(
            Arc::new(notes.clone()),
            Arc::new(accounts.clone()),
            Arc::new(model.clone()),
            &config,
        );
        let router = build_router(state, &config);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap();

        Self {
            base_url: format!("http://{}", addr),
            client,
            notes,
            accounts,
            model,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Create a user with a live session, returning `(user_id, token)`.
    pub async fn sign_in(&self, google_id: &str) -> (i64, String) {
        self.accounts.signed_in(google_id).await.unwrap()
    }
}

/// Defaults with rate limiting off so tests don't interfere with each other.
pub fn test_config() -> ServerConfig {
    let mut config = ServerConfig::default();
    config.rate_limit.enabled = false;
    config
}
