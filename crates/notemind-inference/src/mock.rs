//! Mock generation backend for deterministic testing.
//!
//! Replies are served from a script (first in, first out), falling back to a
//! default response once the script is exhausted. Failures and latency can be
//! injected, and every call is logged for assertions.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use notemind_inference::mock::MockGenerationBackend;
//!
//! let backend = MockGenerationBackend::new()
//!     .with_script([r#"{"action":"SEARCH_NOTES","parameters":{},"message":"ok"}"#]);
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use notemind_core::{ChatPrompt, Error, GenerationBackend, Result};

/// Scripted entry: a reply or an injected failure.
#[derive(Debug, Clone)]
enum Scripted {
    Reply(String),
    Fail(String),
}

#[derive(Debug, Clone)]
struct MockConfig {
    default_response: String,
    latency_ms: u64,
    model_name: String,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            default_response: "Mock response".to_string(),
            latency_ms: 0,
            model_name: "mock-model".to_string(),
        }
    }
}

/// Mock generation backend for testing.
#[derive(Clone, Default)]
pub struct MockGenerationBackend {
    config: Arc<MockConfig>,
    script: Arc<Mutex<VecDeque<Scripted>>>,
    call_log: Arc<Mutex<Vec<ChatPrompt>>>,
}

impl MockGenerationBackend {
    /// Create a new mock backend with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the reply used once the script is exhausted.
    pub fn with_fixed_response(mut self, response: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).default_response = response.into();
        self
    }

    /// Queue replies, served in order.
    pub fn with_script<I, S>(self, replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        {
            let mut script = self.script.lock().unwrap();
            script.extend(replies.into_iter().map(|r| Scripted::Reply(r.into())));
        }
        self
    }

    /// Queue an inference failure at the current end of the script.
    pub fn with_failure(self, message: impl Into<String>) -> Self {
        self.script
            .lock()
            .unwrap()
            .push_back(Scripted::Fail(message.into()));
        self
    }

    /// Set simulated latency for all calls.
    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        Arc::make_mut(&mut self.config).latency_ms = latency_ms;
        self
    }

    /// Queue another reply after construction.
    pub fn push_reply(&self, reply: impl Into<String>) {
        self.script
            .lock()
            .unwrap()
            .push_back(Scripted::Reply(reply.into()));
    }

    /// Get number of generation calls.
    pub fn call_count(&self) -> usize {
        self.call_log.lock().unwrap().len()
    }

    /// The most recent prompt sent to the backend.
    pub fn last_prompt(&self) -> Option<ChatPrompt> {
        self.call_log.lock().unwrap().last().cloned()
    }

    /// Clear the call log.
    pub fn clear_calls(&self) {
        self.call_log.lock().unwrap().clear()
    }
}

#[async_trait]
impl GenerationBackend for MockGenerationBackend {
    async fn generate_chat(&self, prompt: &ChatPrompt) -> Result<String> {
        self.call_log.lock().unwrap().push(prompt.clone());

        if self.config.latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.latency_ms)).await;
        }

        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Scripted::Reply(reply)) => Ok(reply),
            Some(Scripted::Fail(message)) => Err(Error::Inference(message)),
            None => Ok(self.config.default_response.clone()),
        }
    }

    fn model_name(&self) -> &str {
        &self.config.model_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_script_served_in_order_then_default() {
        let backend = MockGenerationBackend::new()
            .with_fixed_response("fallback")
            .with_script(["one", "two"]);
        assert_eq!(backend.generate("a").await.unwrap(), "one");
        assert_eq!(backend.generate("b").await.unwrap(), "two");
        assert_eq!(backend.generate("c").await.unwrap(), "fallback");
        assert_eq!(backend.call_count(), 3);
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let backend = MockGenerationBackend::new().with_failure("boom");
        let err = backend.generate("x").await.unwrap_err();
        assert!(matches!(err, Error::Inference(_)));
    }

    #[tokio::test]
    async fn test_call_log_records_prompt() {
        let backend = MockGenerationBackend::new();
        backend
            .generate_with_system("sys", "hello")
            .await
            .unwrap();
        let prompt = backend.last_prompt().unwrap();
        assert_eq!(prompt.system, "sys");
        assert_eq!(prompt.message, "hello");
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_is_simulated() {
        let backend = MockGenerationBackend::new().with_latency_ms(5_000);
        let start = tokio::time::Instant::now();
        backend.generate("x").await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(5_000));
    }
}
