//! Shared application state.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::{Quota, RateLimiter};

use notemind_assistant::{Assistant, AssistantConfig, NoteDrafter};
use notemind_core::{AccountStore, GenerationBackend, NoteStore};

use crate::config::{RateLimitConfig, ServerConfig};
use crate::conversations::ConversationStore;
use crate::oauth::GoogleOAuth;

/// Global rate limiter type (not keyed, in-memory, default clock).
pub type GlobalRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

#[derive(Clone)]
pub struct AppState {
    pub notes: Arc<dyn NoteStore>,
    pub accounts: Arc<dyn AccountStore>,
    pub assistant: Arc<Assistant>,
    pub drafter: Arc<NoteDrafter>,
    pub conversations: ConversationStore,
    pub oauth: GoogleOAuth,
    /// Empty means sign-in answers with JSON instead of redirecting.
    pub frontend_url: String,
    /// Global rate limiter (None if rate limiting is disabled).
    pub rate_limiter: Option<Arc<GlobalRateLimiter>>,
}

impl AppState {
    pub fn new(
        notes: Arc<dyn NoteStore>,
        accounts: Arc<dyn AccountStore>,
        model: Arc<dyn GenerationBackend>,
        config: &ServerConfig,
    ) -> Self {
        let assistant_config = AssistantConfig {
            model_timeout: config.chat_model_timeout,
            confirmation_ttl: config.confirmation_ttl,
            ..AssistantConfig::default()
        };

        Self {
            assistant: Arc::new(Assistant::with_config(
                notes.clone(),
                model.clone(),
                assistant_config,
            )),
            drafter: Arc::new(NoteDrafter::new(model).with_timeout(config.chat_model_timeout)),
            conversations: ConversationStore::with_ttl(config.confirmation_ttl),
            oauth: GoogleOAuth::new(config.google.clone()),
            frontend_url: config.frontend_url.clone(),
            rate_limiter: build_rate_limiter(&config.rate_limit),
            notes,
            accounts,
        }
    }
}

fn build_rate_limiter(config: &RateLimitConfig) -> Option<Arc<GlobalRateLimiter>> {
    if !config.enabled {
        return None;
    }
    let burst = NonZeroU32::new(config.requests)?;
    let period = Duration::from_secs(config.period_secs.max(1)) / burst.get();
    let quota = Quota::with_period(period)?.allow_burst(burst);
    Some(Arc::new(RateLimiter::direct(quota)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limiter_disabled() {
        let config = RateLimitConfig {
            enabled: false,
            ..RateLimitConfig::default()
        };
        assert!(build_rate_limiter(&config).is_none());
    }

    #[test]
    fn test_rate_limiter_allows_burst_then_refuses() {
        let limiter = build_rate_limiter(&RateLimitConfig {
            enabled: true,
            requests: 2,
            period_secs: 3600,
        })
        .unwrap();
        assert!(limiter.check().is_ok());
        assert!(limiter.check().is_ok());
        assert!(limiter.check().is_err());
    }
}
