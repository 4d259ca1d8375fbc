//! Server configuration from the environment.
//!
//! | Variable | Default |
//! |---|---|
//! | `DATABASE_URL` | `postgres://localhost/notemind` |
//! | `HOST` / `PORT` | `0.0.0.0` / `4000` |
//! | `ALLOWED_ORIGINS` | `http://localhost:5173` |
//! | `FRONTEND_URL` | `http://localhost:5173` |
//! | `GOOGLE_CLIENT_ID` / `GOOGLE_CLIENT_SECRET` / `GOOGLE_CALLBACK_URL` | none |
//! | `CHAT_MODEL_TIMEOUT_SECS` | `30` |
//! | `SESSION_TTL_SECS` | `3600` |
//! | `CONFIRMATION_TTL_SECS` | `600` |
//! | `RATE_LIMIT_ENABLED` / `RATE_LIMIT_REQUESTS` / `RATE_LIMIT_PERIOD_SECS` | `true` / `100` / `60` |
//!
//! Unparseable numbers fall back to their defaults.

use std::time::Duration;

use notemind_core::defaults::{
    BODY_LIMIT_BYTES, CONFIRMATION_TTL_SECS, MODEL_CALL_TIMEOUT_SECS, SERVER_PORT,
    SESSION_TTL_SECS,
};

pub const DEFAULT_DATABASE_URL: &str = "postgres://localhost/notemind";
pub const DEFAULT_FRONTEND_URL: &str = "http://localhost:5173";

pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v3/userinfo";

/// Google OAuth client settings. Endpoint URLs are overridable for testing.
#[derive(Debug, Clone)]
pub struct GoogleOAuthConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub callback_url: String,
    pub auth_url: String,
    pub token_url: String,
    pub userinfo_url: String,
}

impl Default for GoogleOAuthConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            callback_url: format!("http://localhost:{}/auth/google/callback", SERVER_PORT),
            auth_url: GOOGLE_AUTH_URL.to_string(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
            userinfo_url: GOOGLE_USERINFO_URL.to_string(),
        }
    }
}

impl GoogleOAuthConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            client_id: non_empty_var("GOOGLE_CLIENT_ID"),
            client_secret: non_empty_var("GOOGLE_CLIENT_SECRET"),
            callback_url: non_empty_var("GOOGLE_CALLBACK_URL").unwrap_or(defaults.callback_url),
            auth_url: non_empty_var("GOOGLE_AUTH_URL").unwrap_or(defaults.auth_url),
            token_url: non_empty_var("GOOGLE_TOKEN_URL").unwrap_or(defaults.token_url),
            userinfo_url: non_empty_var("GOOGLE_USERINFO_URL").unwrap_or(defaults.userinfo_url),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.client_id.is_some() && self.client_secret.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub requests: u32,
    pub period_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requests: 100,
            period_secs: 60,
        }
    }
}

/// Everything the server reads at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    /// Where to send the browser after sign-in. Empty means answer with JSON.
    pub frontend_url: String,
    pub google: GoogleOAuthConfig,
    pub chat_model_timeout: Duration,
    pub session_ttl: chrono::Duration,
    pub confirmation_ttl: Duration,
    pub rate_limit: RateLimitConfig,
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            host: "0.0.0.0".to_string(),
            port: SERVER_PORT,
            allowed_origins: vec![DEFAULT_FRONTEND_URL.to_string()],
            frontend_url: DEFAULT_FRONTEND_URL.to_string(),
            google: GoogleOAuthConfig::default(),
            chat_model_timeout: Duration::from_secs(MODEL_CALL_TIMEOUT_SECS),
            session_ttl: chrono::Duration::seconds(SESSION_TTL_SECS),
            confirmation_ttl: Duration::from_secs(CONFIRMATION_TTL_SECS),
            rate_limit: RateLimitConfig::default(),
            body_limit_bytes: BODY_LIMIT_BYTES,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let rate_defaults = RateLimitConfig::default();
        Self {
            database_url: non_empty_var("DATABASE_URL").unwrap_or(defaults.database_url),
            host: non_empty_var("HOST").unwrap_or(defaults.host),
            port: parsed_var("PORT").unwrap_or(defaults.port),
            allowed_origins: non_empty_var("ALLOWED_ORIGINS")
                .map(|s| split_list(&s))
                .unwrap_or(defaults.allowed_origins),
            // Present but empty is meaningful here: JSON sign-in responses.
            frontend_url: std::env::var("FRONTEND_URL")
                .map(|s| s.trim().trim_end_matches('/').to_string())
                .unwrap_or(defaults.frontend_url),
            google: GoogleOAuthConfig::from_env(),
            chat_model_timeout: parsed_var("CHAT_MODEL_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.chat_model_timeout),
            session_ttl: parsed_var("SESSION_TTL_SECS")
                .filter(|s: &i64| *s > 0)
                .map(chrono::Duration::seconds)
                .unwrap_or(defaults.session_ttl),
            confirmation_ttl: parsed_var("CONFIRMATION_TTL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.confirmation_ttl),
            rate_limit: RateLimitConfig {
                enabled: std::env::var("RATE_LIMIT_ENABLED")
                    .map(|v| v == "true" || v == "1")
                    .unwrap_or(rate_defaults.enabled),
                requests: parsed_var("RATE_LIMIT_REQUESTS").unwrap_or(rate_defaults.requests),
                period_secs: parsed_var("RATE_LIMIT_PERIOD_SECS")
                    .unwrap_or(rate_defaults.period_secs),
            },
            body_limit_bytes: defaults.body_limit_bytes,
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parsed_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    non_empty_var(name).and_then(|v| v.parse().ok())
}

fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
