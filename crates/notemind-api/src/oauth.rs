//! Google OAuth 2.0 authorization-code flow.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use lru::LruCache;
use rand::distributions::Alphanumeric;
use rand::Rng;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use notemind_core::{Error, GoogleProfile, Result};

use crate::config::GoogleOAuthConfig;

/// How long an issued `state` value may wait for its callback.
pub const STATE_TTL: Duration = Duration::from_secs(600);

/// Outstanding `state` values kept in memory.
const STATE_CAPACITY: usize = 1024;

const STATE_LEN: usize = 32;
const SCOPES: &str = "openid email profile";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    sub: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

impl From<UserInfo> for GoogleProfile {
    fn from(info: UserInfo) -> Self {
        let display_name = info
            .name
            .filter(|n| !n.trim().is_empty())
            .or_else(|| info.email.clone())
            .unwrap_or_else(|| "Google user".to_string());
        GoogleProfile {
            google_id: info.sub,
            display_name,
            email: info.email,
        }
    }
}

#[derive(Clone)]
pub struct GoogleOAuth {
    config: GoogleOAuthConfig,
    client: Client,
    states: Arc<Mutex<LruCache<String, Instant>>>,
}

impl GoogleOAuth {
    pub fn new(config: GoogleOAuthConfig) -> Self {
        let capacity = NonZeroUsize::new(STATE_CAPACITY).unwrap_or(NonZeroUsize::MIN);
        Self {
            config,
            client: Client::new(),
            states: Arc::new(Mutex::new(LruCache::new(capacity))),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    /// Consent-screen URL with a fresh `state` remembered for the callback.
    pub async fn authorize_url(&self) -> Result<String> {
        let client_id = self
            .config
            .client_id
            .as_deref()
            .ok_or_else(|| Error::Config("GOOGLE_CLIENT_ID is not set".to_string()))?;

        let state: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(STATE_LEN)
            .map(char::from)
            .collect();
        self.states.lock().await.put(state.clone(), Instant::now());

        Ok(format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}&access_type=online&prompt=select_account",
            self.config.auth_url,
            urlencoding::encode(client_id),
            urlencoding::encode(&self.config.callback_url),
            urlencoding::encode(SCOPES),
            urlencoding::encode(&state),
        ))
    }

    /// Consume a `state` value. Each value is accepted once, within
    /// [`STATE_TTL`].
    pub async fn take_state(&self, state: &str) -> bool {
        match self.states.lock().await.pop(state) {
            Some(issued) => issued.elapsed() < STATE_TTL,
            None => false,
        }
    }

    /// Exchange an authorization code for the user's Google profile.
    pub async fn exchange(&self, code: &str) -> Result<GoogleProfile> {
        let (client_id, client_secret) = match (&self.config.client_id, &self.config.client_secret)
        {
            (Some(id), Some(secret)) => (id.as_str(), secret.as_str()),
            _ => return Err(Error::Config("Google OAuth is not configured".to_string())),
        };

        let resp = self
            .client
            .post(&self.config.token_url)
            .form(&[
                ("code", code),
                ("client_id", client_id),
                ("client_secret", client_secret),
                ("redirect_uri", self.config.callback_url.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?;
        if !resp.status().is_success() {
            warn!(
                subsystem = "api",
                component = "oauth",
                status = resp.status().as_u16(),
                "Token exchange rejected"
            );
            return Err(Error::Unauthorized(
                "Google sign-in failed. Please try again.".to_string(),
            ));
        }
        let token: TokenResponse = resp.json().await?;

        let resp = self
            .client
            .get(&self.config.userinfo_url)
            .bearer_auth(&token.access_token)
            .send()
            .await?;
        if !resp.status().is_success() {
            warn!(
                subsystem = "api",
                component = "oauth",
                status = resp.status().as_u16(),
                "Userinfo request rejected"
            );
            return Err(Error::Unauthorized(
                "Google sign-in failed. Please try again.".to_string(),
            ));
        }
        let info: UserInfo = resp.json().await?;
        debug!(subsystem = "api", component = "oauth", "Fetched Google profile");

        Ok(info.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> GoogleOAuth {
        GoogleOAuth::new(GoogleOAuthConfig {
            client_id: Some("client-123".to_string()),
            client_secret: Some("secret".to_string()),
            ..GoogleOAuthConfig::default()
        })
    }

    fn state_of(url: &str) -> String {
        url.split('&')
            .find_map(|kv| kv.strip_prefix("state="))
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn test_authorize_url_carries_client_and_scope() {
        let url = configured().authorize_url().await.unwrap();
        assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
        assert!(url.contains("client_id=client-123"));
        assert!(url.contains("scope=openid%20email%20profile"));
        assert_eq!(state_of(&url).len(), STATE_LEN);
    }

    #[tokio::test]
    async fn test_state_is_single_use() {
        let oauth = configured();
        let state = state_of(&oauth.authorize_url().await.unwrap());

        assert!(oauth.take_state(&state).await);
        assert!(!oauth.take_state(&state).await);
        assert!(!oauth.take_state("forged").await);
    }

    #[tokio::test]
    async fn test_unconfigured_client_refuses() {
        let oauth = GoogleOAuth::new(GoogleOAuthConfig::default());
        assert!(!oauth.is_configured());
        assert!(matches!(
            oauth.authorize_url().await,
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_profile_name_falls_back_to_email() {
        let profile: GoogleProfile = UserInfo {
            sub: "g-1".to_string(),
            name: None,
            email: Some("a@example.com".to_string()),
        }
        .into();
        assert_eq!(profile.display_name, "a@example.com");
    }
}
