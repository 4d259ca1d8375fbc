//! Bearer session repository.
//!
//! Tokens have the form `nm_st_<48 alphanumerics>`. Only the SHA-256 hex digest
//! is persisted, so a database dump cannot be replayed as credentials.

use chrono::{Duration, Utc};
use rand::Rng;
use sha2::{Digest, Sha256};
use sqlx::{Pool, Postgres};
use tracing::{debug, info};

use notemind_core::{Error, Result, Session};

/// Prefix identifying notemind session tokens.
pub const SESSION_TOKEN_PREFIX: &str = "nm_st_";

const TOKEN_SECRET_LEN: usize = 48;

/// Generate a random alphanumeric secret.
fn generate_secret(length: usize) -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}

/// Hash a token using SHA-256.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// PostgreSQL repository for bearer sessions.
#[derive(Clone)]
pub struct PgSessionRepository {
    pool: Pool<Postgres>,
    ttl: Duration,
}

impl PgSessionRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            pool,
            ttl: Duration::seconds(notemind_core::defaults::SESSION_TTL_SECS),
        }
    }

    /// Override the session lifetime.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Issue a new session for a user.
    pub async fn create(&self, user_id: i64) -> Result<Session> {
        let token = format!("{}{}", SESSION_TOKEN_PREFIX, generate_secret(TOKEN_SECRET_LEN));
        let expires_at = Utc::now() + self.ttl;

        sqlx::query("INSERT INTO sessions (user_id, token_hash, expires_at) VALUES ($1, $2, $3)")
            .bind(user_id)
            .bind(hash_token(&token))
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        info!(
            subsystem = "database",
            component = "sessions",
            op = "create",
            user_id,
            "Issued session"
        );
        Ok(Session {
            token,
            user_id,
            expires_at,
        })
    }

    /// Resolve a token to its user id if it is unexpired and unrevoked.
    pub async fn resolve(&self, token: &str) -> Result<Option<i64>> {
        if !token.starts_with(SESSION_TOKEN_PREFIX) {
            return Ok(None);
        }

        let user_id: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE sessions SET last_used_at = NOW()
            WHERE token_hash = $1 AND revoked = false AND expires_at > NOW()
            RETURNING user_id
            "#,
        )
        .bind(hash_token(token))
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        debug!(
            subsystem = "database",
            component = "sessions",
            op = "resolve",
            success = user_id.is_some(),
            "Resolved session"
        );
        Ok(user_id)
    }

    /// Revoke a session. Returns false if no active session matched.
    pub async fn revoke(&self, token: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE sessions SET revoked = true WHERE token_hash = $1 AND revoked = false",
        )
        .bind(hash_token(token))
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete expired and revoked sessions. Returns the number removed.
    pub async fn purge_expired(&self) -> Result<u64> {
        let result =
            sqlx::query("DELETE FROM sessions WHERE revoked = true OR expires_at <= NOW()")
                .execute(&self.pool)
                .await
                .map_err(Error::Database)?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_token_is_stable_hex() {
        let hash = hash_token("nm_st_abc");
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, hash_token("nm_st_abc"));
        assert_ne!(hash, hash_token("nm_st_abd"));
    }

    #[test]
    fn test_generate_secret_charset_and_length() {
        let secret = generate_secret(TOKEN_SECRET_LEN);
        assert_eq!(secret.len(), TOKEN_SECRET_LEN);
        assert!(secret.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
