//! # notemind-db
//!
//! PostgreSQL database layer for notemind.
//!
//! This crate provides:
//! - Connection pool management
//! - Owner-scoped note repository with transactional tag sync
//! - User and bearer-session repositories
//! - Embedded schema migrations (feature `migrations`)
//!
//! ## Example
//!
//! ```rust,ignore
//! use notemind_db::Database;
//! use notemind_core::{CreateNoteRequest, NoteStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/notemind").await?;
//!     let note = db
//!         .notes
//!         .create_note(1, CreateNoteRequest::new("Groceries").with_tags(["shopping"]))
//!         .await?;
//!     println!("Created note {}", note.id);
//!     Ok(())
//! }
//! ```

pub mod notes;
pub mod pool;
pub mod sessions;
pub mod tags;
pub mod users;

// Note: Always compiled so integration tests (in tests/) can use DEFAULT_TEST_DATABASE_URL
pub mod test_fixtures;

pub use notes::PgNoteRepository;
pub use pool::{create_pool, create_pool_with_config, PoolConfig};
pub use sessions::{hash_token, PgSessionRepository, SESSION_TOKEN_PREFIX};
pub use tags::PgTagRepository;
pub use users::PgUserRepository;

use async_trait::async_trait;
use notemind_core::{AccountStore, GoogleProfile, Result, Session, User};

/// Database handle bundling the pool and all repositories.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Owner-scoped notes (implements `NoteStore`).
    pub notes: PgNoteRepository,
    /// Owner-scoped tags.
    pub tags: PgTagRepository,
    /// User accounts.
    pub users: PgUserRepository,
    /// Bearer sessions.
    pub sessions: PgSessionRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            notes: PgNoteRepository::new(pool.clone()),
            tags: PgTagRepository::new(pool.clone()),
            users: PgUserRepository::new(pool.clone()),
            sessions: PgSessionRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Connect with a custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Override the lifetime of newly issued sessions.
    pub fn with_session_ttl(mut self, ttl: chrono::Duration) -> Self {
        self.sessions = self.sessions.with_ttl(ttl);
        self
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| notemind_core::Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}

#[async_trait]
impl AccountStore for Database {
    async fn find_or_create_google_user(&self, profile: &GoogleProfile) -> Result<User> {
        self.users.find_or_create_google_user(profile).await
    }

    async fn get_user(&self, user_id: i64) -> Result<Option<User>> {
        self.users.get(user_id).await
    }

    async fn create_session(&self, user_id: i64) -> Result<Session> {
        self.sessions.create(user_id).await
    }

    async fn resolve_session(&self, token: &str) -> Result<Option<i64>> {
        self.sessions.resolve(token).await
    }

    async fn revoke_session(&self, token: &str) -> Result<bool> {
        self.sessions.revoke(token).await
    }
}
