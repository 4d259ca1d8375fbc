//! User repository implementation.

use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use tracing::info;

use notemind_core::{Error, GoogleProfile, Result, User};

fn row_to_user(row: &PgRow) -> User {
    User {
        id: row.get("id"),
        google_id: row.get("google_id"),
        display_name: row.get("display_name"),
        email: row.get("email"),
        created_at: row.get("created_at"),
    }
}

/// PostgreSQL repository for user accounts.
#[derive(Clone)]
pub struct PgUserRepository {
    pool: Pool<Postgres>,
}

impl PgUserRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Return the user for a Google id, inserting it on first sign-in.
    ///
    /// An existing user's display name is refreshed from the profile.
    pub async fn find_or_create_google_user(&self, profile: &GoogleProfile) -> Result<User> {
        let row = sqlx::query(
            r#"
            INSERT INTO users (google_id, display_name, email)
            VALUES ($1, $2, $3)
            ON CONFLICT (google_id)
            DO UPDATE SET display_name = EXCLUDED.display_name
            RETURNING id, google_id, display_name, email, created_at,
                      (xmax = 0) AS inserted
            "#,
        )
        .bind(&profile.google_id)
        .bind(&profile.display_name)
        .bind(&profile.email)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        let user = row_to_user(&row);
        if row.get::<bool, _>("inserted") {
            info!(
                subsystem = "database",
                component = "users",
                op = "create",
                user_id = user.id,
                "Created user on first sign-in"
            );
        }
        Ok(user)
    }

    pub async fn get(&self, user_id: i64) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT id, google_id, display_name, email, created_at FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(row.as_ref().map(row_to_user))
    }
}
