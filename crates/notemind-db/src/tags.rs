//! Tag repository implementation.
//!
//! Tags are owner-scoped and unique by `(user_id, name)`. Note links are
//! replaced wholesale inside the caller's transaction so a concurrent reader
//! never sees a note linked to a partially inserted tag set.

use sqlx::{Pool, Postgres, Row, Transaction};
use tracing::debug;

use notemind_core::{Error, Result, Tag};

/// PostgreSQL repository for owner-scoped tags.
#[derive(Clone)]
pub struct PgTagRepository {
    pool: Pool<Postgres>,
}

impl PgTagRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List an owner's tags with the number of notes using each, by name.
    ///
    /// Tags whose notes were all deleted are still listed with a zero count.
    pub async fn list_for_owner(&self, owner: i64) -> Result<Vec<Tag>> {
        let rows = sqlx::query(
            r#"
            SELECT t.name::text AS name, COUNT(nt.note_id) AS note_count
            FROM tags t
            LEFT JOIN note_tags nt ON nt.tag_id = t.id
            WHERE t.user_id = $1
            GROUP BY t.id, t.name
            ORDER BY t.name
            "#,
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|row| Tag {
                name: row.get("name"),
                note_count: row.get("note_count"),
            })
            .collect())
    }
}

/// Replace a note's tag links with `tags`, creating unknown tags for the owner.
///
/// Must run inside the same transaction that created or updated the note.
pub(crate) async fn sync_note_tags(
    tx: &mut Transaction<'_, Postgres>,
    owner: i64,
    note_id: i64,
    tags: &[String],
) -> Result<()> {
    if !tags.is_empty() {
        sqlx::query(
            "INSERT INTO tags (user_id, name)
             SELECT $1, unnest($2::text[])
             ON CONFLICT (user_id, name) DO NOTHING",
        )
        .bind(owner)
        .bind(tags)
        .execute(&mut **tx)
        .await
        .map_err(Error::Database)?;
    }

    sqlx::query("DELETE FROM note_tags WHERE note_id = $1")
        .bind(note_id)
        .execute(&mut **tx)
        .await
        .map_err(Error::Database)?;

    if !tags.is_empty() {
        sqlx::query(
            "INSERT INTO note_tags (note_id, tag_id)
             SELECT $1, id FROM tags WHERE user_id = $2 AND name = ANY($3::text[])
             ON CONFLICT DO NOTHING",
        )
        .bind(note_id)
        .bind(owner)
        .bind(tags)
        .execute(&mut **tx)
        .await
        .map_err(Error::Database)?;
    }

    debug!(
        subsystem = "database",
        component = "tags",
        op = "sync",
        note_id,
        tag_count = tags.len(),
        "Synced note tags"
    );
    Ok(())
}
