//! Note repository implementation.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row, Transaction};
use tracing::{debug, info};

use notemind_core::{
    CreateNoteRequest, Error, Note, NoteStore, Result, Tag, UpdateNoteRequest,
};

use crate::tags::{sync_note_tags, PgTagRepository};

/// Note columns plus the aggregated, name-ordered tag list.
const NOTE_SELECT: &str = r#"
    SELECT n.id, n.user_id, n.title::text AS title, n.content, n.pinned,
           n.created_at, n.updated_at,
           COALESCE(
               array_agg(t.name::text ORDER BY t.name) FILTER (WHERE t.name IS NOT NULL),
               '{}'::text[]
           ) AS tags
    FROM notes n
    LEFT JOIN note_tags nt ON nt.note_id = n.id
    LEFT JOIN tags t ON t.id = nt.tag_id
"#;

/// Keeps `updated_at` strictly increasing even when two mutations share a
/// transaction timestamp.
const TOUCH_UPDATED_AT: &str = "GREATEST(NOW(), updated_at + INTERVAL '1 microsecond')";

fn row_to_note(row: &PgRow) -> Note {
    Note {
        id: row.get("id"),
        user_id: row.get("user_id"),
        title: row.get("title"),
        content: row.get("content"),
        tags: row.get("tags"),
        pinned: row.get("pinned"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// PostgreSQL implementation of `NoteStore`.
#[derive(Clone)]
pub struct PgNoteRepository {
    pool: Pool<Postgres>,
    tags: PgTagRepository,
}

impl PgNoteRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            tags: PgTagRepository::new(pool.clone()),
            pool,
        }
    }

    async fn fetch_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        owner: i64,
        note_id: i64,
    ) -> Result<Option<Note>> {
        let sql = format!(
            "{} WHERE n.user_id = $1 AND n.id = $2 GROUP BY n.id",
            NOTE_SELECT
        );
        let row = sqlx::query(&sql)
            .bind(owner)
            .bind(note_id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(Error::Database)?;
        Ok(row.as_ref().map(row_to_note))
    }
    async fn insert_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        owner: i64,
        req: &CreateNoteRequest,
    ) -> Result<Note> {
        let note_id: i64 = sqlx::query_scalar(
            "INSERT INTO notes (user_id, title, content) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(owner)
        .bind(&req.title)
        .bind(&req.content)
        .fetch_one(&mut **tx)
        .await
        .map_err(Error::Database)?;

        sync_note_tags(tx, owner, note_id, &req.tags).await?;

        Self::fetch_in_tx(tx, owner, note_id)
            .await?
            .ok_or_else(|| Error::Internal(format!("Note {} vanished after insert", note_id)))
    }
}

#[async_trait]
impl NoteStore for PgNoteRepository {
    async fn list_notes(&self, owner: i64) -> Result<Vec<Note>> {
        let sql = format!(
            "{} WHERE n.user_id = $1 GROUP BY n.id
             ORDER BY n.pinned DESC, n.updated_at DESC, n.id DESC",
            NOTE_SELECT
        );
        let rows = sqlx::query(&sql)
            .bind(owner)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        debug!(
            subsystem = "database",
            component = "notes",
            op = "list",
            user_id = owner,
            result_count = rows.len(),
            "Listed notes"
        );
        Ok(rows.iter().map(row_to_note).collect())
    }

    async fn get_note(&self, owner: i64, note_id: i64) -> Result<Option<Note>> {
        let sql = format!(
            "{} WHERE n.user_id = $1 AND n.id = $2 GROUP BY n.id",
            NOTE_SELECT
        );
        let row = sqlx::query(&sql)
            .bind(owner)
            .bind(note_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(row.as_ref().map(row_to_note))
    }

    async fn create_note(&self, owner: i64, req: CreateNoteRequest) -> Result<Note> {
        let req = req.normalized()?;

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let note = Self::insert_in_tx(&mut tx, owner, &req).await?;
        tx.commit().await.map_err(Error::Database)?;

        info!(
            subsystem = "database",
            component = "notes",
            op = "create",
            user_id = owner,
            note_id = note.id,
            tag_count = note.tags.len(),
            "Created note"
        );
        Ok(note)
    }

    async fn create_notes(&self, owner: i64, reqs: Vec<CreateNoteRequest>) -> Result<Vec<Note>> {
        let reqs = reqs
            .into_iter()
            .map(CreateNoteRequest::normalized)
            .collect::<Result<Vec<_>>>()?;

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let mut created = Vec::with_capacity(reqs.len());
        for req in &reqs {
            created.push(Self::insert_in_tx(&mut tx, owner, req).await?);
        }
        tx.commit().await.map_err(Error::Database)?;

        info!(
            subsystem = "database",
            component = "notes",
            op = "create_batch",
            user_id = owner,
            result_count = created.len(),
            "Created notes"
        );
        Ok(created)
    }

    async fn update_note(
        &self,
        owner: i64,
        note_id: i64,
        req: UpdateNoteRequest,
    ) -> Result<Option<Note>> {
        let req = req.normalized()?;

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let sql = format!(
            "UPDATE notes
             SET title = COALESCE($3, title),
                 content = COALESCE($4, content),
                 updated_at = {}
             WHERE user_id = $1 AND id = $2
             RETURNING id",
            TOUCH_UPDATED_AT
        );
        let updated: Option<i64> = sqlx::query_scalar(&sql)
            .bind(owner)
            .bind(note_id)
            .bind(req.title.as_deref())
            .bind(req.content.as_deref())
            .fetch_optional(&mut *tx)
            .await
            .map_err(Error::Database)?;

        if updated.is_none() {
            return Ok(None);
        }

        if let Some(tags) = req.tags.as_deref() {
            sync_note_tags(&mut tx, owner, note_id, tags).await?;
        }

        let note = Self::fetch_in_tx(&mut tx, owner, note_id).await?;
        tx.commit().await.map_err(Error::Database)?;

        info!(
            subsystem = "database",
            component = "notes",
            op = "update",
            user_id = owner,
            note_id,
            "Updated note"
        );
        Ok(note)
    }

    async fn delete_note(&self, owner: i64, note_id: i64) -> Result<Option<Note>> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let Some(note) = Self::fetch_in_tx(&mut tx, owner, note_id).await? else {
            return Ok(None);
        };

        // note_tags rows cascade; tag definitions stay.
        let deleted = sqlx::query("DELETE FROM notes WHERE user_id = $1 AND id = $2")
            .bind(owner)
            .bind(note_id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        if deleted.rows_affected() == 0 {
            return Ok(None);
        }

        tx.commit().await.map_err(Error::Database)?;

        info!(
            subsystem = "database",
            component = "notes",
            op = "delete",
            user_id = owner,
            note_id,
            "Deleted note"
        );
        Ok(Some(note))
    }

    async fn delete_notes(&self, owner: i64, note_ids: &[i64]) -> Result<Vec<Note>> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let mut deleted = Vec::with_capacity(note_ids.len());
        for &id in note_ids {
            if let Some(note) = Self::fetch_in_tx(&mut tx, owner, id).await? {
                deleted.push(note);
            }
        }

        let ids: Vec<i64> = deleted.iter().map(|n| n.id).collect();
        sqlx::query("DELETE FROM notes WHERE user_id = $1 AND id = ANY($2)")
            .bind(owner)
            .bind(&ids)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;

        info!(
            subsystem = "database",
            component = "notes",
            op = "delete_batch",
            user_id = owner,
            requested = note_ids.len(),
            result_count = deleted.len(),
            "Deleted notes"
        );
        Ok(deleted)
    }

    async fn toggle_pin(&self, owner: i64, note_id: i64) -> Result<Option<Note>> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let sql = format!(
            "UPDATE notes SET pinned = NOT pinned, updated_at = {}
             WHERE user_id = $1 AND id = $2
             RETURNING id",
            TOUCH_UPDATED_AT
        );
        let updated: Option<i64> = sqlx::query_scalar(&sql)
            .bind(owner)
            .bind(note_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(Error::Database)?;

        if updated.is_none() {
            return Ok(None);
        }

        let note = Self::fetch_in_tx(&mut tx, owner, note_id).await?;
        tx.commit().await.map_err(Error::Database)?;

        debug!(
            subsystem = "database",
            component = "notes",
            op = "toggle_pin",
            user_id = owner,
            note_id,
            pinned = note.as_ref().map(|n| n.pinned),
            "Toggled pin"
        );
        Ok(note)
    }

    async fn list_tags(&self, owner: i64) -> Result<Vec<Tag>> {
        self.tags.list_for_owner(owner).await
    }
}
