//! Note store implementation.
//!
//! The note is a singleton record: one row, overwritten in place. The row is
//! seeded during `migrate()`, so reads after startup always find it.

use async_trait::async_trait;
use sqlx::SqlitePool;

use scrawl_core::{defaults, Error, NoteStore, Result};

/// SQLite implementation of [`NoteStore`].
#[derive(Clone)]
pub struct SqliteNoteStore {
    pool: SqlitePool,
}

impl SqliteNoteStore {
    /// Create a new SqliteNoteStore with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NoteStore for SqliteNoteStore {
    async fn read_note(&self) -> Result<String> {
        let content: Option<String> =
            sqlx::query_scalar("SELECT content FROM note WHERE id = ?")
                .bind(defaults::NOTE_ROW_ID)
                .fetch_optional(&self.pool)
                .await?;
        content.ok_or_else(|| Error::NotFound("note record".to_string()))
    }

    async fn write_note(&self, content: &str) -> Result<()> {
        sqlx::query("UPDATE note SET content = ? WHERE id = ?")
            .bind(content)
            .bind(defaults::NOTE_ROW_ID)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
