//! Chat transcript store implementation.
//!
//! Transcripts keep their messages as a JSON text column — the message list
//! is always read and written whole, so a relational layout would buy
//! nothing here.

use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::debug;

use scrawl_core::{defaults, ChatMessage, ChatStore, ChatSummary, ChatTranscript, Error, Result};

/// SQLite implementation of [`ChatStore`].
#[derive(Clone)]
pub struct SqliteChatStore {
    pool: SqlitePool,
}

impl SqliteChatStore {
    /// Create a new SqliteChatStore with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn fetch_row(&self, id: i64) -> Result<(String, String)> {
        sqlx::query_as::<_, (String, String)>("SELECT title, messages FROM chat WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(Error::ChatNotFound(id))
    }
}

#[async_trait]
impl ChatStore for SqliteChatStore {
    async fn create(&self) -> Result<i64> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO chat (title, messages) VALUES (?, '[]') RETURNING id",
        )
        .bind(defaults::NEW_CHAT_TITLE)
        .fetch_one(&self.pool)
        .await?;
        debug!(subsystem = "db", component = "chats", chat_id = id, "Created chat");
        Ok(id)
    }

    async fn fetch(&self, id: i64) -> Result<ChatTranscript> {
        let (title, messages) = self.fetch_row(id).await?;
        let messages: Vec<ChatMessage> = serde_json::from_str(&messages)?;
        Ok(ChatTranscript {
            id,
            title,
            messages,
        })
    }

    async fn list(&self) -> Result<Vec<ChatSummary>> {
        let rows = sqlx::query_as::<_, (i64, String)>(
            "SELECT id, title FROM chat ORDER BY id DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(id, title)| ChatSummary { id, title })
            .collect())
    }

    async fn append_exchange(
        &self,
        id: i64,
        user: ChatMessage,
        assistant: ChatMessage,
    ) -> Result<()> {
        let mut transcript = self.fetch(id).await?;
        transcript.messages.push(user);
        transcript.messages.push(assistant);
        let messages = serde_json::to_string(&transcript.messages)?;
        sqlx::query("UPDATE chat SET messages = ? WHERE id = ?")
            .bind(messages)
            .bind(id)
            .execute(&self.pool)
            .await?;
        debug!(
            subsystem = "db",
            component = "chats",
            chat_id = id,
            messages = transcript.messages.len(),
            "Appended exchange"
        );
        Ok(())
    }

    async fn update_title(&self, id: i64, title: &str) -> Result<()> {
        let result = sqlx::query("UPDATE chat SET title = ? WHERE id = ?")
            .bind(title)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::ChatNotFound(id));
        }
        Ok(())
    }
}
