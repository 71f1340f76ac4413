//! # scrawl-db
//!
//! SQLite persistence layer for scrawl.
//!
//! This crate provides:
//! - Connection pool management
//! - The singleton note record store
//! - The chat transcript store
//!
//! ## Example
//!
//! ```rust,ignore
//! use scrawl_db::Database;
//! use scrawl_core::NoteStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("sqlite://scrawl.db").await?;
//!     db.migrate().await?;
//!
//!     db.notes.write_note("Hello, world!").await?;
//!     println!("{}", db.notes.read_note().await?);
//!     Ok(())
//! }
//! ```

pub mod chats;
pub mod notes;
pub mod pool;

// Re-export core types
pub use scrawl_core::*;

pub use chats::SqliteChatStore;
pub use notes::SqliteNoteStore;
pub use pool::{create_pool, create_pool_with_config, PoolConfig};

/// Idempotent schema setup, applied in order at startup. The final statement
/// seeds the singleton note row so first reads never miss.
const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS note (
        id INTEGER PRIMARY KEY,
        content TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS chat (
        id INTEGER PRIMARY KEY,
        title TEXT NOT NULL,
        messages TEXT NOT NULL DEFAULT '[]'
    )",
    "INSERT OR IGNORE INTO note (id, content) VALUES (0, '')",
];

/// Combined database context with all stores.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::SqlitePool,
    /// Singleton note record store.
    pub notes: SqliteNoteStore,
    /// Chat transcript store.
    pub chats: SqliteChatStore,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self {
            notes: SqliteNoteStore::new(pool.clone()),
            chats: SqliteChatStore::new(pool.clone()),
            pool,
        }
    }

    /// Connect to the database URL with default pool settings.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = create_pool(database_url).await?;
        Ok(Self::new(pool))
    }

    /// Apply the schema; safe to run on every startup.
    pub async fn migrate(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }
}
