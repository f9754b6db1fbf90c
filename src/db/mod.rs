pub mod credentials;
pub mod guestbook;
pub mod schema;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use rusqlite::Connection;
use tokio::sync::Mutex;

/// Shared SQLite connection wrapped in a Mutex for thread-safe access
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open the database file and make sure all tables exist
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database at {}", path.display()))?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        schema::init_database(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Execute a database operation while holding the connection lock
    pub async fn with_db<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send,
        T: Send,
    {
        let conn = self.conn.lock().await;

        // rusqlite is sync; queries here are small enough to run inline
        f(&conn)
    }
}

/// Data models for the database layer
pub mod models {
    use serde::{Deserialize, Serialize};

    /// A single guestbook message
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct GuestbookEntry {
        pub id: String,
        pub name: String,
        pub message: String,
        pub created_at: String,
    }
}
