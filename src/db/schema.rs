use anyhow::{Context, Result};
use rusqlite::Connection;

/// Create all database tables if they don't exist
pub fn init_database(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS guestbook (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            message TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )
    .context("Failed to create guestbook table")?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_guestbook_name_created
         ON guestbook (name, created_at)",
        [],
    )
    .context("Failed to create guestbook index")?;

    // Backing table for the persistent credential store
    conn.execute(
        "CREATE TABLE IF NOT EXISTS credentials (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT DEFAULT (datetime('now'))
        )",
        [],
    )
    .context("Failed to create credentials table")?;

    Ok(())
}
