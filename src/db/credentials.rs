use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

/// Read a stored value by key
pub fn get_value(conn: &Connection, key: &str) -> Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM credentials WHERE key = ?1",
        params![key],
        |row| row.get(0),
    )
    .optional()
    .with_context(|| format!("Failed to read credential '{}'", key))
}

/// Insert or replace the value stored under a key
pub fn put_value(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO credentials (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            updated_at = datetime('now')",
        params![key, value],
    )
    .with_context(|| format!("Failed to store credential '{}'", key))?;

    Ok(())
}
