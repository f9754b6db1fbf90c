use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::models::GuestbookEntry;

fn entry_from_row(row: &Row) -> rusqlite::Result<GuestbookEntry> {
    Ok(GuestbookEntry {
        id: row.get(0)?,
        name: row.get(1)?,
        message: row.get(2)?,
        created_at: row.get(3)?,
    })
}

/// All guestbook entries, newest first
pub fn list_entries(conn: &Connection) -> Result<Vec<GuestbookEntry>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, name, message, created_at
             FROM guestbook
             ORDER BY created_at DESC",
        )
        .context("Failed to prepare list_entries query")?;

    let entries = stmt
        .query_map([], entry_from_row)
        .context("Failed to execute list_entries query")?
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("Failed to collect guestbook entries")?;

    Ok(entries)
}

/// Look up a single entry by id
pub fn get_entry(conn: &Connection, id: &str) -> Result<Option<GuestbookEntry>> {
    conn.query_row(
        "SELECT id, name, message, created_at FROM guestbook WHERE id = ?1",
        params![id],
        entry_from_row,
    )
    .optional()
    .context("Failed to get guestbook entry")
}

/// Whether `name` has posted after `since` (RFC3339, same format as `created_at`)
pub fn has_entry_since(conn: &Connection, name: &str, since: &str) -> Result<bool> {
    let exists: Option<i32> = conn
        .query_row(
            "SELECT 1 FROM guestbook WHERE name = ?1 AND created_at > ?2 LIMIT 1",
            params![name, since],
            |row| row.get(0),
        )
        .optional()
        .context("Failed to check recent guestbook entries")?;

    Ok(exists.is_some())
}

pub fn insert_entry(conn: &Connection, entry: &GuestbookEntry) -> Result<()> {
    conn.execute(
        "INSERT INTO guestbook (id, name, message, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![entry.id, entry.name, entry.message, entry.created_at],
    )
    .context("Failed to insert guestbook entry")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::init_database;

    fn setup_test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_database(&conn).unwrap();
        conn
    }

    fn entry(id: &str, name: &str, created_at: &str) -> GuestbookEntry {
        GuestbookEntry {
            id: id.to_string(),
            name: name.to_string(),
            message: format!("hello from {}", name),
            created_at: created_at.to_string(),
        }
    }

    #[test]
    fn test_list_entries_newest_first() {
        let conn = setup_test_db();

        insert_entry(&conn, &entry("1", "ana", "2026-01-01T10:00:00.000Z")).unwrap();
        insert_entry(&conn, &entry("2", "ben", "2026-01-03T10:00:00.000Z")).unwrap();
        insert_entry(&conn, &entry("3", "cy", "2026-01-02T10:00:00.000Z")).unwrap();

        let ids: Vec<String> = list_entries(&conn)
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec!["2", "3", "1"]);
    }

    #[test]
    fn test_get_entry() {
        let conn = setup_test_db();
        let stored = entry("abc", "ana", "2026-01-01T10:00:00.000Z");
        insert_entry(&conn, &stored).unwrap();

        assert_eq!(get_entry(&conn, "abc").unwrap(), Some(stored));
        assert!(get_entry(&conn, "missing").unwrap().is_none());
    }

    #[test]
    fn test_has_entry_since() {
        let conn = setup_test_db();
        insert_entry(&conn, &entry("1", "ana", "2026-01-01T10:00:00.000Z")).unwrap();

        assert!(has_entry_since(&conn, "ana", "2026-01-01T09:55:00.000Z").unwrap());
        assert!(!has_entry_since(&conn, "ana", "2026-01-01T10:00:00.000Z").unwrap());
        assert!(!has_entry_since(&conn, "ben", "2026-01-01T09:55:00.000Z").unwrap());
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let conn = setup_test_db();
        insert_entry(&conn, &entry("1", "ana", "2026-01-01T10:00:00.000Z")).unwrap();
        assert!(insert_entry(&conn, &entry("1", "ben", "2026-01-01T11:00:00.000Z")).is_err());
    }
}
