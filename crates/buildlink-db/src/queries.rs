use crate::Database;
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension};

impl Database {
    // -- Blobs --

    /// Fetch the document stored under `key`, if any.
    pub fn get_blob(&self, key: &str) -> Result<Option<String>> {
        self.with_conn(|conn| query_blob(conn, key))
    }

    /// Replace the whole document stored under `key`.
    pub fn put_blob(&self, key: &str, value: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO blobs (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = datetime('now')",
                (key, value),
            )?;
            Ok(())
        })
    }

    /// Returns true if a document was removed.
    pub fn delete_blob(&self, key: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let removed = conn.execute("DELETE FROM blobs WHERE key = ?1", [key])?;
            Ok(removed > 0)
        })
    }

    /// Write several documents atomically.
    pub fn put_blobs(&self, entries: &[(&str, &str)]) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            for (key, value) in entries {
                tx.execute(
                    "INSERT INTO blobs (key, value) VALUES (?1, ?2)
                     ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = datetime('now')",
                    (*key, *value),
                )?;
            }
            tx.commit()?;
            Ok(())
        })
    }
}

fn query_blob(conn: &Connection, key: &str) -> Result<Option<String>> {
    let value = conn
        .query_row("SELECT value FROM blobs WHERE key = ?1", [key], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(value)
}
