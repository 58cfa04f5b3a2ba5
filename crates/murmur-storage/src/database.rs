// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and
//! embedded migrations.
//!
//! All writes are serialized through tokio-rusqlite's single background
//! thread. Do NOT create additional Connection instances for writes.

use murmur_core::MurmurError;
use tokio_rusqlite::Connection;
use tracing::debug;

use crate::migrations::run_migrations;

/// Convert tokio_rusqlite errors into MurmurError::Storage.
pub fn map_tr_err(e: tokio_rusqlite::Error) -> MurmurError {
    MurmurError::Storage {
        source: Box::new(e),
    }
}

/// Handle to the single SQLite database backing all persisted state.
///
/// Cloning is cheap; clones share the same background connection thread.
#[derive(Clone)]
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the database at `path`, apply PRAGMAs, and run
    /// migrations.
    pub async fn open(path: &str, wal_mode: bool) -> Result<Self, MurmurError> {
        let conn = Connection::open(path).await.map_err(map_tr_err)?;
        Self::initialize(conn, wal_mode).await
    }

    /// Open an in-memory database with migrations applied. Test use only.
    pub async fn open_in_memory() -> Result<Self, MurmurError> {
        let conn = Connection::open_in_memory().await.map_err(map_tr_err)?;
        Self::initialize(conn, false).await
    }

    async fn initialize(conn: Connection, wal_mode: bool) -> Result<Self, MurmurError> {
        conn.call(move |conn| {
            if wal_mode {
                conn.pragma_update(None, "journal_mode", "WAL")?;
            }
            conn.pragma_update(None, "foreign_keys", "ON")?;
            conn.pragma_update(None, "busy_timeout", 5000)?;
            run_migrations(conn)
                .map_err(|e| tokio_rusqlite::Error::Other(Box::new(std::io::Error::other(
                    e.to_string(),
                ))))?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        debug!("database initialized");
        Ok(Self { conn })
    }

    /// The underlying tokio-rusqlite connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn open_in_memory_runs_migrations() {
        let db = Database::open_in_memory().await.unwrap();

        // All five collections exist after migration.
        let tables: Vec<String> = db
            .connection()
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
                )?;
                let names = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(names)
            })
            .await
            .unwrap();

        for expected in ["config", "models", "model_weights", "memory", "sessions"] {
            assert!(
                tables.iter().any(|t| t == expected),
                "missing table {expected}, got {tables:?}"
            );
        }
    }

    #[tokio::test]
    async fn open_on_disk_is_reopenable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("murmur.db");
        let path_str = path.to_str().unwrap();

        {
            let db = Database::open(path_str, true).await.unwrap();
            db.connection()
                .call(|conn| {
                    conn.execute(
                        "INSERT INTO config (key, value) VALUES ('k', '1')",
                        [],
                    )?;
                    Ok(())
                })
                .await
                .unwrap();
        }

        let db = Database::open(path_str, true).await.unwrap();
        let value: String = db
            .connection()
            .call(|conn| {
                let v =
                    conn.query_row("SELECT value FROM config WHERE key = 'k'", [], |r| {
                        r.get(0)
                    })?;
                Ok(v)
            })
            .await
            .unwrap();
        assert_eq!(value, "1");
    }
}
