// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable key/value configuration store.

use murmur_core::MurmurError;
use rusqlite::params;

use crate::database::{map_tr_err, Database};

/// Upsert a config value, refreshing `updated_at`.
pub async fn set_value(
    db: &Database,
    key: &str,
    value: &serde_json::Value,
) -> Result<(), MurmurError> {
    let key = key.to_string();
    let json = value.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO config (key, value, updated_at)
                 VALUES (?1, ?2, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
                 ON CONFLICT(key) DO UPDATE SET
                     value = excluded.value,
                     updated_at = excluded.updated_at",
                params![key, json],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Fetch a config value by key.
pub async fn get_value(
    db: &Database,
    key: &str,
) -> Result<Option<serde_json::Value>, MurmurError> {
    let key = key.to_string();
    let raw: Option<String> = db
        .connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT value FROM config WHERE key = ?1",
                params![key],
                |row| row.get(0),
            );
            match result {
                Ok(v) => Ok(Some(v)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(map_tr_err)?;

    match raw {
        Some(s) => {
            let value = serde_json::from_str(&s).map_err(|e| MurmurError::Storage {
                source: Box::new(e),
            })?;
            Ok(Some(value))
        }
        None => Ok(None),
    }
}

/// Remove a config value. Returns true if a row was deleted.
pub async fn delete_value(db: &Database, key: &str) -> Result<bool, MurmurError> {
    let key = key.to_string();
    db.connection()
        .call(move |conn| {
            let n = conn.execute("DELETE FROM config WHERE key = ?1", params![key])?;
            Ok(n > 0)
        })
        .await
        .map_err(map_tr_err)
}
