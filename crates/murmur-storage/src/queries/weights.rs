// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Opaque model weight blob storage.

use murmur_core::MurmurError;
use rusqlite::params;

use crate::database::{map_tr_err, Database};

/// Store (or replace) the weight blob for a model.
pub async fn put_weights(
    db: &Database,
    model_id: &str,
    data: Vec<u8>,
) -> Result<(), MurmurError> {
    let model_id = model_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO model_weights (model_id, data) VALUES (?1, ?2)
                 ON CONFLICT(model_id) DO UPDATE SET data = excluded.data",
                params![model_id, data],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Fetch a model's weight blob.
pub async fn get_weights(
    db: &Database,
    model_id: &str,
) -> Result<Option<Vec<u8>>, MurmurError> {
    let model_id = model_id.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT data FROM model_weights WHERE model_id = ?1",
                params![model_id],
                |row| row.get(0),
            );
            match result {
                Ok(v) => Ok(Some(v)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Remove a model's weight blob. Returns true if a row was deleted.
pub async fn delete_weights(db: &Database, model_id: &str) -> Result<bool, MurmurError> {
    let model_id = model_id.to_string();
    db.connection()
        .call(move |conn| {
            let n = conn.execute(
                "DELETE FROM model_weights WHERE model_id = ?1",
                params![model_id],
            )?;
            Ok(n > 0)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn blob_roundtrip() {
        let db = Database::open_in_memory().await.unwrap();
        let payload: Vec<u8> = (0..=255).collect();

        put_weights(&db, "m", payload.clone()).await.unwrap();
        let fetched = get_weights(&db, "m").await.unwrap().unwrap();
        assert_eq!(fetched, payload);
    }

    #[tokio::test]
    async fn put_replaces_existing() {
        let db = Database::open_in_memory().await.unwrap();
        put_weights(&db, "m", vec![1, 2, 3]).await.unwrap();
        put_weights(&db, "m", vec![9]).await.unwrap();
        assert_eq!(get_weights(&db, "m").await.unwrap().unwrap(), vec![9]);
    }

    #[tokio::test]
    async fn delete_and_missing() {
        let db = Database::open_in_memory().await.unwrap();
        assert!(get_weights(&db, "m").await.unwrap().is_none());
        put_weights(&db, "m", vec![1]).await.unwrap();
        assert!(delete_weights(&db, "m").await.unwrap());
        assert!(!delete_weights(&db, "m").await.unwrap());
    }
}
