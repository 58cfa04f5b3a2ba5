// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Model metadata registry queries.

use std::str::FromStr;

use murmur_core::MurmurError;
use rusqlite::params;

use crate::database::{map_tr_err, Database};
use crate::models::{ModelRecord, ModelStatus};

fn row_to_record(row: &rusqlite::Row) -> Result<ModelRecord, rusqlite::Error> {
    let status_str: String = row.get(4)?;
    Ok(ModelRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        category: row.get(2)?,
        size_bytes: row.get(3)?,
        status: ModelStatus::from_str(&status_str).unwrap_or(ModelStatus::Error),
        progress: row.get(5)?,
        downloaded_at: row.get(6)?,
        is_active: row.get::<_, i64>(7)? != 0,
    })
}

const SELECT_COLS: &str =
    "id, name, category, size_bytes, status, progress, downloaded_at, is_active";

/// Insert or replace a model registry entry.
pub async fn upsert_model(db: &Database, record: &ModelRecord) -> Result<(), MurmurError> {
    let r = record.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO models (id, name, category, size_bytes, status, progress, downloaded_at, is_active)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT(id) DO UPDATE SET
                     name = excluded.name,
                     category = excluded.category,
                     size_bytes = excluded.size_bytes,
                     status = excluded.status,
                     progress = excluded.progress,
                     downloaded_at = excluded.downloaded_at,
                     is_active = excluded.is_active",
                params![
                    r.id,
                    r.name,
                    r.category,
                    r.size_bytes,
                    r.status.to_string(),
                    r.progress,
                    r.downloaded_at,
                    r.is_active as i64,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Fetch a model by ID, failing with `UnknownModel` on a miss.
pub async fn get_model(db: &Database, id: &str) -> Result<ModelRecord, MurmurError> {
    let id_owned = id.to_string();
    let record = db
        .connection()
        .call(move |conn| {
            let sql = format!("SELECT {SELECT_COLS} FROM models WHERE id = ?1");
            let result = conn.query_row(&sql, params![id_owned], row_to_record);
            match result {
                Ok(r) => Ok(Some(r)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(map_tr_err)?;

    record.ok_or_else(|| MurmurError::UnknownModel(id.to_string()))
}

/// List all registered models, name order.
pub async fn list_models(db: &Database) -> Result<Vec<ModelRecord>, MurmurError> {
    db.connection()
        .call(move |conn| {
            let sql = format!("SELECT {SELECT_COLS} FROM models ORDER BY name ASC");
            let mut stmt = conn.prepare(&sql)?;
            let records = stmt
                .query_map([], row_to_record)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(records)
        })
        .await
        .map_err(map_tr_err)
}

/// Update a model's download state, clamping progress to `[0, 100]`.
pub async fn set_download_state(
    db: &Database,
    id: &str,
    status: ModelStatus,
    progress: f64,
) -> Result<(), MurmurError> {
    let id = id.to_string();
    let progress = progress.clamp(0.0, 100.0);
    let downloaded_at = matches!(status, ModelStatus::Completed);
    db.connection()
        .call(move |conn| {
            if downloaded_at {
                conn.execute(
                    "UPDATE models SET status = ?1, progress = ?2,
                     downloaded_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                     WHERE id = ?3",
                    params![status.to_string(), progress, id],
                )?;
            } else {
                conn.execute(
                    "UPDATE models SET status = ?1, progress = ?2 WHERE id = ?3",
                    params![status.to_string(), progress, id],
                )?;
            }
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Mark one model active, clearing the flag on every other row.
pub async fn set_active(db: &Database, id: &str) -> Result<(), MurmurError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            tx.execute("UPDATE models SET is_active = 0", [])?;
            tx.execute(
                "UPDATE models SET is_active = 1 WHERE id = ?1",
                params![id],
            )?;
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// The active model, if any.
pub async fn active_model(db: &Database) -> Result<Option<ModelRecord>, MurmurError> {
    db.connection()
        .call(move |conn| {
            let sql = format!("SELECT {SELECT_COLS} FROM models WHERE is_active = 1 LIMIT 1");
            let result = conn.query_row(&sql, [], row_to_record);
            match result {
                Ok(r) => Ok(Some(r)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upsert_and_get() {
        let db = Database::open_in_memory().await.unwrap();
        let rec = ModelRecord::pending("phi-3", "Phi 3 Mini");
        upsert_model(&db, &rec).await.unwrap();

        let fetched = get_model(&db, "phi-3").await.unwrap();
        assert_eq!(fetched.name, "Phi 3 Mini");
        assert_eq!(fetched.status, ModelStatus::Pending);
    }

    #[tokio::test]
    async fn get_missing_is_unknown_model() {
        let db = Database::open_in_memory().await.unwrap();
        let err = get_model(&db, "ghost").await.unwrap_err();
        assert!(matches!(err, MurmurError::UnknownModel(id) if id == "ghost"));
    }

    #[tokio::test]
    async fn download_state_transitions() {
        let db = Database::open_in_memory().await.unwrap();
        upsert_model(&db, &ModelRecord::pending("m", "M")).await.unwrap();

        set_download_state(&db, "m", ModelStatus::Downloading, 42.0)
            .await
            .unwrap();
        let rec = get_model(&db, "m").await.unwrap();
        assert_eq!(rec.status, ModelStatus::Downloading);
        assert_eq!(rec.progress, 42.0);
        assert!(rec.downloaded_at.is_none());

        set_download_state(&db, "m", ModelStatus::Completed, 100.0)
            .await
            .unwrap();
        let rec = get_model(&db, "m").await.unwrap();
        assert_eq!(rec.status, ModelStatus::Completed);
        assert!(rec.downloaded_at.is_some());
    }

    #[tokio::test]
    async fn progress_is_clamped() {
        let db = Database::open_in_memory().await.unwrap();
        upsert_model(&db, &ModelRecord::pending("m", "M")).await.unwrap();
        set_download_state(&db, "m", ModelStatus::Downloading, 150.0)
            .await
            .unwrap();
        assert_eq!(get_model(&db, "m").await.unwrap().progress, 100.0);
    }

    #[tokio::test]
    async fn set_active_is_exclusive() {
        let db = Database::open_in_memory().await.unwrap();
        upsert_model(&db, &ModelRecord::pending("a", "A")).await.unwrap();
        upsert_model(&db, &ModelRecord::pending("b", "B")).await.unwrap();

        set_active(&db, "a").await.unwrap();
        set_active(&db, "b").await.unwrap();

        let active = active_model(&db).await.unwrap().unwrap();
        assert_eq!(active.id, "b");
        assert!(!get_model(&db, "a").await.unwrap().is_active);
    }
}
