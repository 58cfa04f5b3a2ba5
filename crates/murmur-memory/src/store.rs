// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed chunk store.
//!
//! Rows live in the shared `memory` table (see the storage crate's
//! migrations). Fingerprints are stored as 32-char lowercase hex so the
//! full 128 bits survive SQLite's signed-integer column type.

use std::collections::HashMap;

use murmur_core::MurmurError;
use murmur_storage::{map_tr_err, Database};
use rusqlite::params;

use crate::fingerprint;
use crate::types::MemoryChunk;

const SELECT_COLS: &str = "key, doc_id, idx, text, fingerprint, metadata, created_at";

fn row_to_chunk(row: &rusqlite::Row) -> Result<MemoryChunk, rusqlite::Error> {
    let fp_hex: String = row.get(4)?;
    let metadata_json: Option<String> = row.get(5)?;
    let metadata: HashMap<String, serde_json::Value> = metadata_json
        .as_deref()
        .and_then(|s| serde_json::from_str(s).ok())
        .unwrap_or_default();

    Ok(MemoryChunk {
        key: row.get(0)?,
        doc_id: row.get(1)?,
        index: row.get::<_, i64>(2)? as usize,
        text: row.get(3)?,
        // A malformed fingerprint column decodes to 0, which can never
        // match a real hash and thus shows up in verify_all.
        fingerprint: fingerprint::from_hex(&fp_hex).unwrap_or(0),
        metadata,
        created_at_ms: row.get(6)?,
    })
}

/// Persistent store for memory chunks.
#[derive(Clone)]
pub struct ChunkStore {
    db: Database,
}

impl ChunkStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Insert a chunk, replacing any previous row with the same key.
    pub async fn insert(&self, chunk: &MemoryChunk) -> Result<(), MurmurError> {
        let c = chunk.clone();
        let metadata_json = if c.metadata.is_empty() {
            None
        } else {
            serde_json::to_string(&c.metadata).ok()
        };
        self.db
            .connection()
            .call(move |conn| {
                conn.execute(
                    "INSERT OR REPLACE INTO memory (key, doc_id, idx, text, fingerprint, metadata, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![
                        c.key,
                        c.doc_id,
                        c.index as i64,
                        c.text,
                        fingerprint::to_hex(c.fingerprint),
                        metadata_json,
                        c.created_at_ms,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    /// Fetch one chunk by key.
    pub async fn get(&self, key: &str) -> Result<Option<MemoryChunk>, MurmurError> {
        let key = key.to_string();
        self.db
            .connection()
            .call(move |conn| {
                let sql = format!("SELECT {SELECT_COLS} FROM memory WHERE key = ?1");
                let result = conn.query_row(&sql, params![key], row_to_chunk);
                match result {
                    Ok(c) => Ok(Some(c)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(map_tr_err)
    }

    /// Fetch several chunks by key, preserving the requested order.
    pub async fn get_many(
        &self,
        keys: &[String],
    ) -> Result<Vec<MemoryChunk>, MurmurError> {
        if keys.is_empty() {
            return Ok(vec![]);
        }
        let keys = keys.to_vec();
        self.db
            .connection()
            .call(move |conn| {
                let placeholders: Vec<String> =
                    (1..=keys.len()).map(|i| format!("?{i}")).collect();
                let sql = format!(
                    "SELECT {SELECT_COLS} FROM memory WHERE key IN ({})",
                    placeholders.join(", ")
                );
                let mut stmt = conn.prepare(&sql)?;
                let params_vec: Vec<&dyn rusqlite::types::ToSql> =
                    keys.iter().map(|k| k as &dyn rusqlite::types::ToSql).collect();
                let mut found: HashMap<String, MemoryChunk> = stmt
                    .query_map(params_vec.as_slice(), row_to_chunk)?
                    .collect::<Result<Vec<_>, _>>()?
                    .into_iter()
                    .map(|c| (c.key.clone(), c))
                    .collect();
                Ok(keys.iter().filter_map(|k| found.remove(k)).collect())
            })
            .await
            .map_err(map_tr_err)
    }

    /// Every chunk, in insertion order.
    pub async fn all(&self) -> Result<Vec<MemoryChunk>, MurmurError> {
        self.db
            .connection()
            .call(move |conn| {
                let sql = format!("SELECT {SELECT_COLS} FROM memory ORDER BY rowid ASC");
                let mut stmt = conn.prepare(&sql)?;
                let chunks = stmt
                    .query_map([], row_to_chunk)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(chunks)
            })
            .await
            .map_err(map_tr_err)
    }

    /// The `n` most recently inserted chunks, oldest of them first.
    pub async fn recent(&self, n: usize) -> Result<Vec<MemoryChunk>, MurmurError> {
        self.db
            .connection()
            .call(move |conn| {
                let sql = format!(
                    "SELECT {SELECT_COLS} FROM memory ORDER BY rowid DESC LIMIT ?1"
                );
                let mut stmt = conn.prepare(&sql)?;
                let mut chunks = stmt
                    .query_map(params![n as i64], row_to_chunk)?
                    .collect::<Result<Vec<_>, _>>()?;
                chunks.reverse();
                Ok(chunks)
            })
            .await
            .map_err(map_tr_err)
    }

    /// Delete every chunk of a document, returning the removed keys.
    pub async fn delete_document(&self, doc_id: &str) -> Result<Vec<String>, MurmurError> {
        let doc_id = doc_id.to_string();
        self.db
            .connection()
            .call(move |conn| {
                let mut stmt =
                    conn.prepare("SELECT key FROM memory WHERE doc_id = ?1")?;
                let keys: Vec<String> = stmt
                    .query_map(params![doc_id], |row| row.get(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                conn.execute("DELETE FROM memory WHERE doc_id = ?1", params![doc_id])?;
                Ok(keys)
            })
            .await
            .map_err(map_tr_err)
    }

    /// Number of stored chunks.
    pub async fn count(&self) -> Result<usize, MurmurError> {
        self.db
            .connection()
            .call(|conn| {
                let n: i64 =
                    conn.query_row("SELECT COUNT(*) FROM memory", [], |r| r.get(0))?;
                Ok(n as usize)
            })
            .await
            .map_err(map_tr_err)
    }

    /// Remove every chunk.
    pub async fn wipe(&self) -> Result<(), MurmurError> {
        self.db
            .connection()
            .call(|conn| {
                conn.execute("DELETE FROM memory", [])?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> ChunkStore {
        ChunkStore::new(Database::open_in_memory().await.unwrap())
    }

    fn chunk(doc: &str, i: usize, text: &str) -> MemoryChunk {
        MemoryChunk::new(doc, i, text.to_string(), HashMap::new(), 1_700_000_000_000)
    }

    #[tokio::test]
    async fn insert_and_get_roundtrip() {
        let store = store().await;
        let c = chunk("doc", 0, "The fingerprint survives storage.");
        store.insert(&c).await.unwrap();

        let fetched = store.get("doc_chunk_0").await.unwrap().unwrap();
        assert_eq!(fetched, c);
        assert!(fetched.verify());
    }

    #[tokio::test]
    async fn metadata_roundtrip() {
        let store = store().await;
        let mut meta = HashMap::new();
        meta.insert("title".to_string(), serde_json::json!("Notes"));
        let c = MemoryChunk::new("doc", 0, "text".into(), meta, 0);
        store.insert(&c).await.unwrap();

        let fetched = store.get("doc_chunk_0").await.unwrap().unwrap();
        assert_eq!(fetched.title(), Some("Notes"));
    }

    #[tokio::test]
    async fn insert_replaces_same_key() {
        let store = store().await;
        store.insert(&chunk("doc", 0, "first")).await.unwrap();
        store.insert(&chunk("doc", 0, "second")).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
        let fetched = store.get("doc_chunk_0").await.unwrap().unwrap();
        assert_eq!(fetched.text, "second");
        assert!(fetched.verify());
    }

    #[tokio::test]
    async fn all_preserves_insertion_order() {
        let store = store().await;
        store.insert(&chunk("a", 0, "one")).await.unwrap();
        store.insert(&chunk("b", 0, "two")).await.unwrap();
        store.insert(&chunk("c", 0, "three")).await.unwrap();

        let all = store.all().await.unwrap();
        let texts: Vec<&str> = all.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["one", "two", "three"]);
    }

    #[tokio::test]
    async fn recent_returns_tail_in_order() {
        let store = store().await;
        for i in 0..5 {
            store.insert(&chunk("d", i, &format!("t{i}"))).await.unwrap();
        }
        let recent = store.recent(2).await.unwrap();
        let texts: Vec<&str> = recent.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["t3", "t4"]);
    }

    #[tokio::test]
    async fn delete_document_scopes_to_doc() {
        let store = store().await;
        store.insert(&chunk("keep", 0, "stays")).await.unwrap();
        store.insert(&chunk("drop", 0, "goes")).await.unwrap();
        store.insert(&chunk("drop", 1, "goes too")).await.unwrap();

        let removed = store.delete_document("drop").await.unwrap();
        assert_eq!(removed.len(), 2);
        assert_eq!(store.count().await.unwrap(), 1);
        assert!(store.get("keep_chunk_0").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn get_many_preserves_requested_order() {
        let store = store().await;
        store.insert(&chunk("a", 0, "one")).await.unwrap();
        store.insert(&chunk("b", 0, "two")).await.unwrap();

        let got = store
            .get_many(&[
                "b_chunk_0".to_string(),
                "missing".to_string(),
                "a_chunk_0".to_string(),
            ])
            .await
            .unwrap();
        let texts: Vec<&str> = got.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["two", "one"]);
    }
}
