// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The memory engine facade.
//!
//! Owns the chunk collection: chunking + fingerprinting on ingest,
//! write-through caching, keyword-weighted retrieval, context assembly
//! for the router, integrity verification, and conversation-turn
//! recording. The engine never calls back into the router.

use std::collections::HashMap;
use std::sync::Arc;

use murmur_config::MemoryConfig;
use murmur_core::{types::epoch_ms, MurmurError};
use murmur_storage::{queries::turns, ConversationTurn, Database};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::cache::RecencyCache;
use crate::chunker;
use crate::fingerprint;
use crate::retrieval::{overlap_score, CorpusIndex};
use crate::store::ChunkStore;
use crate::types::{IntegrityFault, MemoryChunk, VerifyReport};

/// Separator between chunks inside an assembled context.
const CHUNK_SEPARATOR: &str = "\n\n---\n\n";
const CONTEXT_HEADER: &str = "--- MEMORY CONTEXT ---";
const CONTEXT_FOOTER: &str = "--- END MEMORY CONTEXT ---";

/// Long-term memory engine.
///
/// Cheap to share: wrap in an [`Arc`] and hand to the router and the
/// channels.
pub struct MemoryEngine {
    store: ChunkStore,
    db: Database,
    cache: Mutex<RecencyCache>,
    /// Built lazily on the first explicit retrieval; `None` until then.
    index: RwLock<Option<CorpusIndex>>,
    config: MemoryConfig,
}

impl MemoryEngine {
    /// Create an engine over the shared database, warming the cache with
    /// the most recent chunks.
    pub async fn new(db: Database, config: MemoryConfig) -> Result<Arc<Self>, MurmurError> {
        let store = ChunkStore::new(db.clone());
        let mut cache = RecencyCache::new(config.cache_size);
        cache.warm(store.recent(config.cache_size).await?);
        debug!(cached = cache.len(), "memory engine started");

        Ok(Arc::new(Self {
            store,
            db,
            cache: Mutex::new(cache),
            index: RwLock::new(None),
            config,
        }))
    }

    /// Chunk a document, fingerprint each chunk, and persist all of them.
    pub async fn store_document(
        &self,
        doc_id: &str,
        text: &str,
        metadata: HashMap<String, serde_json::Value>,
    ) -> Result<Vec<MemoryChunk>, MurmurError> {
        let now = epoch_ms() as i64;
        let chunks: Vec<MemoryChunk> = chunker::chunk_text(text, self.config.chunk_size)
            .into_iter()
            .enumerate()
            .map(|(i, chunk_text)| {
                MemoryChunk::new(doc_id, i, chunk_text, metadata.clone(), now)
            })
            .collect();

        for chunk in &chunks {
            self.store.insert(chunk).await?;
        }

        {
            let mut cache = self.cache.lock().await;
            for chunk in &chunks {
                cache.insert(chunk.clone());
            }
        }
        {
            let mut index = self.index.write().await;
            if let Some(index) = index.as_mut() {
                for chunk in &chunks {
                    index.add(chunk);
                }
            }
        }

        debug!(doc_id, count = chunks.len(), "document stored");
        Ok(chunks)
    }

    /// TF-IDF retrieval of the top `k` chunk texts for a query.
    ///
    /// Builds the corpus index from the store on first use. Chunks whose
    /// stored text no longer matches their fingerprint are excluded.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<String>, MurmurError> {
        self.ensure_index().await?;

        let scored = {
            let index = self.index.read().await;
            match index.as_ref() {
                Some(index) => index.score(query),
                None => vec![],
            }
        };

        let candidate_keys: Vec<String> = scored
            .into_iter()
            .filter(|(_, score)| *score >= self.config.min_score)
            .map(|(key, _)| key)
            .collect();

        let mut texts = Vec::with_capacity(k);
        for chunk in self.store.get_many(&candidate_keys).await? {
            if texts.len() == k {
                break;
            }
            if chunk.verify() {
                texts.push(chunk.text);
            } else {
                warn!(key = %chunk.key, "excluding chunk with bad fingerprint from retrieval");
            }
        }
        Ok(texts)
    }

    /// Fallback retrieval over the recency cache, available before any
    /// index exists: set-overlap scoring normalized by √length.
    pub async fn retrieve_simple(&self, query: &str, k: usize) -> Vec<String> {
        let cache = self.cache.lock().await;
        let mut scored: Vec<(f64, &MemoryChunk)> = cache
            .iter()
            .map(|chunk| (overlap_score(query, &chunk.text), chunk))
            .filter(|(score, _)| *score > 0.0)
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored
            .into_iter()
            .take(k)
            .filter(|(_, chunk)| chunk.verify())
            .map(|(_, chunk)| chunk.text.clone())
            .collect()
    }

    /// Assemble the prompt context for a message.
    ///
    /// Retrieved chunks are wrapped between context markers and the
    /// original message is appended. With no matching chunks the message
    /// comes back unchanged.
    pub async fn assemble_context(&self, message: &str) -> Result<String, MurmurError> {
        let k = self.config.top_k;
        let chunks = if self.index.read().await.is_some() {
            self.retrieve(message, k).await?
        } else {
            self.retrieve_simple(message, k).await
        };

        if chunks.is_empty() {
            return Ok(message.to_string());
        }

        Ok(format!(
            "{CONTEXT_HEADER}\n{}\n{CONTEXT_FOOTER}\n\nCurrent request: {message}",
            chunks.join(CHUNK_SEPARATOR)
        ))
    }

    /// Verify a single chunk's fingerprint against its stored text.
    pub async fn verify(&self, key: &str) -> Result<bool, MurmurError> {
        match self.store.get(key).await? {
            Some(chunk) => Ok(chunk.verify()),
            None => Err(MurmurError::MemoryIntegrity {
                key: key.to_string(),
            }),
        }
    }

    /// Sweep the whole store, recomputing every fingerprint.
    pub async fn verify_all(&self) -> Result<VerifyReport, MurmurError> {
        let mut report = VerifyReport::default();
        for chunk in self.store.all().await? {
            report.total += 1;
            if chunk.verify() {
                report.valid += 1;
            } else {
                report.invalid += 1;
                report.errors.push(IntegrityFault {
                    key: chunk.key.clone(),
                    stored: fingerprint::to_hex(chunk.fingerprint),
                    computed: fingerprint::to_hex(fingerprint::fingerprint(&chunk.text)),
                });
            }
        }
        Ok(report)
    }

    /// Remove every chunk of a document from store, cache, and index.
    pub async fn clear_document(&self, doc_id: &str) -> Result<usize, MurmurError> {
        let removed = self.store.delete_document(doc_id).await?;
        let mut cache = self.cache.lock().await;
        let mut index = self.index.write().await;
        for key in &removed {
            cache.remove(key);
            if let Some(index) = index.as_mut() {
                index.remove(key);
            }
        }
        Ok(removed.len())
    }

    /// Drop every chunk in the process and the store.
    pub async fn wipe(&self) -> Result<(), MurmurError> {
        self.store.wipe().await?;
        self.cache.lock().await.clear();
        *self.index.write().await = None;
        Ok(())
    }

    /// Record one conversation turn.
    pub async fn record_turn(
        &self,
        channel: &str,
        session_id: &str,
        role: &str,
        content: &str,
    ) -> Result<ConversationTurn, MurmurError> {
        turns::record_turn(&self.db, channel, session_id, role, content).await
    }

    /// Conversation history for a session, oldest first.
    pub async fn history(
        &self,
        session_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<ConversationTurn>, MurmurError> {
        turns::list_turns(&self.db, session_id, limit).await
    }

    /// Forget a session's conversation turns.
    pub async fn clear_session(&self, session_id: &str) -> Result<usize, MurmurError> {
        turns::clear_session(&self.db, session_id).await
    }

    /// Number of chunks on record.
    pub async fn chunk_count(&self) -> Result<usize, MurmurError> {
        self.store.count().await
    }

    /// Direct access to the shared database (for corruption tests and
    /// operator tooling).
    pub fn database(&self) -> &Database {
        &self.db
    }

    async fn ensure_index(&self) -> Result<(), MurmurError> {
        if self.index.read().await.is_some() {
            return Ok(());
        }
        let chunks = self.store.all().await?;
        let mut built = CorpusIndex::new();
        for chunk in &chunks {
            built.add(chunk);
        }
        let mut index = self.index.write().await;
        if index.is_none() {
            debug!(chunks = built.len(), "corpus index built");
            *index = Some(built);
        }
        Ok(())
    }
}
