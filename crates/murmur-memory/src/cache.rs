// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory recency cache over the chunk store.
//!
//! Holds the N most recently written chunks so retrieval's fallback path
//! and key lookups avoid a store scan. Writes go through both cache and
//! store; deletes invalidate both. Chunks are immutable after creation,
//! so reads need no locking beyond the engine's own.

use std::collections::{HashMap, VecDeque};

use crate::types::MemoryChunk;

/// Bounded insertion-recency cache.
pub struct RecencyCache {
    capacity: usize,
    chunks: HashMap<String, MemoryChunk>,
    order: VecDeque<String>,
}

impl RecencyCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            chunks: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    /// Insert a chunk, evicting the oldest entries beyond capacity.
    pub fn insert(&mut self, chunk: MemoryChunk) {
        let key = chunk.key.clone();
        if self.chunks.insert(key.clone(), chunk).is_some() {
            self.order.retain(|k| k != &key);
        }
        self.order.push_back(key);

        while self.order.len() > self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.chunks.remove(&evicted);
            }
        }
    }

    /// Pre-populate from the store's most recent chunks (oldest first).
    pub fn warm(&mut self, chunks: Vec<MemoryChunk>) {
        for chunk in chunks {
            self.insert(chunk);
        }
    }

    pub fn get(&self, key: &str) -> Option<&MemoryChunk> {
        self.chunks.get(key)
    }

    /// Remove one entry. Returns true if it was cached.
    pub fn remove(&mut self, key: &str) -> bool {
        if self.chunks.remove(key).is_some() {
            self.order.retain(|k| k != key);
            true
        } else {
            false
        }
    }

    pub fn clear(&mut self) {
        self.chunks.clear();
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Cached chunks, oldest insertion first.
    pub fn iter(&self) -> impl Iterator<Item = &MemoryChunk> {
        self.order.iter().filter_map(|k| self.chunks.get(k))
    }
}
