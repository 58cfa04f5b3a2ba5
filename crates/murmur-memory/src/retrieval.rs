// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keyword-weighted retrieval.
//!
//! Two scoring paths exist:
//!
//! - [`CorpusIndex::score`]: a TF-IDF ranking over the whole corpus, with
//!   a ×2 boost when the query appears verbatim in the chunk and ×1.5
//!   when it appears in the chunk's `title` metadata.
//! - [`overlap_score`]: a corpus-independent set-overlap score normalized
//!   by √length, used before the index has been built.
//!
//! Both paths are deterministic; ties keep insertion order.

use std::collections::HashMap;

use crate::types::MemoryChunk;

/// Case-fold, split on whitespace, drop tokens of length <= 2.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split_whitespace()
        .filter(|t| t.chars().count() > 2)
        .map(|t| t.to_string())
        .collect()
}

struct IndexedChunk {
    key: String,
    /// Token -> occurrence count within the chunk.
    counts: HashMap<String, usize>,
    token_count: usize,
    text_folded: String,
    title_folded: Option<String>,
}

/// In-memory TF-IDF index over the chunk corpus.
///
/// Kept in insertion order so equal scores resolve the same way on every
/// run.
#[derive(Default)]
pub struct CorpusIndex {
    chunks: Vec<IndexedChunk>,
    positions: HashMap<String, usize>,
    /// Token -> number of chunks containing it.
    doc_freq: HashMap<String, usize>,
}

impl CorpusIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.positions.contains_key(key)
    }

    /// Add a chunk. Re-adding an existing key replaces it in place.
    pub fn add(&mut self, chunk: &MemoryChunk) {
        if self.contains(&chunk.key) {
            self.remove(&chunk.key);
        }

        let tokens = tokenize(&chunk.text);
        let token_count = tokens.len();
        let mut counts: HashMap<String, usize> = HashMap::new();
        for token in tokens {
            *counts.entry(token).or_insert(0) += 1;
        }
        for token in counts.keys() {
            *self.doc_freq.entry(token.clone()).or_insert(0) += 1;
        }

        self.positions.insert(chunk.key.clone(), self.chunks.len());
        self.chunks.push(IndexedChunk {
            key: chunk.key.clone(),
            counts,
            token_count,
            text_folded: chunk.text.to_lowercase(),
            title_folded: chunk.title().map(|t| t.to_lowercase()),
        });
    }

    /// Remove a chunk by key, if indexed.
    pub fn remove(&mut self, key: &str) {
        let Some(pos) = self.positions.remove(key) else {
            return;
        };
        let removed = self.chunks.remove(pos);
        for token in removed.counts.keys() {
            if let Some(df) = self.doc_freq.get_mut(token) {
                *df -= 1;
                if *df == 0 {
                    self.doc_freq.remove(token);
                }
            }
        }
        // Positions after the removed slot shift down by one.
        for (i, chunk) in self.chunks.iter().enumerate().skip(pos) {
            self.positions.insert(chunk.key.clone(), i);
        }
    }

    pub fn clear(&mut self) {
        self.chunks.clear();
        self.positions.clear();
        self.doc_freq.clear();
    }

    /// Score every chunk against the query.
    ///
    /// Returns `(key, score)` sorted descending; equal scores keep
    /// insertion order. Chunks scoring zero are omitted.
    pub fn score(&self, query: &str) -> Vec<(String, f64)> {
        let query_tokens = tokenize(query);
        if query_tokens.is_empty() || self.chunks.is_empty() {
            return vec![];
        }

        let mut query_counts: HashMap<&str, usize> = HashMap::new();
        for token in &query_tokens {
            *query_counts.entry(token.as_str()).or_insert(0) += 1;
        }

        let corpus_size = self.chunks.len() as f64;
        let query_folded = query.to_lowercase();

        let mut scored: Vec<(String, f64)> = Vec::new();
        for chunk in &self.chunks {
            if chunk.token_count == 0 {
                continue;
            }
            let mut score = 0.0f64;
            for (&token, &q_count) in &query_counts {
                let Some(&c_count) = chunk.counts.get(token) else {
                    continue;
                };
                let tf = c_count as f64 / chunk.token_count as f64;
                let df = self.doc_freq.get(token).copied().unwrap_or(0) as f64;
                let idf = (corpus_size / (1.0 + df)).ln();
                score += tf * idf * q_count as f64;
            }
            if score == 0.0 {
                continue;
            }
            if chunk.text_folded.contains(&query_folded) {
                score *= 2.0;
            }
            if chunk
                .title_folded
                .as_deref()
                .is_some_and(|t| t.contains(&query_folded))
            {
                score *= 1.5;
            }
            scored.push((chunk.key.clone(), score));
        }

        // Stable sort keeps insertion order among ties.
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored
    }
}

/// Corpus-independent fallback score: query/chunk token overlap,
/// normalized by the square root of the chunk's token count.
pub fn overlap_score(query: &str, chunk_text: &str) -> f64 {
    let query_tokens = tokenize(query);
    let chunk_tokens = tokenize(chunk_text);
    if query_tokens.is_empty() || chunk_tokens.is_empty() {
        return 0.0;
    }

    let chunk_set: std::collections::HashSet<&str> =
        chunk_tokens.iter().map(String::as_str).collect();
    let mut seen: std::collections::HashSet<&str> = std::collections::HashSet::new();
    let overlap = query_tokens
        .iter()
        .filter(|t| seen.insert(t.as_str()) && chunk_set.contains(t.as_str()))
        .count();

    overlap as f64 / (chunk_tokens.len() as f64).sqrt()
}
