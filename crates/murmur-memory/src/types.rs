// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Memory domain types.

use std::collections::HashMap;

use crate::fingerprint;

/// A bounded, content-addressed slice of a document.
///
/// Chunks are immutable after creation; they disappear only through
/// `clear_document` or a full wipe.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryChunk {
    /// Unique key, `<doc_id>_chunk_<i>`.
    pub key: String,
    pub doc_id: String,
    /// Ordinal position within the source document.
    pub index: usize,
    pub text: String,
    /// First 16 bytes of SHA-256 over the text, big-endian.
    pub fingerprint: u128,
    pub metadata: HashMap<String, serde_json::Value>,
    /// Creation time, milliseconds since the Unix epoch.
    pub created_at_ms: i64,
}

impl MemoryChunk {
    /// Build a chunk from its text, computing key and fingerprint.
    pub fn new(
        doc_id: &str,
        index: usize,
        text: String,
        metadata: HashMap<String, serde_json::Value>,
        created_at_ms: i64,
    ) -> Self {
        Self {
            key: format!("{doc_id}_chunk_{index}"),
            doc_id: doc_id.to_string(),
            index,
            fingerprint: fingerprint::fingerprint(&text),
            text,
            metadata,
            created_at_ms,
        }
    }

    /// The chunk's `title` metadata entry, if it is a string.
    pub fn title(&self) -> Option<&str> {
        self.metadata.get("title").and_then(|v| v.as_str())
    }

    /// Recompute the fingerprint from the stored text and compare.
    pub fn verify(&self) -> bool {
        fingerprint::fingerprint(&self.text) == self.fingerprint
    }
}

/// One chunk that failed integrity verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrityFault {
    pub key: String,
    /// Fingerprint on record, hex form.
    pub stored: String,
    /// Fingerprint recomputed from the stored text, hex form.
    pub computed: String,
}

/// Result of a full-store integrity sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifyReport {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
    pub errors: Vec<IntegrityFault>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_chunk_derives_key_and_fingerprint() {
        let chunk = MemoryChunk::new("doc", 2, "Some text.".into(), HashMap::new(), 0);
        assert_eq!(chunk.key, "doc_chunk_2");
        assert_eq!(chunk.fingerprint, fingerprint::fingerprint("Some text."));
        assert!(chunk.verify());
    }

    #[test]
    fn verify_detects_divergence() {
        let mut chunk = MemoryChunk::new("doc", 0, "original".into(), HashMap::new(), 0);
        chunk.text = "tampered".into();
        assert!(!chunk.verify());
    }

    #[test]
    fn title_reads_string_metadata_only() {
        let mut meta = HashMap::new();
        meta.insert("title".to_string(), serde_json::json!("Release notes"));
        let chunk = MemoryChunk::new("doc", 0, "t".into(), meta, 0);
        assert_eq!(chunk.title(), Some("Release notes"));

        let mut meta = HashMap::new();
        meta.insert("title".to_string(), serde_json::json!(42));
        let chunk = MemoryChunk::new("doc", 0, "t".into(), meta, 0);
        assert_eq!(chunk.title(), None);
    }
}
