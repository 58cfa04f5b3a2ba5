// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Long-term memory for the murmur agent runtime.
//!
//! Text is chunked on sentence boundaries, content-addressed with a
//! 128-bit SHA-256 prefix fingerprint, and persisted in SQLite. Retrieval
//! is keyword-weighted (TF-IDF with verbatim and title boosts) with a
//! set-overlap fallback before the index exists. The engine also records
//! conversation turns and verifies chunk integrity on demand.

pub mod cache;
pub mod chunker;
pub mod engine;
pub mod fingerprint;
pub mod retrieval;
pub mod store;
pub mod types;

pub use engine::MemoryEngine;
pub use types::{IntegrityFault, MemoryChunk, VerifyReport};
