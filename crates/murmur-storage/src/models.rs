// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row structs for the persisted collections.

use strum::{Display, EnumString};

/// A single conversation turn within a (channel, session) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationTurn {
    /// Unique key, `<session_id>_<timestamp>`.
    pub key: String,
    pub channel: String,
    pub session_id: String,
    /// "user" or "assistant".
    pub role: String,
    pub content: String,
    /// Milliseconds since the Unix epoch. Non-decreasing within a
    /// (channel, session) pair.
    pub timestamp_ms: i64,
}

/// Download lifecycle of a curated model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ModelStatus {
    Pending,
    Downloading,
    Paused,
    Completed,
    Error,
    Cancelled,
}

/// Metadata for one curated model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRecord {
    pub id: String,
    pub name: String,
    pub category: Option<String>,
    pub size_bytes: Option<i64>,
    pub status: ModelStatus,
    /// Download progress in `[0, 100]`.
    pub progress: f64,
    pub downloaded_at: Option<String>,
    pub is_active: bool,
}

impl ModelRecord {
    /// A fresh registry entry in the pending state.
    pub fn pending(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: None,
            size_bytes: None,
            status: ModelStatus::Pending,
            progress: 0.0,
            downloaded_at: None,
            is_active: false,
        }
    }
}
