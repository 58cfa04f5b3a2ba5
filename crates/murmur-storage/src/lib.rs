// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite data layer for the murmur agent runtime.
//!
//! One database file holds every persisted collection: key/value config,
//! the model registry, model weight blobs, memory chunks, and
//! conversation turns. The memory crate owns its own chunk queries over
//! the same [`Database`] handle.

pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;

pub use database::{map_tr_err, Database};
pub use models::{ConversationTurn, ModelRecord, ModelStatus};
