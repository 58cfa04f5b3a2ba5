// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules, one per persisted collection.

pub mod config;
pub mod models;
pub mod turns;
pub mod weights;
