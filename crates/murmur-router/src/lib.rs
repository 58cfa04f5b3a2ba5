// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Task routing for the murmur agent runtime.
//!
//! This crate provides:
//! - [`scoring`]: zero-cost heuristic complexity scoring, flag derivation,
//!   and the LOCAL-vs-CLOUD route decision
//! - [`queue::TaskQueue`]: a bounded three-tier priority queue
//! - [`Router`]/[`RouterHandle`]: the scheduling loop that admits,
//!   dispatches, preempts, and streams tasks, observable through a
//!   broadcast event bus

pub mod queue;
pub mod scheduler;
pub mod scoring;

pub use queue::{Admitted, TaskQueue};
pub use scheduler::{Executors, Router, RouterHandle};
pub use scoring::{decide_route, derive_priority, score, score_complexity};
