// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for the murmur workspace.
//!
//! Provides mock executors implementing the runtime's executor contracts
//! and a [`TestHarness`] that wires temp SQLite, the memory engine, and a
//! live router for fast, CI-runnable end-to-end tests.

pub mod harness;
pub mod mock_engine;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_engine::{MockCloud, MockEngine};
