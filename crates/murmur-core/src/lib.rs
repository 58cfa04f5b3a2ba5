// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the murmur agent runtime.
//!
//! This crate provides the foundational error taxonomy, task and event
//! types, and the executor contracts shared by every other crate in the
//! workspace. It deliberately has no I/O dependencies of its own.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::MurmurError;
pub use traits::{CloudDispatcher, InferenceEngine, TokenStream};
pub use types::{
    CancelOutcome, ChatMessage, DropReason, ExecutorStatus, Priority, Role, Route,
    RouterMode, StatusSnapshot, SubmitAck, Task, TaskEvent, TaskId, TaskProfile,
    TaskRequest,
};
