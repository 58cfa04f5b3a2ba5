// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Executor contracts at the router's dispatch seam.

pub mod executor;

pub use executor::{CloudDispatcher, InferenceEngine, TokenStream};
