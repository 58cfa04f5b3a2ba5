// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Uniform contract over heterogeneous cloud model APIs.
//!
//! Each provider is a [`ProviderDescriptor`]: a plain record of callables
//! describing its endpoint shape, auth header, request envelope, and
//! streaming frame format. [`ProviderClient`] executes any descriptor;
//! [`ProviderGateway`] binds the registry to a credential bundle and a
//! default model and implements the router's `CloudDispatcher` seam.

pub mod client;
pub mod descriptor;
pub mod gateway;
pub mod registry;

pub use client::ProviderClient;
pub use descriptor::{ModelInfo, ProviderDescriptor, StreamFrame};
pub use gateway::ProviderGateway;
