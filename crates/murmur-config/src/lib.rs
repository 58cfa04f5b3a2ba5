// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered TOML configuration for the murmur agent runtime.
//!
//! Configuration merges compiled defaults, system and user TOML files, and
//! `MURMUR_*` environment variables. Unknown keys are rejected.

pub mod loader;
pub mod model;

pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{
    AgentConfig, GatewayConfig, MemoryConfig, MurmurConfig, ProvidersConfig,
    QueueConfig, RoutingConfig, StorageConfig, TelegramConfig, VaultConfig,
};
