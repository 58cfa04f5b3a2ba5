// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./murmur.toml` > `~/.config/murmur/murmur.toml`
//! > `/etc/murmur/murmur.toml` with environment variable overrides via the
//! `MURMUR_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::MurmurConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/murmur/murmur.toml` (system-wide)
/// 3. `~/.config/murmur/murmur.toml` (user XDG config)
/// 4. `./murmur.toml` (local directory)
/// 5. `MURMUR_*` environment variables
pub fn load_config() -> Result<MurmurConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MurmurConfig::default()))
        .merge(Toml::file("/etc/murmur/murmur.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("murmur/murmur.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("murmur.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<MurmurConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MurmurConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<MurmurConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MurmurConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names. `MURMUR_TELEGRAM_BOT_TOKEN` must map
/// to `telegram.bot_token`, not `telegram.bot.token`.
fn env_provider() -> Env {
    Env::prefixed("MURMUR_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: MURMUR_ROUTING_PRIVACY_MODE -> "routing_privacy_mode"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("agent_", "agent.", 1)
            .replacen("routing_", "routing.", 1)
            .replacen("queue_", "queue.", 1)
            .replacen("memory_", "memory.", 1)
            .replacen("providers_", "providers.", 1)
            .replacen("gateway_", "gateway.", 1)
            .replacen("telegram_", "telegram.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("vault_", "vault.", 1)
            .to_string();
        mapped.into()
    })
}
