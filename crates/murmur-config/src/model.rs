// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the murmur agent runtime.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use murmur_core::types::RouterMode;
use serde::{Deserialize, Serialize};

/// Top-level murmur configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MurmurConfig {
    /// Agent identity and behavior settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Routing mode, threshold, and privacy settings.
    #[serde(default)]
    pub routing: RoutingConfig,

    /// Task queue admission settings.
    #[serde(default)]
    pub queue: QueueConfig,

    /// Memory chunking and retrieval settings.
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Cloud provider settings.
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// HTTP gateway settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Telegram bot integration settings.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Credential vault settings.
    #[serde(default)]
    pub vault: VaultConfig,
}

/// Agent identity and behavior configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the agent.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_agent_name() -> String {
    "murmur".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Routing configuration swapped atomically into the router.
///
/// A scoring decision always sees one consistent record; partial updates
/// are not possible.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RoutingConfig {
    /// Routing mode: auto (threshold-based), local, or cloud.
    #[serde(default)]
    pub mode: RouterMode,

    /// Complexity threshold for cloud routing in auto mode, `[0, 10]`.
    #[serde(default = "default_threshold")]
    pub threshold: u8,

    /// Force every task onto the local route regardless of message content.
    #[serde(default)]
    pub privacy_mode: bool,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            mode: RouterMode::Auto,
            threshold: default_threshold(),
            privacy_mode: false,
        }
    }
}

fn default_threshold() -> u8 {
    6
}

/// Task queue admission configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QueueConfig {
    /// Maximum queued tasks before backpressure applies.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Which BACKGROUND task to evict on overflow. Only "oldest" is
    /// recognized.
    #[serde(default = "default_victim_policy")]
    pub background_victim_policy: String,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            background_victim_policy: default_victim_policy(),
        }
    }
}

fn default_max_depth() -> usize {
    50
}

fn default_victim_policy() -> String {
    "oldest".to_string()
}

/// Memory chunking and retrieval configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryConfig {
    /// Target chunk size in words.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Number of chunks returned by retrieval.
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Minimum retrieval score; lower-scoring chunks are discarded.
    #[serde(default = "default_min_score")]
    pub min_score: f64,

    /// Capacity of the in-memory recency cache, in chunks.
    #[serde(default = "default_cache_size")]
    pub cache_size: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            top_k: default_top_k(),
            min_score: default_min_score(),
            cache_size: default_cache_size(),
        }
    }
}

fn default_chunk_size() -> usize {
    300
}

fn default_top_k() -> usize {
    8
}

fn default_min_score() -> f64 {
    0.1
}

fn default_cache_size() -> usize {
    128
}

/// Cloud provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProvidersConfig {
    /// Provider used when a task routes to the cloud.
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Model requested from the default provider.
    #[serde(default = "default_cloud_model")]
    pub default_model: String,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            default_provider: default_provider(),
            default_model: default_cloud_model(),
        }
    }
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_cloud_model() -> String {
    "gpt-4o-mini".to_string()
}

/// HTTP gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Per-request wall-clock timeout in seconds. `None` disables it.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: None,
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3900
}

/// Telegram bot integration configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// Telegram Bot API token. `None` disables the Telegram channel.
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Allowed user IDs or usernames. Empty list rejects everyone.
    #[serde(default)]
    pub allowed_users: Vec<String>,

    /// Seconds between long-poll rounds.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

fn default_poll_interval() -> u64 {
    2
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    "murmur.db".to_string()
}

fn default_wal_mode() -> bool {
    true
}

/// Credential vault configuration.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VaultConfig {
    /// PBKDF2-HMAC-SHA256 iteration count.
    #[serde(default = "default_kdf_iterations")]
    pub kdf_iterations: u32,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            kdf_iterations: default_kdf_iterations(),
        }
    }
}

fn default_kdf_iterations() -> u32 {
    100_000
}
