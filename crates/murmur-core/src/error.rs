// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the murmur agent runtime.

use thiserror::Error;

use crate::types::Route;

/// The primary error type used across all murmur subsystems.
#[derive(Debug, Error)]
pub enum MurmurError {
    /// Queue at capacity with no BACKGROUND victim; submission rejected.
    #[error("task queue is full")]
    QueueFull,

    /// The chosen route has no backing executor. The task fails; it is
    /// never silently rerouted.
    #[error("no executor available for {route} route")]
    NoExecutorAvailable { route: Route },

    /// Credential decryption failed authentication (wrong passphrase or
    /// tampered envelope).
    #[error("invalid passphrase")]
    InvalidPassphrase,

    /// Credential vault failures other than authentication (cipher
    /// setup, nonce or salt generation).
    #[error("credential vault error: {0}")]
    Vault(String),

    /// Upstream model API returned a failure.
    #[error("provider {provider} error ({status}): {message}")]
    Provider {
        provider: String,
        status: u16,
        message: String,
    },

    /// Provider ID not present in the descriptor registry.
    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    /// Model ID not present in the model registry.
    #[error("unknown model: {0}")]
    UnknownModel(String),

    /// A stored chunk's fingerprint does not match its text.
    #[error("memory integrity failure for chunk {key}")]
    MemoryIntegrity { key: String },

    /// Per-request wall-clock timeout expired.
    #[error("request timed out after {duration:?}")]
    RequestTimeout { duration: std::time::Duration },

    /// Cooperative cancellation.
    #[error("cancelled")]
    Cancelled,

    /// Configuration errors (invalid TOML, missing required fields).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Channel errors (HTTP bind failure, bot API failure, message format).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_carry_context() {
        let err = MurmurError::NoExecutorAvailable { route: Route::Local };
        assert_eq!(err.to_string(), "no executor available for local route");

        let err = MurmurError::Provider {
            provider: "openai".into(),
            status: 429,
            message: "rate limited".into(),
        };
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("openai"));

        let err = MurmurError::MemoryIntegrity {
            key: "doc_chunk_0".into(),
        };
        assert!(err.to_string().contains("doc_chunk_0"));
    }

    #[test]
    fn queue_full_is_terse() {
        assert_eq!(MurmurError::QueueFull.to_string(), "task queue is full");
    }
}
