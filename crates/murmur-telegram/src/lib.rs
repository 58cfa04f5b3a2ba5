// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram channel for the murmur agent runtime.
//!
//! Runs a getUpdates long-poll loop against the Bot API, normalizes
//! text, voice, and callback-query updates into router tasks, and sends
//! the completed response text back. A bounded set of slash commands
//! (`/start /help /clear /model /status`) is served synchronously
//! without entering the router queue.

pub mod channel;
pub mod commands;
pub mod poller;
pub mod reply;

use std::sync::Arc;

use murmur_config::TelegramConfig;
use murmur_core::MurmurError;
use murmur_memory::MemoryEngine;
use murmur_router::RouterHandle;
use teloxide::Bot;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::channel::ChannelShared;

/// The Telegram channel. Construct, then [`TelegramChannel::spawn`] the
/// poll loop.
pub struct TelegramChannel {
    shared: Arc<ChannelShared>,
}

impl TelegramChannel {
    /// Create the channel. Requires `config.bot_token`.
    pub fn new(
        config: TelegramConfig,
        agent_name: String,
        local_model: Option<String>,
        router: RouterHandle,
        memory: Arc<MemoryEngine>,
    ) -> Result<Self, MurmurError> {
        let token = config.bot_token.as_deref().ok_or_else(|| {
            MurmurError::Config("telegram.bot_token is required for the Telegram channel".into())
        })?;
        if token.is_empty() {
            return Err(MurmurError::Config(
                "telegram.bot_token cannot be empty".into(),
            ));
        }

        let bot = Bot::new(token);
        Ok(Self {
            shared: Arc::new(ChannelShared::new(
                bot,
                config,
                agent_name,
                local_model,
                router,
                memory,
            )),
        })
    }

    /// Start the long-poll loop; it stops when the token fires.
    pub fn spawn(&self, shutdown: CancellationToken) -> tokio::task::JoinHandle<()> {
        info!("starting Telegram long polling");
        let shared = Arc::clone(&self.shared);
        tokio::spawn(poller::run(shared, shutdown))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use murmur_config::{MemoryConfig, QueueConfig, RoutingConfig};
    use murmur_core::ExecutorStatus;
    use murmur_router::{Executors, Router};
    use murmur_storage::Database;

    #[tokio::test]
    async fn missing_token_is_a_config_error() {
        let db = Database::open_in_memory().await.unwrap();
        let memory = MemoryEngine::new(db, MemoryConfig::default()).await.unwrap();
        let router = Router::spawn(
            RoutingConfig::default(),
            &QueueConfig::default(),
            memory.clone(),
            Executors::default(),
            ExecutorStatus::default(),
            CancellationToken::new(),
        );

        let result = TelegramChannel::new(
            TelegramConfig::default(),
            "murmur".to_string(),
            None,
            router,
            memory,
        );
        let err = match result {
            Ok(_) => panic!("expected construction to fail"),
            Err(e) => e,
        };
        assert!(matches!(err, MurmurError::Config(_)));
    }
}
