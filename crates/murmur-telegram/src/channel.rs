// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared channel state: authorization, per-chat sessions, and the
//! command/task split.
//!
//! Each Telegram chat maps to a session `tg-<chat>-<epoch>`; `/clear`
//! bumps the epoch so the old conversation stops feeding context.

use std::sync::Arc;

use dashmap::DashMap;
use murmur_config::TelegramConfig;
use murmur_memory::MemoryEngine;
use murmur_router::RouterHandle;
use teloxide::prelude::*;
use teloxide::types::ChatKind;
use tracing::warn;

use crate::commands::{self, Command, ParsedCommand};
use crate::poller::to_task_request;
use crate::reply::send_reply;

/// State shared by every update handler task.
pub struct ChannelShared {
    pub bot: Bot,
    pub config: TelegramConfig,
    pub agent_name: String,
    pub local_model: Option<String>,
    pub router: RouterHandle,
    pub memory: Arc<MemoryEngine>,
    /// chat id -> session epoch, bumped by `/clear`.
    sessions: DashMap<i64, u64>,
}

impl ChannelShared {
    pub fn new(
        bot: Bot,
        config: TelegramConfig,
        agent_name: String,
        local_model: Option<String>,
        router: RouterHandle,
        memory: Arc<MemoryEngine>,
    ) -> Self {
        Self {
            bot,
            config,
            agent_name,
            local_model,
            router,
            memory,
            sessions: DashMap::new(),
        }
    }

    fn session_id(&self, chat_id: ChatId) -> String {
        let epoch = self.sessions.entry(chat_id.0).or_insert(0);
        format!("tg-{}-{}", chat_id.0, *epoch)
    }

    /// Route one text message: slash commands answer synchronously,
    /// everything else becomes a router task.
    pub async fn handle_text(&self, chat_id: ChatId, text: &str) {
        match commands::parse(text) {
            Some(ParsedCommand::Known(command)) => {
                let reply = self.run_command(command, chat_id).await;
                send_reply(&self.bot, chat_id, &reply).await;
            }
            Some(ParsedCommand::Unknown) => {
                send_reply(&self.bot, chat_id, commands::UNKNOWN_REPLY).await;
            }
            None => self.submit_and_reply(chat_id, text).await,
        }
    }

    /// Submit a task and deliver its final text.
    pub async fn submit_and_reply(&self, chat_id: ChatId, text: &str) {
        let session = self.session_id(chat_id);
        match self
            .router
            .submit_and_wait(to_task_request(&session, text), None)
            .await
        {
            Ok(response) => send_reply(&self.bot, chat_id, &response).await,
            Err(e) => {
                warn!(chat_id = chat_id.0, error = %e, "task failed");
                send_reply(&self.bot, chat_id, &format!("Sorry, that failed: {e}")).await;
            }
        }
    }

    async fn run_command(&self, command: Command, chat_id: ChatId) -> String {
        match command {
            Command::Start => commands::start_text(&self.agent_name),
            Command::Help => commands::help_text(&self.agent_name),
            Command::Model => {
                let mode = match self.router.status().await {
                    Ok(snapshot) => snapshot.mode.to_string(),
                    Err(_) => "unknown".to_string(),
                };
                commands::model_text(self.local_model.as_deref(), &mode)
            }
            Command::Status => match self.router.status().await {
                Ok(snapshot) => commands::status_text(&snapshot),
                Err(e) => format!("Status unavailable: {e}"),
            },
            Command::Clear => {
                let old_session = self.session_id(chat_id);
                if let Some(mut epoch) = self.sessions.get_mut(&chat_id.0) {
                    *epoch += 1;
                }
                match self.memory.clear_session(&old_session).await {
                    Ok(removed) => {
                        format!("Conversation cleared ({removed} turns forgotten).")
                    }
                    Err(e) => {
                        warn!(error = %e, "failed to clear session");
                        "Conversation reset.".to_string()
                    }
                }
            }
        }
    }
}

/// True for private (DM) chats; groups and channels are ignored.
pub fn is_dm(msg: &Message) -> bool {
    matches!(msg.chat.kind, ChatKind::Private(_))
}

/// Whether the sender may talk to the agent.
///
/// Matches the sender's numeric ID or username (with or without `@`)
/// against the allow-list. An empty list rejects everyone.
pub fn is_authorized(msg: &Message, allowed_users: &[String]) -> bool {
    if allowed_users.is_empty() {
        return false;
    }

    let Some(user) = msg.from.as_ref() else {
        return false;
    };
    let user_id = user.id.0.to_string();

    allowed_users.iter().any(|allowed| {
        if *allowed == user_id {
            return true;
        }
        match &user.username {
            Some(username) => {
                let allowed = allowed.strip_prefix('@').unwrap_or(allowed);
                username.eq_ignore_ascii_case(allowed)
            }
            None => false,
        }
    })
}
