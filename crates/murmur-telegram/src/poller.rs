// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The getUpdates long-poll loop.
//!
//! Polls the Bot API with a monotonically-increasing offset cursor,
//! normalizes messages / voice notes / callback queries into router
//! tasks, and sends the final response text back. Each update is handled
//! in its own task so a slow completion never stalls the cursor.

use std::sync::Arc;

use murmur_core::TaskRequest;
use teloxide::net::Download;
use teloxide::payloads::GetUpdatesSetters;
use teloxide::prelude::*;
use teloxide::types::{FileMeta, UpdateKind, Voice};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::channel::ChannelShared;
use crate::reply::send_reply;

/// Server-side long-poll timeout, seconds.
const POLL_TIMEOUT_SECS: u32 = 30;
/// Back-off after a failed getUpdates round.
const ERROR_BACKOFF_SECS: u64 = 5;

/// Run the polling loop until shutdown.
pub async fn run(shared: Arc<ChannelShared>, shutdown: CancellationToken) {
    let mut offset: i32 = 0;
    let poll_interval = std::time::Duration::from_secs(shared.config.poll_interval_secs);

    loop {
        let updates = tokio::select! {
            _ = shutdown.cancelled() => break,
            result = shared
                .bot
                .get_updates()
                .offset(offset)
                .timeout(POLL_TIMEOUT_SECS) => result,
        };

        match updates {
            Ok(updates) => {
                for update in updates {
                    offset = offset.max(update.id.0 as i32 + 1);
                    let shared = Arc::clone(&shared);
                    tokio::spawn(async move {
                        handle_update(shared, update.kind).await;
                    });
                }
            }
            Err(e) => {
                warn!(error = %e, "getUpdates failed, backing off");
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = tokio::time::sleep(std::time::Duration::from_secs(ERROR_BACKOFF_SECS)) => {}
                }
                continue;
            }
        }

        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep(poll_interval) => {}
        }
    }
    debug!("telegram poll loop stopped");
}

async fn handle_update(shared: Arc<ChannelShared>, kind: UpdateKind) {
    match kind {
        UpdateKind::Message(message) => {
            if !crate::channel::is_dm(&message) {
                debug!(chat_id = message.chat.id.0, "ignoring non-DM message");
                return;
            }
            if !crate::channel::is_authorized(&message, &shared.config.allowed_users) {
                debug!(chat_id = message.chat.id.0, "ignoring unauthorized user");
                return;
            }

            if let Some(text) = message.text() {
                let text = text.to_string();
                shared.handle_text(message.chat.id, &text).await;
            } else if let Some(voice) = message.voice() {
                match voice_task_text(&shared.bot, voice).await {
                    Ok(text) => shared.handle_text(message.chat.id, &text).await,
                    Err(e) => {
                        warn!(error = %e, "failed to ingest voice message");
                        send_reply(&shared.bot, message.chat.id, "Could not read that voice message.")
                            .await;
                    }
                }
            } else {
                debug!(msg_id = message.id.0, "ignoring unsupported message type");
            }
        }
        UpdateKind::CallbackQuery(query) => {
            let Some(chat_id) = query.message.as_ref().map(|m| m.chat().id) else {
                return;
            };
            let payload = query.data.unwrap_or_default();
            let text = format!("[CALLBACK:{payload}]");
            shared.submit_and_reply(chat_id, &text).await;
        }
        _ => {}
    }
}

/// Download a voice note and render it as a task payload.
///
/// The local engine contract takes text prompts, so the audio travels as
/// a marker carrying duration and size; the bytes themselves stay with
/// the channel.
async fn voice_task_text(bot: &Bot, voice: &Voice) -> Result<String, String> {
    let data = download_file(bot, &voice.file).await?;
    Ok(format!(
        "[VOICE:{}s,{}B]",
        voice.duration.seconds(),
        data.len()
    ))
}

/// Resolve and download a file from the Bot API.
async fn download_file(bot: &Bot, file_meta: &FileMeta) -> Result<Vec<u8>, String> {
    let file = bot
        .get_file(file_meta.id.clone())
        .await
        .map_err(|e| format!("failed to get file info: {e}"))?;

    let mut buf = Vec::new();
    bot.download_file(&file.path, &mut buf)
        .await
        .map_err(|e| format!("failed to download file: {e}"))?;

    debug!(file_id = %file_meta.id, size = buf.len(), "downloaded voice file");
    Ok(buf)
}

/// Build the router request for one normalized chat message.
pub fn to_task_request(session_id: &str, text: &str) -> TaskRequest {
    TaskRequest {
        channel: "telegram".to_string(),
        user: session_id.to_string(),
        text: text.to_string(),
        metadata: Default::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_request_is_normalized() {
        let req = to_task_request("tg-42-0", "hello");
        assert_eq!(req.channel, "telegram");
        assert_eq!(req.user, "tg-42-0");
        assert_eq!(req.text, "hello");
    }

    #[test]
    fn callback_payload_rendering() {
        let text = format!("[CALLBACK:{}]", "confirm_delete");
        assert_eq!(text, "[CALLBACK:confirm_delete]");
    }
}
