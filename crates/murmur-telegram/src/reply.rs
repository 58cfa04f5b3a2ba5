// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound message delivery with length-limit splitting.
//!
//! The Bot API caps messages at 4096 characters. Longer responses split
//! at paragraph or word boundaries where possible.

use teloxide::prelude::*;
use tracing::warn;

/// Bot API hard limit on message length.
pub const MAX_MESSAGE_LEN: usize = 4096;

/// Split a response into sendable pieces.
///
/// Splits prefer the last newline before the limit, then the last space,
/// then a hard cut at a char boundary.
pub fn split_message(text: &str) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut rest = text;

    while rest.chars().count() > MAX_MESSAGE_LEN {
        let hard_cut: usize = rest
            .char_indices()
            .nth(MAX_MESSAGE_LEN)
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        let window = &rest[..hard_cut];

        let cut = window
            .rfind('\n')
            .or_else(|| window.rfind(' '))
            .filter(|&i| i > 0)
            .unwrap_or(hard_cut);

        pieces.push(rest[..cut].trim_end().to_string());
        rest = rest[cut..].trim_start();
    }

    if !rest.is_empty() {
        pieces.push(rest.to_string());
    }
    pieces
}

/// Send a (possibly long) reply, splitting as needed. Delivery failures
/// are logged, not propagated; the task already completed.
pub async fn send_reply(bot: &Bot, chat_id: ChatId, text: &str) {
    let pieces = split_message(text);
    if pieces.is_empty() {
        return;
    }
    for piece in pieces {
        if let Err(e) = bot.send_message(chat_id, piece).await {
            warn!(chat_id = chat_id.0, error = %e, "failed to send reply");
            return;
        }
    }
}
