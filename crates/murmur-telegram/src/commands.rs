// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Slash command parsing and synchronous replies.
//!
//! The recognized set bypasses the router entirely; the gateway answers
//! them directly. Anything else starting with `/` gets the unknown-
//! command reply.

use murmur_core::StatusSnapshot;

/// Commands served without touching the router queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Clear,
    Model,
    Status,
}

/// Parse result for a message beginning with `/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedCommand {
    Known(Command),
    Unknown,
}

/// Parse a slash command from message text.
///
/// Returns `None` for ordinary messages. A `@botname` suffix on the
/// command word is tolerated, as Telegram appends one in groups.
pub fn parse(text: &str) -> Option<ParsedCommand> {
    let trimmed = text.trim();
    if !trimmed.starts_with('/') {
        return None;
    }
    let word = trimmed.split_whitespace().next().unwrap_or(trimmed);
    let word = word.split('@').next().unwrap_or(word);

    let command = match word {
        "/start" => Command::Start,
        "/help" => Command::Help,
        "/clear" => Command::Clear,
        "/model" => Command::Model,
        "/status" => Command::Status,
        _ => return Some(ParsedCommand::Unknown),
    };
    Some(ParsedCommand::Known(command))
}

/// The unknown-command reply text.
pub const UNKNOWN_REPLY: &str = "Unknown command";

/// Render the static replies; `/clear` and `/status` need runtime state
/// and are rendered by the caller.
pub fn help_text(agent_name: &str) -> String {
    format!(
        "{agent_name} commands:\n\
         /start - greet the agent\n\
         /help - this message\n\
         /clear - forget this conversation\n\
         /model - show the active model and routing mode\n\
         /status - show queue status"
    )
}

pub fn start_text(agent_name: &str) -> String {
    format!("Hello! I'm {agent_name}. Send me a message and I'll answer.")
}

pub fn model_text(local_model: Option<&str>, mode: &str) -> String {
    match local_model {
        Some(model) => format!("Local model: {model}\nRouting mode: {mode}"),
        None => format!("No local model loaded\nRouting mode: {mode}"),
    }
}

pub fn status_text(snapshot: &StatusSnapshot) -> String {
    format!(
        "Routing mode: {}\nQueued: {} (urgent {}, normal {}, background {})\nRunning: {}",
        snapshot.mode,
        snapshot.queue_len,
        snapshot.urgent_count,
        snapshot.normal_count,
        snapshot.background_count,
        snapshot
            .current
            .map(|id| id.to_string())
            .unwrap_or_else(|| "idle".to_string()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_messages_are_not_commands() {
        assert_eq!(parse("hello"), None);
        assert_eq!(parse("what about /help mid-message"), None);
        assert_eq!(parse(""), None);
    }

    #[test]
    fn known_commands_parse() {
        assert_eq!(parse("/start"), Some(ParsedCommand::Known(Command::Start)));
        assert_eq!(parse("/help"), Some(ParsedCommand::Known(Command::Help)));
        assert_eq!(parse("/clear"), Some(ParsedCommand::Known(Command::Clear)));
        assert_eq!(parse("/model"), Some(ParsedCommand::Known(Command::Model)));
        assert_eq!(parse("/status"), Some(ParsedCommand::Known(Command::Status)));
    }

    #[test]
    fn bot_suffix_and_arguments_are_tolerated() {
        assert_eq!(
            parse("/help@murmur_bot"),
            Some(ParsedCommand::Known(Command::Help))
        );
        assert_eq!(
            parse("/clear everything please"),
            Some(ParsedCommand::Known(Command::Clear))
        );
    }

    #[test]
    fn unknown_slash_commands_are_flagged() {
        assert_eq!(parse("/frobnicate"), Some(ParsedCommand::Unknown));
        assert_eq!(parse("/HELP"), Some(ParsedCommand::Unknown));
    }

    #[test]
    fn status_text_renders_snapshot() {
        let snapshot = StatusSnapshot {
            queue_len: 3,
            current: None,
            urgent_count: 1,
            normal_count: 1,
            background_count: 1,
            mode: murmur_core::RouterMode::Auto,
            executors: Default::default(),
        };
        let text = status_text(&snapshot);
        assert!(text.contains("Queued: 3"));
        assert!(text.contains("idle"));
    }
}
