// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Built-in provider descriptors.
//!
//! Three wire shapes are covered:
//! - OpenAI-compatible: Bearer auth, `choices[].delta`, `data: [DONE]`
//!   sentinel. Also serves Groq, Mistral, and other lookalike APIs.
//! - Anthropic: `x-api-key` auth, out-of-band `system` slot, named SSE
//!   events ending in `message_stop`.
//! - Gemini: key-in-query auth, `contents`/`systemInstruction` envelope,
//!   stream ends with the transport.

use murmur_core::{ChatMessage, MurmurError, Role};
use serde_json::json;

use crate::descriptor::{ModelInfo, ProviderDescriptor, StreamFrame};

static DESCRIPTORS: [ProviderDescriptor; 3] = [OPENAI, ANTHROPIC, GEMINI];

/// All compiled-in descriptors.
pub fn descriptors() -> &'static [ProviderDescriptor] {
    &DESCRIPTORS
}

/// Look a descriptor up by ID.
pub fn get(id: &str) -> Result<&'static ProviderDescriptor, MurmurError> {
    descriptors()
        .iter()
        .find(|d| d.id == id)
        .ok_or_else(|| MurmurError::UnknownProvider(id.to_string()))
}

// --- OpenAI ---

pub const OPENAI: ProviderDescriptor = ProviderDescriptor {
    id: "openai",
    label: "OpenAI",
    base_url: "https://api.openai.com/v1",
    headers: |credential| vec![("authorization", format!("Bearer {credential}"))],
    chat_url: |base, _model, _credential, _stream| format!("{base}/chat/completions"),
    models_url: |base, _credential| Some(format!("{base}/models")),
    build_request: |model, messages, stream| {
        json!({
            "model": model,
            "messages": messages
                .iter()
                .map(|m| json!({"role": m.role.to_string(), "content": m.content}))
                .collect::<Vec<_>>(),
            "stream": stream,
        })
    },
    parse_frame: |_event, data| {
        if data.trim() == "[DONE]" {
            return Some(StreamFrame::done());
        }
        let value: serde_json::Value = serde_json::from_str(data).ok()?;
        let token = value
            .get("choices")?
            .get(0)?
            .get("delta")?
            .get("content")?
            .as_str()?;
        Some(StreamFrame::token(token))
    },
    parse_response: |body| {
        body.get("choices")?
            .get(0)?
            .get("message")?
            .get("content")?
            .as_str()
            .map(String::from)
    },
    parse_models: |body| {
        body.get("data")
            .and_then(|d| d.as_array())
            .map(|models| {
                models
                    .iter()
                    .filter_map(|m| m.get("id").and_then(|id| id.as_str()))
                    .map(|id| ModelInfo {
                        id: id.to_string(),
                        name: id.to_string(),
                        provider: "openai".to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    },
};

// --- Anthropic ---

pub const ANTHROPIC: ProviderDescriptor = ProviderDescriptor {
    id: "anthropic",
    label: "Anthropic",
    base_url: "https://api.anthropic.com",
    headers: |credential| {
        vec![
            ("x-api-key", credential.to_string()),
            ("anthropic-version", "2023-06-01".to_string()),
        ]
    },
    chat_url: |base, _model, _credential, _stream| format!("{base}/v1/messages"),
    models_url: |base, _credential| Some(format!("{base}/v1/models")),
    build_request: |model, messages, stream| {
        // The Messages API takes no system role inline; the first system
        // message moves to the out-of-band slot.
        let system = messages
            .iter()
            .find(|m| m.role == Role::System)
            .map(|m| m.content.clone());
        let turns: Vec<_> = messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| json!({"role": m.role.to_string(), "content": m.content}))
            .collect();

        let mut request = json!({
            "model": model,
            "messages": turns,
            "max_tokens": 1024,
            "stream": stream,
        });
        if let Some(system) = system {
            request["system"] = json!(system);
        }
        request
    },
    parse_frame: |event, data| match event {
        "content_block_delta" => {
            let value: serde_json::Value = serde_json::from_str(data).ok()?;
            let delta = value.get("delta")?;
            if delta.get("type")?.as_str()? != "text_delta" {
                return None;
            }
            Some(StreamFrame::token(delta.get("text")?.as_str()?))
        }
        "message_stop" => Some(StreamFrame::done()),
        _ => None,
    },
    parse_response: |body| {
        body.get("content")?
            .get(0)?
            .get("text")?
            .as_str()
            .map(String::from)
    },
    parse_models: |body| {
        body.get("data")
            .and_then(|d| d.as_array())
            .map(|models| {
                models
                    .iter()
                    .filter_map(|m| {
                        let id = m.get("id")?.as_str()?;
                        let name = m
                            .get("display_name")
                            .and_then(|n| n.as_str())
                            .unwrap_or(id);
                        Some(ModelInfo {
                            id: id.to_string(),
                            name: name.to_string(),
                            provider: "anthropic".to_string(),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default()
    },
};

// --- Gemini ---

pub const GEMINI: ProviderDescriptor = ProviderDescriptor {
    id: "gemini",
    label: "Google Gemini",
    base_url: "https://generativelanguage.googleapis.com/v1beta",
    // Authentication rides in the URL query, not a header.
    headers: |_credential| vec![],
    chat_url: |base, model, credential, stream| {
        let verb = if stream {
            "streamGenerateContent?alt=sse&"
        } else {
            "generateContent?"
        };
        format!("{base}/models/{model}:{verb}key={credential}")
    },
    models_url: |base, credential| Some(format!("{base}/models?key={credential}")),
    build_request: |_model, messages, _stream| {
        let system = messages
            .iter()
            .find(|m| m.role == Role::System)
            .map(|m| m.content.clone());
        let contents: Vec<_> = messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| {
                let role = match m.role {
                    Role::Assistant => "model",
                    _ => "user",
                };
                json!({"role": role, "parts": [{"text": m.content}]})
            })
            .collect();

        let mut request = json!({ "contents": contents });
        if let Some(system) = system {
            request["systemInstruction"] = json!({"parts": [{"text": system}]});
        }
        request
    },
    parse_frame: |_event, data| {
        let value: serde_json::Value = serde_json::from_str(data).ok()?;
        let parts = value
            .get("candidates")?
            .get(0)?
            .get("content")?
            .get("parts")?
            .as_array()?;
        let text: String = parts
            .iter()
            .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
            .collect();
        if text.is_empty() {
            None
        } else {
            Some(StreamFrame::token(text))
        }
    },
    parse_response: |body| {
        let parts = body
            .get("candidates")?
            .get(0)?
            .get("content")?
            .get("parts")?
            .as_array()?;
        let text: String = parts
            .iter()
            .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
            .collect();
        Some(text)
    },
    parse_models: |body| {
        body.get("models")
            .and_then(|d| d.as_array())
            .map(|models| {
                models
                    .iter()
                    .filter_map(|m| {
                        let id = m.get("name")?.as_str()?;
                        let id = id.strip_prefix("models/").unwrap_or(id);
                        let name = m
                            .get("displayName")
                            .and_then(|n| n.as_str())
                            .unwrap_or(id);
                        Some(ModelInfo {
                            id: id.to_string(),
                            name: name.to_string(),
                            provider: "gemini".to_string(),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default()
    },
};
