// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider descriptors.
//!
//! Each cloud API is described by a plain record of callables rather than
//! a trait hierarchy: how to build the URL, the auth headers, the request
//! envelope, and how to read one streaming frame back. The set of
//! providers stays open; adding one is adding a record.

use murmur_core::ChatMessage;

/// One decoded streaming frame: a token, an end-of-stream marker, or both.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StreamFrame {
    /// The stream is complete; no further frames follow.
    pub done: bool,
    /// Token text carried by this frame, if any.
    pub token: Option<String>,
}

impl StreamFrame {
    pub fn token(text: impl Into<String>) -> Self {
        Self {
            done: false,
            token: Some(text.into()),
        }
    }

    pub fn done() -> Self {
        Self {
            done: true,
            token: None,
        }
    }
}

/// A model as reported by a provider's listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
    pub provider: String,
}

/// Static description of how to talk to one cloud model API.
#[derive(Clone, Copy)]
pub struct ProviderDescriptor {
    /// Stable registry key, e.g. "openai".
    pub id: &'static str,
    /// Human-readable name.
    pub label: &'static str,
    pub base_url: &'static str,
    /// Auth and version headers derived from the credential. Providers
    /// that authenticate in the URL return an empty set.
    pub headers: fn(credential: &str) -> Vec<(&'static str, String)>,
    /// Chat endpoint URL for a model. `stream` selects the streaming
    /// variant where the provider distinguishes them.
    pub chat_url: fn(base_url: &str, model: &str, credential: &str, stream: bool) -> String,
    /// Model listing URL, if the provider can list models.
    pub models_url: fn(base_url: &str, credential: &str) -> Option<String>,
    /// Request envelope from the normalized transcript.
    pub build_request:
        fn(model: &str, messages: &[ChatMessage], stream: bool) -> serde_json::Value,
    /// Decode one SSE frame. `None` means the frame carries nothing of
    /// interest (or is malformed) and is skipped without aborting.
    pub parse_frame: fn(event: &str, data: &str) -> Option<StreamFrame>,
    /// Extract the full completion text from a non-streaming response.
    pub parse_response: fn(body: &serde_json::Value) -> Option<String>,
    /// Normalize the model listing response.
    pub parse_models: fn(body: &serde_json::Value) -> Vec<ModelInfo>,
}

impl std::fmt::Debug for ProviderDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderDescriptor")
            .field("id", &self.id)
            .field("base_url", &self.base_url)
            .finish()
    }
}
