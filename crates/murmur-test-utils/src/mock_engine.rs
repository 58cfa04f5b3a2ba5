// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock executors for deterministic testing.
//!
//! [`MockEngine`] implements the local `InferenceEngine` contract and
//! [`MockCloud`] the `CloudDispatcher` contract, both replaying
//! pre-configured responses as word-token streams. Responses pop from a
//! FIFO queue; an empty queue falls back to a default text.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use murmur_core::{ChatMessage, CloudDispatcher, InferenceEngine, MurmurError, TokenStream};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

const DEFAULT_RESPONSE: &str = "mock response";

/// Split a response into streamable tokens whose concatenation is the
/// original text.
fn tokens_of(text: &str) -> Vec<String> {
    if text.is_empty() {
        return vec![];
    }
    text.split_inclusive(' ').map(str::to_string).collect()
}

/// Stream scripted tokens with an optional delay, stopping on cancel.
fn scripted_stream(
    tokens: Vec<String>,
    delay: Duration,
    cancel: CancellationToken,
) -> TokenStream {
    let state = (tokens.into_iter(), delay, cancel);
    let stream = futures::stream::unfold(state, |(mut tokens, delay, cancel)| async move {
        if cancel.is_cancelled() {
            return None;
        }
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if cancel.is_cancelled() {
            return None;
        }
        tokens
            .next()
            .map(|t| (Ok::<_, MurmurError>(t), (tokens, delay, cancel)))
    });
    Box::pin(stream)
}

/// A mock local inference engine.
pub struct MockEngine {
    responses: Arc<Mutex<VecDeque<String>>>,
    token_delay: Duration,
    model: String,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::with_responses(vec![])
    }

    /// Pre-load a FIFO queue of responses.
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::from(responses))),
            token_delay: Duration::ZERO,
            model: "mock-local".to_string(),
        }
    }

    /// Delay between emitted tokens, for tests that need a task to stay
    /// running long enough to be preempted or cancelled.
    pub fn with_token_delay(mut self, delay: Duration) -> Self {
        self.token_delay = delay;
        self
    }

    /// Append a response to the queue.
    pub async fn add_response(&self, text: String) {
        self.responses.lock().await.push_back(text);
    }

    async fn next_response(&self) -> String {
        self.responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| DEFAULT_RESPONSE.to_string())
    }
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InferenceEngine for MockEngine {
    async fn generate(
        &self,
        _prompt: &str,
        cancel: CancellationToken,
    ) -> Result<TokenStream, MurmurError> {
        let text = self.next_response().await;
        Ok(scripted_stream(tokens_of(&text), self.token_delay, cancel))
    }

    fn model_id(&self) -> Option<String> {
        Some(self.model.clone())
    }
}

/// A mock cloud dispatcher with the same replay semantics.
pub struct MockCloud {
    responses: Arc<Mutex<VecDeque<String>>>,
    token_delay: Duration,
}

impl MockCloud {
    pub fn new() -> Self {
        Self::with_responses(vec![])
    }

    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::from(responses))),
            token_delay: Duration::ZERO,
        }
    }

    pub fn with_token_delay(mut self, delay: Duration) -> Self {
        self.token_delay = delay;
        self
    }
}

impl Default for MockCloud {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CloudDispatcher for MockCloud {
    async fn chat_stream(
        &self,
        _messages: Vec<ChatMessage>,
        cancel: CancellationToken,
    ) -> Result<TokenStream, MurmurError> {
        let text = self
            .responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| DEFAULT_RESPONSE.to_string());
        Ok(scripted_stream(tokens_of(&text), self.token_delay, cancel))
    }
}
