// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Streaming executor contracts.
//!
//! The router dispatches every task to exactly one of these two seams:
//! [`InferenceEngine`] for the on-device engine (specified by contract
//! only; the engine itself lives outside this repo) and
//! [`CloudDispatcher`] for the provider abstraction.

use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;
use tokio_util::sync::CancellationToken;

use crate::error::MurmurError;
use crate::types::ChatMessage;

/// A finite, non-restartable stream of generated tokens.
pub type TokenStream =
    Pin<Box<dyn Stream<Item = Result<String, MurmurError>> + Send>>;

/// Contract over the local inference engine.
///
/// Implementations must honor the cancellation token promptly: stop
/// producing tokens, release resources, and end the stream.
#[async_trait]
pub trait InferenceEngine: Send + Sync {
    /// Stream tokens for an assembled prompt.
    async fn generate(
        &self,
        prompt: &str,
        cancel: CancellationToken,
    ) -> Result<TokenStream, MurmurError>;

    /// Identifier of the loaded model, if one is loaded.
    fn model_id(&self) -> Option<String>;
}

/// Contract over the cloud provider abstraction.
///
/// Cancellation is cooperative: dropping the returned stream must release
/// the underlying HTTP body promptly.
#[async_trait]
pub trait CloudDispatcher: Send + Sync {
    /// Stream tokens for a normalized message transcript.
    async fn chat_stream(
        &self,
        messages: Vec<ChatMessage>,
        cancel: CancellationToken,
    ) -> Result<TokenStream, MurmurError>;
}
