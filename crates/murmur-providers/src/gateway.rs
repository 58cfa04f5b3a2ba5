// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The router-facing cloud executor.
//!
//! Binds a default provider + model + credential bundle to the shared
//! client and exposes the whole thing as one [`CloudDispatcher`].

use async_trait::async_trait;
use futures::future::ready;
use futures::StreamExt;
use murmur_config::ProvidersConfig;
use murmur_core::{ChatMessage, CloudDispatcher, MurmurError, TokenStream};
use murmur_vault::CredentialBundle;
use tokio_util::sync::CancellationToken;

use crate::client::ProviderClient;
use crate::registry;

/// Cloud executor over the descriptor registry.
#[derive(Debug)]
pub struct ProviderGateway {
    client: ProviderClient,
    credentials: CredentialBundle,
    provider: String,
    model: String,
}

impl ProviderGateway {
    pub fn new(
        credentials: CredentialBundle,
        config: &ProvidersConfig,
    ) -> Result<Self, MurmurError> {
        // Fail at construction on an unknown provider id, not at dispatch.
        registry::get(&config.default_provider)?;
        Ok(Self {
            client: ProviderClient::new()?,
            credentials,
            provider: config.default_provider.clone(),
            model: config.default_model.clone(),
        })
    }

    /// True when a credential exists for the configured provider.
    pub fn has_credential(&self) -> bool {
        self.credentials.get(&self.provider).is_some()
    }

    pub fn provider_id(&self) -> &str {
        &self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl CloudDispatcher for ProviderGateway {
    async fn chat_stream(
        &self,
        messages: Vec<ChatMessage>,
        cancel: CancellationToken,
    ) -> Result<TokenStream, MurmurError> {
        let descriptor = registry::get(&self.provider)?;
        let credential = self.credentials.get(&self.provider).ok_or_else(|| {
            MurmurError::Config(format!("no credential configured for provider {}", self.provider))
        })?;

        let stream = self
            .client
            .chat_stream(descriptor, credential, &self.model, &messages)
            .await?;

        // Stop consuming as soon as the caller cancels; dropping the
        // inner stream releases the HTTP body.
        let guarded = stream.take_while(move |_| ready(!cancel.is_cancelled()));
        Ok(Box::pin(guarded))
    }
}
