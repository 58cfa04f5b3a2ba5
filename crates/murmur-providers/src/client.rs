// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client over provider descriptors.
//!
//! One reqwest client serves every provider; the descriptor supplies the
//! URL, headers, request envelope, and frame parser. Streaming responses
//! decode through `eventsource-stream`; a malformed frame is skipped
//! rather than aborting the stream.

use std::time::Duration;

use eventsource_stream::Eventsource;
use futures::future::ready;
use futures::StreamExt;
use murmur_core::{ChatMessage, MurmurError, TokenStream};
use tracing::debug;

use crate::descriptor::{ModelInfo, ProviderDescriptor};

/// Streaming HTTP client shared by all providers.
#[derive(Debug, Clone)]
pub struct ProviderClient {
    http: reqwest::Client,
    base_url_override: Option<String>,
}

impl ProviderClient {
    pub fn new() -> Result<Self, MurmurError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(300))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| MurmurError::Internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url_override: None,
        })
    }

    /// Override every descriptor's base URL (for testing with wiremock).
    #[cfg(test)]
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url_override = Some(url);
        self
    }

    fn base<'a>(&'a self, descriptor: &'a ProviderDescriptor) -> &'a str {
        self.base_url_override
            .as_deref()
            .unwrap_or(descriptor.base_url)
    }

    /// List the provider's models. Providers without a listing endpoint
    /// report an empty set.
    pub async fn list_models(
        &self,
        descriptor: &ProviderDescriptor,
        credential: &str,
    ) -> Result<Vec<ModelInfo>, MurmurError> {
        let Some(url) = (descriptor.models_url)(self.base(descriptor), credential) else {
            debug!(provider = descriptor.id, "provider has no models endpoint");
            return Ok(vec![]);
        };

        let mut request = self.http.get(&url);
        for (name, value) in (descriptor.headers)(credential) {
            request = request.header(name, value);
        }

        let response = request.send().await.map_err(|e| transport_error(descriptor, e))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(descriptor, status.as_u16(), &body));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| transport_error(descriptor, e))?;
        Ok((descriptor.parse_models)(&body))
    }

    /// Non-streaming chat completion.
    pub async fn chat(
        &self,
        descriptor: &ProviderDescriptor,
        credential: &str,
        model: &str,
        messages: &[ChatMessage],
    ) -> Result<String, MurmurError> {
        let url = (descriptor.chat_url)(self.base(descriptor), model, credential, false);
        let body = (descriptor.build_request)(model, messages, false);

        let mut request = self.http.post(&url).json(&body);
        for (name, value) in (descriptor.headers)(credential) {
            request = request.header(name, value);
        }

        let response = request.send().await.map_err(|e| transport_error(descriptor, e))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(descriptor, status.as_u16(), &body));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| transport_error(descriptor, e))?;
        (descriptor.parse_response)(&body).ok_or_else(|| MurmurError::Provider {
            provider: descriptor.id.to_string(),
            status: status.as_u16(),
            message: "response carried no completion text".to_string(),
        })
    }

    /// Streaming chat completion.
    ///
    /// Tokens arrive in provider order. The stream ends on the provider's
    /// done sentinel or when the transport closes; dropping it releases
    /// the HTTP body promptly.
    pub async fn chat_stream(
        &self,
        descriptor: &ProviderDescriptor,
        credential: &str,
        model: &str,
        messages: &[ChatMessage],
    ) -> Result<TokenStream, MurmurError> {
        let url = (descriptor.chat_url)(self.base(descriptor), model, credential, true);
        let body = (descriptor.build_request)(model, messages, true);

        let mut request = self.http.post(&url).json(&body);
        for (name, value) in (descriptor.headers)(credential) {
            request = request.header(name, value);
        }

        let response = request.send().await.map_err(|e| transport_error(descriptor, e))?;
        let status = response.status();
        debug!(provider = descriptor.id, status = %status, "stream response received");
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(descriptor, status.as_u16(), &body));
        }

        let parse = descriptor.parse_frame;
        let provider = descriptor.id.to_string();
        let tokens = response
            .bytes_stream()
            .eventsource()
            .scan(false, move |finished, item| {
                if *finished {
                    return ready(None);
                }
                let emit: Option<Result<String, MurmurError>> = match item {
                    Ok(event) => match parse(&event.event, &event.data) {
                        Some(frame) => {
                            if frame.done {
                                *finished = true;
                            }
                            frame.token.map(Ok)
                        }
                        // Malformed or uninteresting frame: skip silently.
                        None => None,
                    },
                    Err(e) => {
                        *finished = true;
                        Some(Err(MurmurError::Provider {
                            provider: provider.clone(),
                            status: 0,
                            message: format!("stream transport error: {e}"),
                        }))
                    }
                };
                ready(Some(emit))
            })
            .filter_map(ready);

        Ok(Box::pin(tokens))
    }
}

fn transport_error(descriptor: &ProviderDescriptor, e: reqwest::Error) -> MurmurError {
    MurmurError::Provider {
        provider: descriptor.id.to_string(),
        status: e.status().map(|s| s.as_u16()).unwrap_or(0),
        message: format!("HTTP request failed: {e}"),
    }
}

fn api_error(descriptor: &ProviderDescriptor, status: u16, body: &str) -> MurmurError {
    MurmurError::Provider {
        provider: descriptor.id.to_string(),
        status,
        message: extract_error_message(body),
    }
}

/// Pull the inner message out of the common `{"error":{"message":...}}`
/// shape, falling back to the raw body.
fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(String::from)
        })
        .unwrap_or_else(|| body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{ANTHROPIC, GEMINI, OPENAI};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn messages() -> Vec<ChatMessage> {
        vec![ChatMessage::user("hello")]
    }

    async fn sse_server(sse_body: &str) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(sse_body.to_string()),
            )
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn openai_stream_ends_on_done_sentinel() {
        let sse = "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\n\
                   data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n\n\
                   data: [DONE]\n\n\
                   data: {\"choices\":[{\"delta\":{\"content\":\"ignored\"}}]}\n\n";
        let server = sse_server(sse).await;
        let client = ProviderClient::new().unwrap().with_base_url(server.uri());

        let stream = client
            .chat_stream(&OPENAI, "sk-test", "gpt-4o-mini", &messages())
            .await
            .unwrap();
        let tokens: Vec<String> = stream.map(|t| t.unwrap()).collect().await;
        assert_eq!(tokens, vec!["Hel", "lo"]);
    }

    #[tokio::test]
    async fn malformed_frames_are_skipped() {
        let sse = "data: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\n\n\
                   data: {broken json\n\n\
                   data: {\"choices\":[{\"delta\":{\"content\":\"fine\"}}]}\n\n\
                   data: [DONE]\n\n";
        let server = sse_server(sse).await;
        let client = ProviderClient::new().unwrap().with_base_url(server.uri());

        let stream = client
            .chat_stream(&OPENAI, "sk-test", "gpt-4o-mini", &messages())
            .await
            .unwrap();
        let tokens: Vec<String> = stream.map(|t| t.unwrap()).collect().await;
        assert_eq!(tokens, vec!["ok", "fine"]);
    }

    #[tokio::test]
    async fn anthropic_stream_uses_named_events() {
        let sse = "event: message_start\ndata: {\"message\":{\"id\":\"m\"}}\n\n\
                   event: content_block_delta\ndata: {\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"Hi\"}}\n\n\
                   event: ping\ndata: {}\n\n\
                   event: content_block_delta\ndata: {\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\" there\"}}\n\n\
                   event: message_stop\ndata: {}\n\n";
        let server = sse_server(sse).await;
        let client = ProviderClient::new().unwrap().with_base_url(server.uri());

        let stream = client
            .chat_stream(&ANTHROPIC, "sk-ant", "claude-sonnet-4-20250514", &messages())
            .await
            .unwrap();
        let tokens: Vec<String> = stream.map(|t| t.unwrap()).collect().await;
        assert_eq!(tokens, vec!["Hi", " there"]);
    }

    #[tokio::test]
    async fn gemini_stream_ends_with_transport() {
        let sse = "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"one \"}]}}]}\n\n\
                   data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"two\"}]}}]}\n\n";
        let server = sse_server(sse).await;
        let client = ProviderClient::new().unwrap().with_base_url(server.uri());

        let stream = client
            .chat_stream(&GEMINI, "KEY", "gemini-2.0-flash", &messages())
            .await
            .unwrap();
        let tokens: Vec<String> = stream.map(|t| t.unwrap()).collect().await;
        assert_eq!(tokens, vec!["one ", "two"]);
    }

    #[tokio::test]
    async fn non_2xx_maps_to_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": {"message": "Rate limited", "type": "rate_limit_error"}
            })))
            .mount(&server)
            .await;
        let client = ProviderClient::new().unwrap().with_base_url(server.uri());

        let result = client
            .chat_stream(&OPENAI, "sk-test", "gpt-4o-mini", &messages())
            .await;
        let err = match result {
            Ok(_) => panic!("expected chat_stream to fail"),
            Err(e) => e,
        };
        match err {
            MurmurError::Provider {
                provider,
                status,
                message,
            } => {
                assert_eq!(provider, "openai");
                assert_eq!(status, 429);
                assert_eq!(message, "Rate limited");
            }
            other => panic!("expected Provider error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn chat_returns_full_completion() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "full answer"}}]
            })))
            .mount(&server)
            .await;
        let client = ProviderClient::new().unwrap().with_base_url(server.uri());

        let text = client
            .chat(&OPENAI, "sk-test", "gpt-4o-mini", &messages())
            .await
            .unwrap();
        assert_eq!(text, "full answer");
    }

    #[tokio::test]
    async fn anthropic_sends_api_key_header() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "sk-ant-test"))
            .and(header("anthropic-version", "2023-06-01"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "content": [{"type": "text", "text": "ok"}]
            })))
            .mount(&server)
            .await;
        let client = ProviderClient::new().unwrap().with_base_url(server.uri());

        let text = client
            .chat(&ANTHROPIC, "sk-ant-test", "claude-sonnet-4-20250514", &messages())
            .await
            .unwrap();
        assert_eq!(text, "ok");
    }

    #[tokio::test]
    async fn list_models_normalizes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/models"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{"id": "gpt-4o"}, {"id": "gpt-4o-mini"}]
            })))
            .mount(&server)
            .await;
        let client = ProviderClient::new().unwrap().with_base_url(server.uri());

        let models = client.list_models(&OPENAI, "sk-test").await.unwrap();
        assert_eq!(models.len(), 2);
        assert_eq!(models[1].id, "gpt-4o-mini");
        assert_eq!(models[1].provider, "openai");
    }

    #[tokio::test]
    async fn list_models_propagates_api_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": {"message": "bad key"}
            })))
            .mount(&server)
            .await;
        let client = ProviderClient::new().unwrap().with_base_url(server.uri());

        let err = client.list_models(&OPENAI, "bad").await.unwrap_err();
        assert!(matches!(err, MurmurError::Provider { status: 401, .. }));
    }

    #[test]
    fn error_message_extraction() {
        assert_eq!(
            extract_error_message(r#"{"error":{"message":"inner"}}"#),
            "inner"
        );
        assert_eq!(extract_error_message("plain text body "), "plain text body");
    }
}
