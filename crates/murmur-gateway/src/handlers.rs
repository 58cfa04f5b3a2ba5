// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Built-in gateway routes.
//!
//! `GET /health`, `GET /api/status`, and the webhook ingestion route
//! `POST /webhook`, which turns an external event into a router task and
//! answers with the completed response text.

use std::collections::HashMap;
use std::time::Duration;

use murmur_core::{types::epoch_ms, MurmurError, TaskRequest};
use murmur_router::RouterHandle;
use serde_json::json;
use tracing::debug;

use crate::path_router::{Method, PathRouter, RouteRequest, RouteResponse};

/// Shared state captured by the built-in handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub router: RouterHandle,
    /// ID of the loaded local model, surfaced by `/api/status`.
    pub local_model: Option<String>,
    /// Optional per-request wall-clock timeout for webhook tasks.
    pub request_timeout: Option<Duration>,
}

/// Register the built-in routes onto a path router.
pub fn register_builtin_routes(router: &mut PathRouter, state: GatewayState) {
    router.route(Method::Get, "/health", |_req| async {
        RouteResponse::ok(json!({
            "status": "ok",
            "timestamp": epoch_ms(),
            "version": env!("CARGO_PKG_VERSION"),
        }))
    });

    let status_state = state.clone();
    router.route(Method::Get, "/api/status", move |_req| {
        let state = status_state.clone();
        async move {
            match state.router.status().await {
                Ok(snapshot) => RouteResponse::ok(json!({
                    "routing": snapshot.mode.to_string(),
                    "localModel": state.local_model,
                    "timestamp": epoch_ms(),
                })),
                Err(e) => RouteResponse::with_status(500, json!({"error": e.to_string()})),
            }
        }
    });

    router.route(Method::Post, "/webhook", move |req| {
        let state = state.clone();
        async move { handle_webhook(&state, req).await }
    });
}

async fn handle_webhook(state: &GatewayState, req: RouteRequest) -> RouteResponse {
    let Some(message) = req.body.get("message").and_then(|m| m.as_str()) else {
        return RouteResponse::with_status(400, json!({"error": "Missing message"}));
    };

    let user = req
        .body
        .get("userId")
        .and_then(|v| v.as_str())
        .unwrap_or("webhook-user")
        .to_string();
    let channel = req
        .body
        .get("channel")
        .and_then(|v| v.as_str())
        .unwrap_or("webhook")
        .to_string();
    let metadata: HashMap<String, serde_json::Value> = req
        .body
        .get("metadata")
        .and_then(|v| v.as_object())
        .map(|obj| obj.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
        .unwrap_or_default();

    debug!(%channel, %user, "webhook task received");

    let request = TaskRequest {
        channel,
        user,
        text: message.to_string(),
        metadata,
    };
    match state
        .router
        .submit_and_wait(request, state.request_timeout)
        .await
    {
        Ok(response) => RouteResponse::ok(json!({"response": response})),
        Err(MurmurError::RequestTimeout { .. }) => {
            RouteResponse::with_status(504, json!({"error": "Request timeout"}))
        }
        Err(MurmurError::QueueFull) => {
            RouteResponse::with_status(429, json!({"error": "Queue full"}))
        }
        Err(e) => RouteResponse::with_status(500, json!({"error": e.to_string()})),
    }
}
