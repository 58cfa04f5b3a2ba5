// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Axum front for the path router.
//!
//! Axum owns the socket, HTTP parsing, and CORS; every request funnels
//! through a single fallback handler into the [`PathRouter`], which owns
//! route semantics. Routes can therefore be registered at runtime
//! without rebuilding the axum app.

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use murmur_config::GatewayConfig;
use murmur_core::MurmurError;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::handlers::{register_builtin_routes, GatewayState};
use crate::path_router::{Method, PathRouter, RouteResponse};

/// Largest accepted request body.
const BODY_LIMIT: usize = 1024 * 1024;

/// Build the gateway's route table with the built-in routes installed.
pub fn build_routes(state: GatewayState) -> PathRouter {
    let mut router = PathRouter::new();
    register_builtin_routes(&mut router, state);
    router
}

/// Serve the route table until the shutdown token fires.
pub async fn start_server(
    config: &GatewayConfig,
    routes: PathRouter,
    shutdown: CancellationToken,
) -> Result<(), MurmurError> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| MurmurError::Channel {
            message: format!("failed to bind gateway to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;

    info!("gateway listening on {addr}");
    serve(listener, routes, shutdown).await
}

/// Serve on an existing listener (used by tests to bind port 0).
pub async fn serve(
    listener: tokio::net::TcpListener,
    routes: PathRouter,
    shutdown: CancellationToken,
) -> Result<(), MurmurError> {
    let app = axum::Router::new()
        .fallback(dispatch)
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(routes));

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| MurmurError::Channel {
            message: format!("gateway server error: {e}"),
            source: Some(Box::new(e)),
        })
}

/// Translate an axum request into a path-router dispatch.
async fn dispatch(State(routes): State<Arc<PathRouter>>, request: Request<Body>) -> Response {
    let Some(method) = Method::parse(request.method().as_str()) else {
        return to_response(RouteResponse::not_found());
    };

    let path = request.uri().path().to_string();
    let query = parse_query(request.uri().query());

    let body = match axum::body::to_bytes(request.into_body(), BODY_LIMIT).await {
        Ok(bytes) if !bytes.is_empty() => {
            serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
        }
        _ => serde_json::Value::Null,
    };

    to_response(routes.dispatch(method, &path, query, body).await)
}

fn to_response(response: RouteResponse) -> Response {
    let status =
        StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(response.body)).into_response()
}

fn parse_query(query: Option<&str>) -> HashMap<String, String> {
    query
        .unwrap_or_default()
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            Some((key.to_string(), value.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_parsing() {
        let q = parse_query(Some("a=1&b=two&flag"));
        assert_eq!(q["a"], "1");
        assert_eq!(q["b"], "two");
        assert_eq!(q["flag"], "");
        assert!(parse_query(None).is_empty());
    }
}
