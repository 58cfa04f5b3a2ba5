// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dynamic HTTP path router.
//!
//! Routes register at runtime against patterns with `:name` parameters
//! and a trailing `*` suffix wildcard. Matching is longest-path-first
//! (more segments win); ties resolve by registration order. Unknown
//! paths produce a JSON 404.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::{json, Value};

/// HTTP verbs the router understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    /// Parse a verb, case-insensitively. Unsupported verbs yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Some(Method::Get),
            "POST" => Some(Method::Post),
            "PUT" => Some(Method::Put),
            "DELETE" => Some(Method::Delete),
            _ => None,
        }
    }
}

/// Request context handed to a route handler.
#[derive(Debug, Clone, Default)]
pub struct RouteRequest {
    /// `:name` captures from the matched pattern. A suffix matched by
    /// `*` is stored under the key `"*"`.
    pub params: HashMap<String, String>,
    /// Decoded query-string pairs.
    pub query: HashMap<String, String>,
    /// Parsed JSON body; `Null` when absent or unparseable.
    pub body: Value,
}

/// JSON response produced by a route handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteResponse {
    pub status: u16,
    pub body: Value,
}

impl RouteResponse {
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    pub fn with_status(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    /// The canonical unknown-path response.
    pub fn not_found() -> Self {
        Self::with_status(404, json!({"error": "Not found"}))
    }
}

type BoxedHandler =
    Arc<dyn Fn(RouteRequest) -> Pin<Box<dyn Future<Output = RouteResponse> + Send>> + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
    Wildcard,
}

fn parse_pattern(pattern: &str) -> Vec<Segment> {
    pattern
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| {
            if s == "*" {
                Segment::Wildcard
            } else if let Some(name) = s.strip_prefix(':') {
                Segment::Param(name.to_string())
            } else {
                Segment::Literal(s.to_string())
            }
        })
        .collect()
}

struct RouteEntry {
    method: Method,
    segments: Vec<Segment>,
    handler: BoxedHandler,
}

impl RouteEntry {
    /// Try to match a split path, producing the capture map on success.
    fn try_match(&self, parts: &[&str]) -> Option<HashMap<String, String>> {
        let mut params = HashMap::new();
        let mut i = 0;

        for segment in &self.segments {
            match segment {
                Segment::Wildcard => {
                    params.insert("*".to_string(), parts[i..].join("/"));
                    return Some(params);
                }
                Segment::Literal(lit) => {
                    if parts.get(i) != Some(&lit.as_str()) {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    let value = parts.get(i)?;
                    params.insert(name.clone(), (*value).to_string());
                }
            }
            i += 1;
        }

        if i == parts.len() {
            Some(params)
        } else {
            None
        }
    }
}

/// Runtime route table.
#[derive(Default)]
pub struct PathRouter {
    routes: Vec<RouteEntry>,
}

impl PathRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for a method + pattern.
    pub fn route<F, Fut>(&mut self, method: Method, pattern: &str, handler: F)
    where
        F: Fn(RouteRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = RouteResponse> + Send + 'static,
    {
        let handler: BoxedHandler = Arc::new(move |req| Box::pin(handler(req)));
        self.routes.push(RouteEntry {
            method,
            segments: parse_pattern(pattern),
            handler,
        });
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Dispatch a request. No matching route yields the JSON 404.
    pub async fn dispatch(
        &self,
        method: Method,
        path: &str,
        query: HashMap<String, String>,
        body: Value,
    ) -> RouteResponse {
        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        // Longest pattern wins; among equals the earliest registration.
        let mut best: Option<(usize, &RouteEntry, HashMap<String, String>)> = None;
        for entry in &self.routes {
            if entry.method != method {
                continue;
            }
            if let Some(params) = entry.try_match(&parts) {
                let length = entry.segments.len();
                let better = match &best {
                    Some((best_len, _, _)) => length > *best_len,
                    None => true,
                };
                if better {
                    best = Some((length, entry, params));
                }
            }
        }

        match best {
            Some((_, entry, params)) => {
                let request = RouteRequest {
                    params,
                    query,
                    body,
                };
                (entry.handler)(request).await
            }
            None => RouteResponse::not_found(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn hit(
        router: &PathRouter,
        method: Method,
        path: &str,
    ) -> RouteResponse {
        router
            .dispatch(method, path, HashMap::new(), Value::Null)
            .await
    }

    fn tagged(tag: &'static str) -> impl Fn(RouteRequest) -> std::future::Ready<RouteResponse> {
        move |_req| std::future::ready(RouteResponse::ok(json!({"tag": tag})))
    }

    #[tokio::test]
    async fn literal_match_and_404() {
        let mut router = PathRouter::new();
        router.route(Method::Get, "/health", tagged("health"));

        let ok = hit(&router, Method::Get, "/health").await;
        assert_eq!(ok.status, 200);
        assert_eq!(ok.body["tag"], "health");

        let missing = hit(&router, Method::Get, "/nope").await;
        assert_eq!(missing.status, 404);
        assert_eq!(missing.body, json!({"error": "Not found"}));
    }

    #[tokio::test]
    async fn method_mismatch_is_404() {
        let mut router = PathRouter::new();
        router.route(Method::Post, "/webhook", tagged("webhook"));
        assert_eq!(hit(&router, Method::Get, "/webhook").await.status, 404);
        assert_eq!(hit(&router, Method::Post, "/webhook").await.status, 200);
    }

    #[tokio::test]
    async fn params_are_extracted() {
        let mut router = PathRouter::new();
        router.route(Method::Get, "/api/models/:id", |req: RouteRequest| async move {
            RouteResponse::ok(json!({"id": req.params["id"]}))
        });

        let resp = hit(&router, Method::Get, "/api/models/phi-3").await;
        assert_eq!(resp.body["id"], "phi-3");

        // Param segments still require a value.
        assert_eq!(hit(&router, Method::Get, "/api/models").await.status, 404);
    }

    #[tokio::test]
    async fn wildcard_matches_any_suffix() {
        let mut router = PathRouter::new();
        router.route(Method::Get, "/static/*", |req: RouteRequest| async move {
            RouteResponse::ok(json!({"rest": req.params["*"]}))
        });

        let resp = hit(&router, Method::Get, "/static/css/site.css").await;
        assert_eq!(resp.body["rest"], "css/site.css");

        let resp = hit(&router, Method::Get, "/static").await;
        assert_eq!(resp.body["rest"], "");
    }

    #[tokio::test]
    async fn longest_path_wins_over_wildcard() {
        let mut router = PathRouter::new();
        router.route(Method::Get, "/*", tagged("catchall"));
        router.route(Method::Get, "/api/status", tagged("status"));

        let resp = hit(&router, Method::Get, "/api/status").await;
        assert_eq!(resp.body["tag"], "status");

        let resp = hit(&router, Method::Get, "/anything/else").await;
        assert_eq!(resp.body["tag"], "catchall");
    }

    #[tokio::test]
    async fn ties_resolve_by_registration_order() {
        let mut router = PathRouter::new();
        router.route(Method::Get, "/api/:kind", tagged("first"));
        router.route(Method::Get, "/api/:other", tagged("second"));

        let resp = hit(&router, Method::Get, "/api/models").await;
        assert_eq!(resp.body["tag"], "first");
    }

    #[tokio::test]
    async fn trailing_slash_is_ignored() {
        let mut router = PathRouter::new();
        router.route(Method::Get, "/health", tagged("health"));
        assert_eq!(hit(&router, Method::Get, "/health/").await.status, 200);
    }

    #[test]
    fn method_parsing() {
        assert_eq!(Method::parse("get"), Some(Method::Get));
        assert_eq!(Method::parse("POST"), Some(Method::Post));
        assert_eq!(Method::parse("Put"), Some(Method::Put));
        assert_eq!(Method::parse("DELETE"), Some(Method::Delete));
        assert_eq!(Method::parse("PATCH"), None);
    }

    #[test]
    fn pattern_parsing() {
        assert_eq!(
            parse_pattern("/a/:b/*"),
            vec![
                Segment::Literal("a".into()),
                Segment::Param("b".into()),
                Segment::Wildcard
            ]
        );
        assert!(parse_pattern("/").is_empty());
    }
}
