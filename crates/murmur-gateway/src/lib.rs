// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the murmur agent runtime.
//!
//! External HTTP events become router tasks here. A runtime
//! [`PathRouter`] owns route matching (`:name` params, `*` wildcards,
//! longest-path-first); axum owns the socket and serves everything
//! through one fallback handler. Built-in routes: `GET /health`,
//! `GET /api/status`, `POST /webhook`.

pub mod handlers;
pub mod path_router;
pub mod server;

pub use handlers::{register_builtin_routes, GatewayState};
pub use path_router::{Method, PathRouter, RouteRequest, RouteResponse};
pub use server::{build_routes, serve, start_server};
