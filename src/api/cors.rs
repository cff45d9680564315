// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Cross-origin policy
//!
//! Every response, including errors and auth rejections, carries permissive
//! CORS headers. Preflight requests are answered before the auth gate.

use axum::{
    extract::Request,
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tower_http::set_header::SetResponseHeaderLayer;

pub const ALLOW_ORIGIN: &str = "*";
pub const ALLOW_METHODS: &str = "GET, POST, OPTIONS";
pub const ALLOW_HEADERS: &str = "Content-Type, Authorization";

/// Layers that stamp the CORS headers onto every response
pub fn cors_header_layers() -> [SetResponseHeaderLayer<HeaderValue>; 3] {
    let layer = |name: HeaderName, value: &'static str| {
        SetResponseHeaderLayer::overriding(name, HeaderValue::from_static(value))
    };
    [
        layer(header::ACCESS_CONTROL_ALLOW_ORIGIN, ALLOW_ORIGIN),
        layer(header::ACCESS_CONTROL_ALLOW_METHODS, ALLOW_METHODS),
        layer(header::ACCESS_CONTROL_ALLOW_HEADERS, ALLOW_HEADERS),
    ]
}

/// Answers OPTIONS on any path with 204 and an empty body.
pub async fn preflight(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        return StatusCode::NO_CONTENT.into_response();
    }
    next.run(request).await
}
