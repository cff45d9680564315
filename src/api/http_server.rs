// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    http::{Method, Uri},
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{
    auth::{auth_gate, AuthConfig},
    cors::{cors_header_layers, preflight},
    embed::{embed_batch_handler, embed_handler, DEFAULT_MAX_BATCH_SIZE},
    handlers::{health_handler, model_info_handler},
    ApiError,
};
use crate::embeddings::ModelHolder;

/// Per-request limits enforced by the handlers
#[derive(Debug, Clone, Copy)]
pub struct RequestLimits {
    pub max_batch_size: usize,
}

impl Default for RequestLimits {
    fn default() -> Self {
        Self {
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
        }
    }
}

/// State shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub model: Arc<ModelHolder>,
    pub limits: RequestLimits,
}

impl AppState {
    pub fn new(model: Arc<ModelHolder>, limits: RequestLimits) -> Self {
        Self { model, limits }
    }
}

/// Builds the router with its interceptor chain.
///
/// Outermost first: request tracing, CORS response headers, preflight
/// short-circuit, auth gate, then routing.
pub fn create_app(state: AppState, auth: Arc<AuthConfig>) -> Router {
    let [allow_origin, allow_methods, allow_headers] = cors_header_layers();

    Router::new()
        .route("/health", get(health_handler))
        .route("/embed", post(embed_handler))
        .route("/embed/batch", post(embed_batch_handler))
        .route("/model/info", get(model_info_handler))
        .fallback(not_found_handler)
        .method_not_allowed_fallback(method_not_allowed_handler)
        .with_state(state)
        .layer(middleware::from_fn_with_state(auth, auth_gate))
        .layer(middleware::from_fn(preflight))
        .layer(allow_headers)
        .layer(allow_methods)
        .layer(allow_origin)
        .layer(TraceLayer::new_for_http())
}

async fn not_found_handler(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("No route for {}", uri.path()))
}

async fn method_not_allowed_handler(method: Method, uri: Uri) -> ApiError {
    ApiError::MethodNotAllowed(format!("{} is not supported on {}", method, uri.path()))
}
