// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Auth Gate
//!
//! Bearer-token check applied to every route except `/health`. With no token
//! configured the gate admits everything; that is an operator decision.

use crate::api::ApiError;
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::debug;

/// Path that bypasses authentication
pub const HEALTH_PATH: &str = "/health";

const BEARER_PREFIX: &str = "Bearer ";

/// Immutable shared-secret configuration
#[derive(Clone, Default)]
pub struct AuthConfig {
    token_digest: Option<[u8; 32]>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

impl AuthConfig {
    /// An empty token is treated the same as no token (open mode).
    pub fn new(token: Option<&str>) -> Self {
        Self {
            token_digest: token.filter(|t| !t.is_empty()).map(digest),
        }
    }

    pub fn open() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.token_digest.is_some()
    }

    /// Decides whether a request to `path` carrying `authorization` may
    /// proceed.
    pub fn admit(&self, path: &str, authorization: Option<&str>) -> bool {
        if path == HEALTH_PATH {
            return true;
        }
        let Some(expected) = &self.token_digest else {
            return true;
        };

        // Compare fixed-size digests so the comparison does not depend on
        // how much of the secret matches.
        authorization
            .and_then(|value| value.strip_prefix(BEARER_PREFIX))
            .map(|presented| digest(presented) == *expected)
            .unwrap_or(false)
    }
}

fn digest(token: &str) -> [u8; 32] {
    Sha256::digest(token.as_bytes()).into()
}

/// Middleware that rejects unauthenticated requests before any handler runs.
pub async fn auth_gate(
    State(auth): State<Arc<AuthConfig>>,
    request: Request,
    next: Next,
) -> Response {
    let authorization = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    if auth.admit(request.uri().path(), authorization) {
        return next.run(request).await;
    }

    debug!(
        "Rejected unauthenticated {} {}",
        request.method(),
        request.uri().path()
    );
    ApiError::Unauthorized("Unauthorized".to_string()).into_response()
}
