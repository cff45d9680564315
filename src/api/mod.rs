// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod auth;
pub mod cors;
pub mod embed;
pub mod errors;
pub mod handlers;
pub mod http_server;
pub mod server;

pub use auth::AuthConfig;
pub use embed::{
    embed_batch_handler, embed_handler, EmbedBatchRequest, EmbedBatchResponse, EmbedRequest,
    EmbedResponse, DEFAULT_MAX_BATCH_SIZE,
};
pub use errors::{ApiError, ErrorResponse};
pub use handlers::{HealthResponse, ModelInfoResponse};
pub use http_server::{create_app, AppState, RequestLimits};
pub use server::{
    run_service, shutdown_signal, ApiConfig, ApiServer, DEFAULT_PORT,
    DEFAULT_SHUTDOWN_TIMEOUT_SECS,
};
