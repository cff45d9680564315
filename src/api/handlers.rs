// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use crate::api::http_server::AppState;
use crate::embeddings::{ModelHolder, ModelState, SUPPORTED_LANGUAGES};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

/// Service name reported by /health
pub const SERVICE_NAME: &str = "embedding-service";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub model: String,
    pub dimensions: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelInfoResponse {
    pub name: String,
    pub dimensions: usize,
    pub loaded: bool,
    pub languages: String,
}

impl HealthResponse {
    pub fn from_holder(model: &ModelHolder) -> Self {
        let status = match model.state() {
            ModelState::Ready => "healthy",
            ModelState::Unloaded | ModelState::Loading => "loading",
            ModelState::Failed => "unhealthy",
        };

        Self {
            status: status.to_string(),
            service: SERVICE_NAME.to_string(),
            model: model.model_name().to_string(),
            dimensions: model.dimensions(),
        }
    }
}

impl ModelInfoResponse {
    pub fn from_holder(model: &ModelHolder) -> Self {
        Self {
            name: model.model_name().to_string(),
            dimensions: model.dimensions(),
            loaded: model.is_ready(),
            languages: SUPPORTED_LANGUAGES.to_string(),
        }
    }
}

/// GET /health: always 200 once the process is up, never authenticated.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::from_holder(&state.model))
}

/// GET /model/info: read-only report that answers in every model state.
pub async fn model_info_handler(State(state): State<AppState>) -> Json<ModelInfoResponse> {
    Json(ModelInfoResponse::from_holder(&state.model))
}
