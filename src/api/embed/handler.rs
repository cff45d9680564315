// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! POST /embed and POST /embed/batch handlers
//!
//! Each handler validates the body, checks the readiness gate, then runs the
//! model on the blocking pool so that long encodes never stall the reactor.

use crate::api::embed::request::body_rejection;
use crate::api::embed::{EmbedBatchRequest, EmbedBatchResponse, EmbedRequest, EmbedResponse};
use crate::api::http_server::AppState;
use crate::api::ApiError;
use crate::embeddings::{EmbeddingError, ModelHolder};
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use std::sync::Arc;
use tracing::{error, info};

/// POST /embed handler
///
/// # Errors
/// - 422 for a malformed body or blank text
/// - 503 while the model is not loaded
/// - 500 if encoding fails
pub async fn embed_handler(
    State(state): State<AppState>,
    payload: Result<Json<EmbedRequest>, JsonRejection>,
) -> Result<Json<EmbedResponse>, ApiError> {
    let Json(request) = payload.map_err(body_rejection)?;
    request.validate()?;
    ensure_ready(&state.model)?;

    let text = request.text;
    let embedding = run_blocking(state.model.clone(), move |model| model.encode_one(&text)).await?;

    info!("✅ Generated {}-dimensional embedding", embedding.len());

    Ok(Json(EmbedResponse::new(embedding, state.model.model_name())))
}

/// POST /embed/batch handler
///
/// The whole batch goes to the model in one call; output order matches
/// input order.
pub async fn embed_batch_handler(
    State(state): State<AppState>,
    payload: Result<Json<EmbedBatchRequest>, JsonRejection>,
) -> Result<Json<EmbedBatchResponse>, ApiError> {
    let Json(request) = payload.map_err(body_rejection)?;
    request.validate(state.limits.max_batch_size)?;
    ensure_ready(&state.model)?;

    let texts = request.texts;
    let embeddings =
        run_blocking(state.model.clone(), move |model| model.encode_batch(&texts)).await?;

    info!("✅ Generated {} embeddings", embeddings.len());

    Ok(Json(EmbedBatchResponse::new(
        embeddings,
        state.model.model_name(),
    )))
}

fn ensure_ready(model: &ModelHolder) -> Result<(), ApiError> {
    if model.is_ready() {
        Ok(())
    } else {
        Err(EmbeddingError::NotReady.into())
    }
}

async fn run_blocking<T, F>(model: Arc<ModelHolder>, work: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&ModelHolder) -> Result<T, EmbeddingError> + Send + 'static,
{
    let result = tokio::task::spawn_blocking(move || work(&model))
        .await
        .map_err(|e| {
            error!("❌ Embedding task aborted: {}", e);
            ApiError::InternalError("Embedding task aborted".to_string())
        })?;

    result.map_err(|e| {
        if let EmbeddingError::EncodingFailure(reason) = &e {
            error!("❌ Error generating embedding: {}", reason);
        }
        ApiError::from(e)
    })
}
