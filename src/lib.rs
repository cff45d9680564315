// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod config;
pub mod embeddings;
pub mod version;

pub use api::{ApiConfig, ApiServer, AuthConfig};
pub use config::ServiceConfig;
pub use embeddings::{
    EmbeddingError, EmbeddingModel, LoadError, ModelHolder, ModelState, OnnxEmbeddingModel,
    MODEL_DIMENSIONS, MODEL_NAME,
};
