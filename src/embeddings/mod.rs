// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Embedding model lifecycle and computation

pub mod holder;
pub mod model;
pub mod model_source;
pub mod onnx_model;

pub use holder::{ModelHolder, ModelState};
pub use model::{
    EmbeddingError, EmbeddingModel, LoadError, MODEL_DIMENSIONS, MODEL_NAME, SUPPORTED_LANGUAGES,
};
pub use model_source::{ModelFiles, ModelSource};
pub use onnx_model::{OnnxEmbeddingModel, OnnxModelOptions, DEFAULT_INTRA_THREADS};
