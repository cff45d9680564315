// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Embedding model abstraction
//!
//! The service treats the model as an opaque `text -> vector` function.
//! `OnnxEmbeddingModel` is the production implementation; tests plug in
//! deterministic stand-ins through the same trait.

use thiserror::Error;

/// Identifier of the model this service is built around
pub const MODEL_NAME: &str = "intfloat/multilingual-e5-large";

/// Output dimension of [`MODEL_NAME`]
pub const MODEL_DIMENSIONS: usize = 1024;

/// Language coverage reported by `/model/info`
pub const SUPPORTED_LANGUAGES: &str = "100+";

/// Errors raised while computing embeddings for a single request
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EmbeddingError {
    #[error("model is not loaded")]
    NotReady,

    #[error("encoding failed: {0}")]
    EncodingFailure(String),
}

/// Errors raised while bringing the model up at startup
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("model loading has already been started")]
    AlreadyStarted,

    #[error("model files unavailable: {0}")]
    ModelFiles(String),

    #[error("tokenizer initialization failed: {0}")]
    Tokenizer(String),

    #[error("inference runtime initialization failed: {0}")]
    Runtime(String),

    #[error("model outputs {actual} dimensions, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// A loaded embedding model
///
/// Implementations are synchronous and may block for the duration of the
/// computation. Callers on an async runtime should move calls onto the
/// blocking pool.
pub trait EmbeddingModel: Send + Sync + 'static {
    /// Model identifier (e.g. "intfloat/multilingual-e5-large")
    fn model_name(&self) -> &str;

    /// Length of every vector this model produces
    fn dimension(&self) -> usize;

    /// Encodes all texts in one batched computation.
    ///
    /// `output[i]` corresponds to `texts[i]`.
    fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Encodes a single text.
    fn encode_one(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.encode_batch(&[text.to_string()])?
            .pop()
            .ok_or_else(|| EmbeddingError::EncodingFailure("model returned no vector".to_string()))
    }
}
