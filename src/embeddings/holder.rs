// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Model Holder
//!
//! Owns the single embedding model for the life of the process and tracks
//! its load lifecycle:
//!
//! ```text
//! Unloaded --begin--> Loading --ok--> Ready
//!                        \--err--> Failed (terminal)
//! ```
//!
//! The model is written once and then only read, so request paths never
//! take a lock on the holder. Readiness is the gate: encode calls made
//! before `Ready` fail with [`EmbeddingError::NotReady`].

use crate::embeddings::{EmbeddingError, EmbeddingModel, LoadError};
use serde::Serialize;
use std::future::Future;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};
use tracing::{error, info};

/// Load lifecycle of the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelState {
    Unloaded,
    Loading,
    Ready,
    Failed,
}

impl ModelState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => ModelState::Loading,
            2 => ModelState::Ready,
            3 => ModelState::Failed,
            _ => ModelState::Unloaded,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            ModelState::Unloaded => 0,
            ModelState::Loading => 1,
            ModelState::Ready => 2,
            ModelState::Failed => 3,
        }
    }
}

struct Loaded {
    model: Arc<dyn EmbeddingModel>,
    load_duration: Duration,
}

/// Process-wide owner of the embedding model
pub struct ModelHolder {
    model_name: String,
    expected_dimensions: usize,
    state: AtomicU8,
    loaded: OnceLock<Loaded>,
}

impl std::fmt::Debug for ModelHolder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHolder")
            .field("model_name", &self.model_name)
            .field("expected_dimensions", &self.expected_dimensions)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl ModelHolder {
    /// Creates an unloaded holder for the given model identifier.
    ///
    /// `expected_dimensions` is what the identifier promises; a loaded model
    /// reporting anything else is rejected.
    pub fn new(model_name: impl Into<String>, expected_dimensions: usize) -> Self {
        Self {
            model_name: model_name.into(),
            expected_dimensions,
            state: AtomicU8::new(ModelState::Unloaded.as_u8()),
            loaded: OnceLock::new(),
        }
    }

    /// Runs `loader` exactly once and records the outcome.
    ///
    /// # Errors
    /// - `LoadError::AlreadyStarted` if a load was already begun
    /// - whatever the loader returns, or `LoadError::DimensionMismatch`;
    ///   either leaves the holder in `Failed`
    pub async fn load_with<M, F>(&self, loader: F) -> Result<(), LoadError>
    where
        M: EmbeddingModel,
        F: Future<Output = Result<M, LoadError>>,
    {
        self.state
            .compare_exchange(
                ModelState::Unloaded.as_u8(),
                ModelState::Loading.as_u8(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map_err(|_| LoadError::AlreadyStarted)?;

        info!("📦 Loading model: {}", self.model_name);
        let started = Instant::now();

        let result = loader.await.and_then(|model| {
            if model.dimension() != self.expected_dimensions {
                return Err(LoadError::DimensionMismatch {
                    expected: self.expected_dimensions,
                    actual: model.dimension(),
                });
            }
            Ok(model)
        });

        match result {
            Ok(model) => {
                let load_duration = started.elapsed();
                // Only the caller that won the compare-exchange reaches this point.
                let _ = self.loaded.set(Loaded {
                    model: Arc::new(model),
                    load_duration,
                });
                self.state.store(ModelState::Ready.as_u8(), Ordering::Release);
                info!(
                    "✅ Model loaded in {:.1}s ({} dimensions)",
                    load_duration.as_secs_f64(),
                    self.expected_dimensions
                );
                Ok(())
            }
            Err(e) => {
                self.state.store(ModelState::Failed.as_u8(), Ordering::Release);
                error!("❌ Failed to load model {}: {}", self.model_name, e);
                Err(e)
            }
        }
    }

    pub fn state(&self) -> ModelState {
        ModelState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_ready(&self) -> bool {
        self.state() == ModelState::Ready
    }

    /// Model identifier served by this process
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Vector length; the loaded model's once ready, the identifier's
    /// declared dimension before that.
    pub fn dimensions(&self) -> usize {
        self.model()
            .map(|m| m.dimension())
            .unwrap_or(self.expected_dimensions)
    }

    /// How long the successful load took
    pub fn load_duration(&self) -> Option<Duration> {
        self.loaded.get().map(|l| l.load_duration)
    }

    fn model(&self) -> Option<&Arc<dyn EmbeddingModel>> {
        if !self.is_ready() {
            return None;
        }
        self.loaded.get().map(|l| &l.model)
    }

    /// Encodes one text. Blocks for the duration of the computation.
    pub fn encode_one(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let model = self.model().ok_or(EmbeddingError::NotReady)?;
        let vector = model.encode_one(text)?;
        self.check_dimension(0, &vector)?;
        Ok(vector)
    }

    /// Encodes all texts in one batched model call; `output[i]` belongs to
    /// `texts[i]`. Blocks for the duration of the computation.
    pub fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let model = self.model().ok_or(EmbeddingError::NotReady)?;
        let vectors = model.encode_batch(texts)?;

        if vectors.len() != texts.len() {
            return Err(EmbeddingError::EncodingFailure(format!(
                "model returned {} vectors for {} texts",
                vectors.len(),
                texts.len()
            )));
        }
        for (index, vector) in vectors.iter().enumerate() {
            self.check_dimension(index, vector)?;
        }
        Ok(vectors)
    }

    fn check_dimension(&self, index: usize, vector: &[f32]) -> Result<(), EmbeddingError> {
        let expected = self.dimensions();
        if vector.len() != expected {
            return Err(EmbeddingError::EncodingFailure(format!(
                "vector {} has {} dimensions (expected {})",
                index,
                vector.len(),
                expected
            )));
        }
        Ok(())
    }
}
