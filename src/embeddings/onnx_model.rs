// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! ONNX Embedding Model Wrapper
//!
//! Runs the multilingual-e5-large sentence transformer through ONNX Runtime.
//!
//! Features:
//! - ONNX model loading from disk (graph + optional external weights)
//! - GPU acceleration via CUDA (with automatic CPU fallback)
//! - XLM-RoBERTa tokenization with truncation to 512 tokens
//! - Single and batched embedding generation
//! - Attention-masked mean pooling followed by L2 normalization
//! - 1024-dimensional output vectors

use crate::embeddings::{EmbeddingError, EmbeddingModel, LoadError, ModelSource};
use anyhow::{anyhow, Context, Result};
use ndarray::{Array2, ArrayView2, Axis, Ix2, Ix3};
use ort::execution_providers::{CPUExecutionProvider, CUDAExecutionProvider};
use ort::session::builder::{GraphOptimizationLevel, SessionBuilder};
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokenizers::{Tokenizer, TruncationParams};
use tracing::{debug, info, warn};

/// Maximum sequence length accepted by XLM-RoBERTa based models
const MAX_SEQUENCE_LENGTH: usize = 512;

/// Intra-op threads used when nothing else is configured
pub const DEFAULT_INTRA_THREADS: usize = 4;

/// Options controlling how the runtime session is built
#[derive(Debug, Clone)]
pub struct OnnxModelOptions {
    /// Intra-op thread count for CPU execution
    pub intra_threads: usize,
}

impl Default for OnnxModelOptions {
    fn default() -> Self {
        Self {
            intra_threads: DEFAULT_INTRA_THREADS,
        }
    }
}

/// ONNX-based sentence embedding model
///
/// # Thread Safety
/// `Session::run` needs exclusive access, so the session sits behind a mutex
/// held for exactly one inference call. The tokenizer is shared read-only.
#[derive(Clone)]
pub struct OnnxEmbeddingModel {
    session: Arc<Mutex<Session>>,
    tokenizer: Arc<Tokenizer>,
    model_name: String,
    dimension: usize,
    pad_id: i64,
    /// Whether the exported graph declares a `token_type_ids` input
    uses_token_type_ids: bool,
}

impl std::fmt::Debug for OnnxEmbeddingModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxEmbeddingModel")
            .field("model_name", &self.model_name)
            .field("dimension", &self.dimension)
            .field("uses_token_type_ids", &self.uses_token_type_ids)
            .finish_non_exhaustive()
    }
}

impl OnnxEmbeddingModel {
    /// Resolves the model files and builds the session on the blocking pool.
    ///
    /// This is the slow path of startup (30-60s for multilingual-e5-large,
    /// longer on the first run while the hub download completes).
    pub async fn load(
        model_name: impl Into<String>,
        source: ModelSource,
        options: OnnxModelOptions,
    ) -> Result<Self, LoadError> {
        let model_name = model_name.into();
        let files = source.resolve().await?;

        tokio::task::spawn_blocking(move || {
            Self::new(model_name, &files.model_path, &files.tokenizer_path, &options)
        })
        .await
        .map_err(|e| LoadError::Runtime(format!("model loading task failed: {}", e)))?
    }

    /// Creates a model from disk paths, running a probe inference to learn
    /// the output dimension.
    ///
    /// # Errors
    /// - `LoadError::ModelFiles` if a file is missing
    /// - `LoadError::Tokenizer` if the tokenizer cannot be parsed or configured
    /// - `LoadError::Runtime` if ONNX Runtime rejects the graph or the probe fails
    pub fn new(
        model_name: impl Into<String>,
        model_path: &Path,
        tokenizer_path: &Path,
        options: &OnnxModelOptions,
    ) -> Result<Self, LoadError> {
        let model_name = model_name.into();

        if !model_path.exists() {
            return Err(LoadError::ModelFiles(format!(
                "ONNX model file not found: {}",
                model_path.display()
            )));
        }
        if !tokenizer_path.exists() {
            return Err(LoadError::ModelFiles(format!(
                "Tokenizer file not found: {}",
                tokenizer_path.display()
            )));
        }

        let session = build_session(model_path, options)
            .map_err(|e| LoadError::Runtime(format!("{:#}", e)))?;

        let mut tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| LoadError::Tokenizer(e.to_string()))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_SEQUENCE_LENGTH,
                ..Default::default()
            }))
            .map_err(|e| LoadError::Tokenizer(e.to_string()))?;
        // Batches are padded here, not by the tokenizer config.
        tokenizer.with_padding(None);

        let pad_id = tokenizer
            .token_to_id("<pad>")
            .or_else(|| tokenizer.token_to_id("[PAD]"))
            .unwrap_or(0) as i64;

        let uses_token_type_ids = session
            .inputs
            .iter()
            .any(|input| input.name == "token_type_ids");

        let mut model = Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
            model_name,
            dimension: 0,
            pad_id,
            uses_token_type_ids,
        };

        let probe = model
            .run_batch(&["validation test".to_string()])
            .map_err(|e| LoadError::Runtime(format!("probe inference failed: {:#}", e)))?;
        model.dimension = probe.first().map(Vec::len).unwrap_or(0);

        info!(
            "✅ ONNX embedding model ready: {} ({} dimensions)",
            model.model_name, model.dimension
        );

        Ok(model)
    }

    /// Tokenizes, pads to the longest sequence, and runs one inference for
    /// the whole batch.
    fn run_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| anyhow!("Tokenization failed: {}", e))?;

        let max_len = encodings
            .iter()
            .map(|enc| enc.get_ids().len())
            .max()
            .unwrap_or(0);
        if max_len == 0 {
            anyhow::bail!("Tokenizer produced no tokens");
        }
        let batch = texts.len();

        let mut input_ids = Vec::with_capacity(batch * max_len);
        let mut attention_mask = Vec::with_capacity(batch * max_len);

        for encoding in &encodings {
            let ids = encoding.get_ids();
            let padding = max_len - ids.len();

            input_ids.extend(ids.iter().map(|&id| id as i64));
            input_ids.extend(std::iter::repeat(self.pad_id).take(padding));

            attention_mask.extend(encoding.get_attention_mask().iter().map(|&m| m as i64));
            attention_mask.extend(std::iter::repeat(0i64).take(padding));
        }

        let mask_for_pooling = attention_mask.clone();

        let input_ids_array = Array2::from_shape_vec((batch, max_len), input_ids)
            .context("Failed to create batch input_ids array")?;
        let attention_mask_array = Array2::from_shape_vec((batch, max_len), attention_mask)
            .context("Failed to create batch attention_mask array")?;

        let mut inputs = ort::inputs![
            "input_ids" => Value::from_array(input_ids_array)?,
            "attention_mask" => Value::from_array(attention_mask_array)?
        ];
        if self.uses_token_type_ids {
            let token_type_ids = Array2::<i64>::zeros((batch, max_len));
            inputs.push((
                "token_type_ids".into(),
                Value::from_array(token_type_ids)?.into(),
            ));
        }

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow!("inference session lock poisoned"))?;
        let outputs = session.run(inputs)?;

        // Index [0] rather than by name: exports differ in their output naming.
        let output = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract output tensor")?;

        let mut embeddings = match output.ndim() {
            // [batch, seq_len, hidden]: token embeddings, pool them here
            3 => {
                let hidden = output
                    .view()
                    .into_dimensionality::<Ix3>()
                    .context("Unexpected output tensor layout")?;
                mask_for_pooling
                    .chunks(max_len)
                    .enumerate()
                    .map(|(i, mask)| mean_pool(hidden.index_axis(Axis(0), i), mask))
                    .collect::<Vec<_>>()
            }
            // [batch, hidden]: the graph already pooled
            2 => {
                let pooled = output
                    .view()
                    .into_dimensionality::<Ix2>()
                    .context("Unexpected output tensor layout")?;
                pooled.outer_iter().map(|row| row.to_vec()).collect()
            }
            n => anyhow::bail!("Model outputs unexpected rank {} tensor", n),
        };

        for embedding in &mut embeddings {
            l2_normalize(embedding);
        }

        debug!("Encoded batch of {} texts (padded to {} tokens)", batch, max_len);

        Ok(embeddings)
    }

    /// Counts tokens (after truncation) in a text string
    pub fn count_tokens(&self, text: &str) -> Result<usize> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow!("Tokenization failed: {}", e))?;
        Ok(encoding.get_attention_mask().iter().map(|&m| m as usize).sum())
    }
}

impl EmbeddingModel for OnnxEmbeddingModel {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.run_batch(texts)
            .map_err(|e| EmbeddingError::EncodingFailure(e.to_string()))
    }
}

fn build_session(model_path: &Path, options: &OnnxModelOptions) -> Result<Session> {
    info!("🚀 Initializing ONNX embedding model from {}", model_path.display());
    info!("   Attempting CUDA execution provider...");

    let cuda = configure(Session::builder()?, options)?
        .with_execution_providers([CUDAExecutionProvider::default().build()])
        .context("Failed to set CUDA execution provider")?
        .commit_from_file(model_path);

    match cuda {
        Ok(session) => {
            info!("✅ CUDA execution provider initialized successfully!");
            Ok(session)
        }
        Err(e) => {
            warn!("⚠️  CUDA execution provider failed: {}", e);
            warn!("   Falling back to CPU execution provider");
            configure(Session::builder()?, options)?
                .with_execution_providers([CPUExecutionProvider::default().build()])
                .context("Failed to set CPU execution provider")?
                .commit_from_file(model_path)
                .with_context(|| format!("Failed to load ONNX model from {}", model_path.display()))
        }
    }
}

fn configure(builder: SessionBuilder, options: &OnnxModelOptions) -> Result<SessionBuilder> {
    builder
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .context("Failed to set optimization level")?
        .with_intra_threads(options.intra_threads)
        .context("Failed to set intra threads")
}

/// Averages token vectors, ignoring positions whose mask is zero.
fn mean_pool(tokens: ArrayView2<'_, f32>, mask: &[i64]) -> Vec<f32> {
    let hidden = tokens.shape()[1];
    let mut pooled = vec![0.0f32; hidden];
    let mut sum_mask = 0.0f32;

    for (row, &m) in tokens.outer_iter().zip(mask) {
        let weight = m as f32;
        sum_mask += weight;
        for (acc, value) in pooled.iter_mut().zip(row.iter()) {
            *acc += value * weight;
        }
    }

    for value in &mut pooled {
        *value /= sum_mask.max(1e-9);
    }
    pooled
}

fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
}
