// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Response bodies for the embedding endpoints

use serde::{Deserialize, Serialize};

/// Response body for POST /embed
///
/// ```json
/// { "embedding": [0.01, -0.02, ...], "dimensions": 1024, "model": "intfloat/multilingual-e5-large" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbedResponse {
    pub embedding: Vec<f32>,
    pub dimensions: usize,
    pub model: String,
}

impl EmbedResponse {
    pub fn new(embedding: Vec<f32>, model: impl Into<String>) -> Self {
        Self {
            dimensions: embedding.len(),
            embedding,
            model: model.into(),
        }
    }
}

/// Response body for POST /embed/batch
///
/// `embeddings[i]` is the vector for `texts[i]` of the request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbedBatchResponse {
    pub embeddings: Vec<Vec<f32>>,
    pub dimensions: usize,
    pub model: String,
}

impl EmbedBatchResponse {
    /// Reports the first vector's length as the batch dimension (all vectors
    /// share it); an empty result reports 0.
    pub fn new(embeddings: Vec<Vec<f32>>, model: impl Into<String>) -> Self {
        Self {
            dimensions: embeddings.first().map(Vec::len).unwrap_or(0),
            embeddings,
            model: model.into(),
        }
    }

    pub fn embedding_count(&self) -> usize {
        self.embeddings.len()
    }
}
