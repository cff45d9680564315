// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Request bodies for POST /embed and POST /embed/batch
//!
//! Both carry plain text; validation rejects blank input before any model
//! work is scheduled.

use crate::api::ApiError;
use axum::extract::rejection::JsonRejection;
use serde::{Deserialize, Serialize};

/// Default upper bound on texts per batch request
pub const DEFAULT_MAX_BATCH_SIZE: usize = 256;

/// Request body for POST /embed
///
/// ```json
/// { "text": "Hello world" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedRequest {
    pub text: String,
}

impl EmbedRequest {
    /// Rejects empty or whitespace-only text.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.text.trim().is_empty() {
            return Err(ApiError::invalid_input(
                "text",
                "text cannot be empty or contain only whitespace",
            ));
        }
        Ok(())
    }
}

/// Request body for POST /embed/batch
///
/// ```json
/// { "texts": ["first", "second"] }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedBatchRequest {
    pub texts: Vec<String>,
}

impl EmbedBatchRequest {
    /// # Validation Rules
    /// 1. **texts**: 1..=`max_batch_size` items
    /// 2. **items**: none may be empty or whitespace-only
    pub fn validate(&self, max_batch_size: usize) -> Result<(), ApiError> {
        if self.texts.is_empty() {
            return Err(ApiError::invalid_input(
                "texts",
                "texts array must contain at least 1 item",
            ));
        }

        if self.texts.len() > max_batch_size {
            return Err(ApiError::invalid_input(
                "texts",
                format!(
                    "texts array cannot contain more than {} items (got {})",
                    max_batch_size,
                    self.texts.len()
                ),
            ));
        }

        if let Some(index) = self.texts.iter().position(|t| t.trim().is_empty()) {
            return Err(ApiError::invalid_input(
                format!("texts[{}]", index),
                "text cannot be empty or contain only whitespace",
            ));
        }

        Ok(())
    }
}

/// Converts axum's body rejection (bad JSON, wrong content type, missing
/// field) into the service's own error envelope.
pub fn body_rejection(rejection: JsonRejection) -> ApiError {
    ApiError::invalid_input("body", rejection.body_text())
}
