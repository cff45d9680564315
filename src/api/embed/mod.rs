// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Embedding API Module
//!
//! POST /embed (one text) and POST /embed/batch (many texts, one model call).

pub mod handler;
pub mod request;
pub mod response;

pub use handler::{embed_batch_handler, embed_handler};
pub use request::{EmbedBatchRequest, EmbedRequest, DEFAULT_MAX_BATCH_SIZE};
pub use response::{EmbedBatchResponse, EmbedResponse};
