// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Model file discovery
//!
//! Model weights come either from a directory prepared by the operator or
//! from the HuggingFace Hub, downloaded once into the local cache.

use crate::embeddings::LoadError;
use hf_hub::api::tokio::{ApiBuilder, ApiRepo};
use std::path::{Path, PathBuf};
use tracing::info;

const ONNX_FILE: &str = "model.onnx";
const ONNX_DATA_FILE: &str = "model.onnx_data";
const TOKENIZER_FILE: &str = "tokenizer.json";

// The ONNX export of multilingual-e5-large exceeds the 2GB protobuf limit,
// so its weights live in an external data file next to the graph.
const HUB_ONNX_FILE: &str = "onnx/model.onnx";
const HUB_ONNX_DATA_FILE: &str = "onnx/model.onnx_data";

/// Where the model files are loaded from
#[derive(Debug, Clone, PartialEq)]
pub enum ModelSource {
    /// Directory containing `model.onnx` and `tokenizer.json`
    LocalDir(PathBuf),
    /// HuggingFace Hub repository, with an optional cache directory override
    Hub {
        repo_id: String,
        cache_dir: Option<PathBuf>,
    },
}

/// Resolved on-disk paths for one model
#[derive(Debug, Clone, PartialEq)]
pub struct ModelFiles {
    pub model_path: PathBuf,
    pub tokenizer_path: PathBuf,
}

impl ModelSource {
    /// Returns local paths for the model graph and tokenizer, downloading
    /// them first when the source is the hub.
    pub async fn resolve(&self) -> Result<ModelFiles, LoadError> {
        match self {
            ModelSource::LocalDir(dir) => Self::resolve_local(dir),
            ModelSource::Hub { repo_id, cache_dir } => {
                Self::resolve_hub(repo_id, cache_dir.as_deref()).await
            }
        }
    }

    fn resolve_local(dir: &Path) -> Result<ModelFiles, LoadError> {
        let model_path = dir.join(ONNX_FILE);
        let tokenizer_path = dir.join(TOKENIZER_FILE);

        if !model_path.is_file() {
            return Err(LoadError::ModelFiles(format!(
                "ONNX model file not found: {}",
                model_path.display()
            )));
        }
        if !tokenizer_path.is_file() {
            return Err(LoadError::ModelFiles(format!(
                "Tokenizer file not found: {}",
                tokenizer_path.display()
            )));
        }
        if dir.join(ONNX_DATA_FILE).is_file() {
            info!("   Found external weights file {}", ONNX_DATA_FILE);
        }

        Ok(ModelFiles {
            model_path,
            tokenizer_path,
        })
    }

    async fn resolve_hub(repo_id: &str, cache_dir: Option<&Path>) -> Result<ModelFiles, LoadError> {
        let mut builder = ApiBuilder::new().with_progress(false);
        if let Some(dir) = cache_dir {
            builder = builder.with_cache_dir(dir.to_path_buf());
        }
        let api = builder
            .build()
            .map_err(|e| LoadError::ModelFiles(format!("Failed to initialise hub client: {}", e)))?;
        let repo = api.model(repo_id.to_string());

        info!("📥 Fetching {} from HuggingFace Hub (cached after first run)", repo_id);

        let tokenizer_path = fetch(&repo, repo_id, TOKENIZER_FILE).await?;
        fetch(&repo, repo_id, HUB_ONNX_DATA_FILE).await?;
        let model_path = fetch(&repo, repo_id, HUB_ONNX_FILE).await?;

        Ok(ModelFiles {
            model_path,
            tokenizer_path,
        })
    }
}

async fn fetch(repo: &ApiRepo, repo_id: &str, file: &str) -> Result<PathBuf, LoadError> {
    repo.get(file)
        .await
        .map_err(|e| LoadError::ModelFiles(format!("Failed to fetch {}/{}: {}", repo_id, file, e)))
}
