// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! ONNX model tests against real multilingual-e5-large files.
//!
//! Ignored by default; run with `--ignored` on a host that has the model
//! under `/workspace/models/multilingual-e5-large-onnx`.

use embedding_service::embeddings::{
    EmbeddingModel, LoadError, ModelSource, OnnxEmbeddingModel, OnnxModelOptions,
    MODEL_DIMENSIONS, MODEL_NAME,
};
use std::path::PathBuf;

const MODEL_DIR: &str = "/workspace/models/multilingual-e5-large-onnx";

async fn load() -> OnnxEmbeddingModel {
    OnnxEmbeddingModel::load(
        MODEL_NAME,
        ModelSource::LocalDir(PathBuf::from(MODEL_DIR)),
        OnnxModelOptions::default(),
    )
    .await
    .expect("Failed to load model")
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[tokio::test]
async fn test_missing_directory_is_model_files_error() {
    let dir = tempfile::tempdir().unwrap();

    let err = OnnxEmbeddingModel::load(
        MODEL_NAME,
        ModelSource::LocalDir(dir.path().join("absent")),
        OnnxModelOptions::default(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, LoadError::ModelFiles(_)), "got {:?}", err);
}

#[tokio::test]
#[ignore = "requires multilingual-e5-large ONNX files"]
async fn test_model_reports_1024_dimensions() {
    let model = load().await;
    assert_eq!(model.model_name(), MODEL_NAME);
    assert_eq!(model.dimension(), MODEL_DIMENSIONS);
}

#[tokio::test]
#[ignore = "requires multilingual-e5-large ONNX files"]
async fn test_vectors_are_unit_length() {
    let model = load().await;
    let vector = model.encode_one("query: how do I reset my password?").unwrap();

    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() < 1e-3, "norm was {}", norm);
}

#[tokio::test]
#[ignore = "requires multilingual-e5-large ONNX files"]
async fn test_batch_matches_single_encodes() {
    let model = load().await;
    let texts = vec![
        "short".to_string(),
        "a considerably longer sentence that forces padding in the batch".to_string(),
    ];

    let batch = model.encode_batch(&texts).unwrap();
    for (text, batched) in texts.iter().zip(&batch) {
        let single = model.encode_one(text).unwrap();
        assert!(cosine(&single, batched) > 0.999);
    }
}

#[tokio::test]
#[ignore = "requires multilingual-e5-large ONNX files"]
async fn test_translations_are_close() {
    let model = load().await;
    let texts = vec![
        "query: The weather is nice today".to_string(),
        "query: Hoy hace buen tiempo".to_string(),
        "query: Quarterly revenue exceeded projections".to_string(),
    ];

    let vectors = model.encode_batch(&texts).unwrap();
    let same_meaning = cosine(&vectors[0], &vectors[1]);
    let unrelated = cosine(&vectors[0], &vectors[2]);
    assert!(same_meaning > unrelated);
}

#[tokio::test]
#[ignore = "requires multilingual-e5-large ONNX files"]
async fn test_long_input_is_truncated() {
    let model = load().await;
    let long = "token ".repeat(2000);

    assert!(model.count_tokens(&long).unwrap() <= 512);
    assert_eq!(model.encode_one(&long).unwrap().len(), MODEL_DIMENSIONS);
}
