// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! POST /embed, POST /embed/batch and GET /model/info against a loaded model

use crate::common::{
    app, app_with_limits, failing_holder, get, post_json, ready_holder, send, StubModel,
};
use axum::http::StatusCode;
use embedding_service::api::RequestLimits;
use embedding_service::MODEL_NAME;
use serde_json::json;
use std::sync::atomic::Ordering;

#[tokio::test]
async fn test_embed_single_text() {
    let (holder, _) = ready_holder().await;

    let res = send(app(holder, None), post_json("/embed", json!({"text": "hello"}), None)).await;

    assert_eq!(res.status, StatusCode::OK);
    let body = res.json();
    assert_eq!(body["embedding"].as_array().unwrap().len(), 1024);
    assert_eq!(body["dimensions"], 1024);
    assert_eq!(body["model"], MODEL_NAME);
}

#[tokio::test]
async fn test_embed_length_matches_model_info() {
    let (holder, _) = ready_holder().await;

    let info = send(app(holder.clone(), None), get("/model/info", None)).await.json();
    let embed = send(
        app(holder, None),
        post_json("/embed", json!({"text": "¿Dónde está la biblioteca?"}), None),
    )
    .await
    .json();

    assert_eq!(info["loaded"], true);
    assert_eq!(info["name"], MODEL_NAME);
    assert_eq!(info["languages"], "100+");
    assert_eq!(
        embed["embedding"].as_array().unwrap().len() as u64,
        info["dimensions"].as_u64().unwrap()
    );
}

#[tokio::test]
async fn test_embed_same_text_twice_same_length() {
    let (holder, _) = ready_holder().await;

    let first = send(app(holder.clone(), None), post_json("/embed", json!({"text": "repeat"}), None))
        .await
        .json();
    let second = send(app(holder, None), post_json("/embed", json!({"text": "repeat"}), None))
        .await
        .json();

    assert_eq!(
        first["embedding"].as_array().unwrap().len(),
        second["embedding"].as_array().unwrap().len()
    );
}

#[tokio::test]
async fn test_batch_returns_one_vector_per_text_in_order() {
    let (holder, _) = ready_holder().await;
    let stub = StubModel::new();

    let res = send(
        app(holder, None),
        post_json("/embed/batch", json!({"texts": ["a", "b", "c"]}), None),
    )
    .await;

    assert_eq!(res.status, StatusCode::OK);
    let body = res.json();
    let embeddings = body["embeddings"].as_array().unwrap();
    assert_eq!(embeddings.len(), 3);
    assert_eq!(body["dimensions"], 1024);
    assert_eq!(body["model"], MODEL_NAME);

    for (vector, text) in embeddings.iter().zip(["a", "b", "c"]) {
        let vector: Vec<f32> = serde_json::from_value(vector.clone()).unwrap();
        assert_eq!(vector.len(), 1024);
        assert_eq!(vector, stub.vector_for(text), "vector for {} out of place", text);
    }
}

#[tokio::test]
async fn test_batch_makes_one_model_call() {
    let (holder, calls) = ready_holder().await;
    let texts: Vec<String> = (0..25).map(|i| format!("document {}", i)).collect();

    let res = send(
        app(holder, None),
        post_json("/embed/batch", json!({ "texts": texts }), None),
    )
    .await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["embeddings"].as_array().unwrap().len(), 25);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_empty_text_is_invalid_input() {
    let (holder, calls) = ready_holder().await;

    for text in ["", "   "] {
        let res = send(app(holder.clone(), None), post_json("/embed", json!({ "text": text }), None)).await;
        assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
        let body = res.json();
        assert_eq!(body["error"], "invalid_input");
        assert_eq!(body["details"]["field"], "text");
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_empty_batch_is_invalid_input() {
    let (holder, calls) = ready_holder().await;

    let res = send(app(holder, None), post_json("/embed/batch", json!({"texts": []}), None)).await;

    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(res.json()["error"], "invalid_input");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_blank_item_in_batch_is_invalid_input() {
    let (holder, _) = ready_holder().await;

    let res = send(
        app(holder, None),
        post_json("/embed/batch", json!({"texts": ["ok", ""]}), None),
    )
    .await;

    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(res.json()["details"]["field"], "texts[1]");
}

#[tokio::test]
async fn test_oversized_batch_is_rejected_before_encoding() {
    let (holder, calls) = ready_holder().await;
    let app = app_with_limits(holder, None, RequestLimits { max_batch_size: 2 });

    let res = send(app, post_json("/embed/batch", json!({"texts": ["a", "b", "c"]}), None)).await;

    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(res.json()["message"]
        .as_str()
        .unwrap()
        .contains("more than 2 items"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_malformed_bodies_are_invalid_input() {
    let (holder, _) = ready_holder().await;

    let missing_field = send(app(holder.clone(), None), post_json("/embed", json!({"txt": "x"}), None)).await;
    assert_eq!(missing_field.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(missing_field.json()["error"], "invalid_input");

    let wrong_type = send(app(holder.clone(), None), post_json("/embed/batch", json!({"texts": "x"}), None)).await;
    assert_eq!(wrong_type.status, StatusCode::UNPROCESSABLE_ENTITY);

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/embed")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();
    let broken = send(app(holder, None), request).await;
    assert_eq!(broken.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(broken.json()["details"]["field"], "body");
}

#[tokio::test]
async fn test_encoding_failure_is_internal_error_and_service_survives() {
    let holder = failing_holder().await;

    let res = send(app(holder.clone(), None), post_json("/embed", json!({"text": "hello"}), None)).await;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    let body = res.json();
    assert_eq!(body["error"], "internal_error");
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Failed to generate embedding"));

    let batch = send(
        app(holder.clone(), None),
        post_json("/embed/batch", json!({"texts": ["a"]}), None),
    )
    .await;
    assert_eq!(batch.status, StatusCode::INTERNAL_SERVER_ERROR);

    let health = send(app(holder, None), get("/health", None)).await;
    assert_eq!(health.status, StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let (holder, _) = ready_holder().await;

    let res = send(app(holder, None), get("/v1/embeddings", None)).await;

    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.json()["error"], "not_found");
}

#[tokio::test]
async fn test_wrong_method_uses_error_envelope() {
    let (holder, calls) = ready_holder().await;

    let res = send(app(holder.clone(), None), get("/embed", None)).await;
    assert_eq!(res.status, StatusCode::METHOD_NOT_ALLOWED);
    let body = res.json();
    assert_eq!(body["error"], "method_not_allowed");
    assert!(body["message"].as_str().unwrap().contains("/embed"));

    let res = send(app(holder, None), post_json("/health", json!({}), None)).await;
    assert_eq!(res.status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(res.json()["error"], "method_not_allowed");

    assert_eq!(calls.load(Ordering::SeqCst), 0);
}
