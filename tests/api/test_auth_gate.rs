// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Bearer-token gate in front of every route except /health

use crate::common::{app, get, post_json, ready_holder, send};
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::json;
use std::sync::atomic::Ordering;

const SECRET: &str = "S";

#[tokio::test]
async fn test_matching_token_is_admitted() {
    let (holder, _) = ready_holder().await;

    let res = send(
        app(holder, Some(SECRET)),
        post_json("/embed", json!({"text": "hello"}), Some(SECRET)),
    )
    .await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["embedding"].as_array().unwrap().len(), 1024);
}

#[tokio::test]
async fn test_wrong_token_is_unauthorized() {
    let (holder, calls) = ready_holder().await;

    let res = send(
        app(holder, Some(SECRET)),
        post_json("/embed", json!({"text": "hello"}), Some("wrong")),
    )
    .await;

    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.json()["error"], "unauthorized");
    assert_eq!(calls.load(Ordering::SeqCst), 0, "handler must not run");
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let (holder, calls) = ready_holder().await;

    let embed = send(
        app(holder.clone(), Some(SECRET)),
        post_json("/embed/batch", json!({"texts": ["a"]}), None),
    )
    .await;
    assert_eq!(embed.status, StatusCode::UNAUTHORIZED);

    let info = send(app(holder, Some(SECRET)), get("/model/info", None)).await;
    assert_eq!(info.status, StatusCode::UNAUTHORIZED);

    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_malformed_credentials_are_unauthorized() {
    let (holder, _) = ready_holder().await;

    for value in ["S", "bearer S", "Basic S", "Bearer"] {
        let request = Request::builder()
            .method("GET")
            .uri("/model/info")
            .header(header::AUTHORIZATION, value)
            .body(Body::empty())
            .unwrap();
        let res = send(app(holder.clone(), Some(SECRET)), request).await;
        assert_eq!(res.status, StatusCode::UNAUTHORIZED, "credential {:?}", value);
    }
}

#[tokio::test]
async fn test_health_needs_no_token() {
    let (holder, _) = ready_holder().await;

    let res = send(app(holder, Some(SECRET)), get("/health", None)).await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["status"], "healthy");
}

#[tokio::test]
async fn test_open_mode_admits_requests_without_token() {
    let (holder, _) = ready_holder().await;

    let embed = send(app(holder.clone(), None), post_json("/embed", json!({"text": "hello"}), None)).await;
    assert_eq!(embed.status, StatusCode::OK);

    let info = send(app(holder, None), get("/model/info", Some("anything"))).await;
    assert_eq!(info.status, StatusCode::OK);
}

#[tokio::test]
async fn test_rejection_still_carries_cors_headers() {
    let (holder, _) = ready_holder().await;

    let res = send(app(holder, Some(SECRET)), get("/model/info", None)).await;

    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}
