// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Change webhook tests.
//!
//! These tests verify that:
//! 1. Unsigned or mis-signed deliveries are rejected
//! 2. Unparseable deliveries are acknowledged and dropped
//! 3. Valid deliveries reach live subscriptions

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use packwalk::middleware::webhook_auth::{sign_body, SIGNATURE_HEADER};
use packwalk::services::realtime::{ChangeKind, RowFilter};
use serde_json::json;
use std::time::Duration;
use tower::ServiceExt;

mod common;

fn delivery(body: &str, signature: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/webhook/changes")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(signature) = signature {
        builder = builder.header(SIGNATURE_HEADER, signature);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn check_in_insert() -> String {
    json!({
        "type": "INSERT",
        "table": "check_ins",
        "schema": "public",
        "record": {
            "id": "c-42",
            "user_id": "alice",
            "location_name": "Bernal Heights",
            "location_type": "park",
            "latitude": 37.7436,
            "longitude": -122.4147,
            "is_public": true,
            "created_at": "2026-03-01T10:00:00Z"
        },
        "old_record": null
    })
    .to_string()
}

#[tokio::test]
async fn test_missing_signature_rejected() {
    let (app, _) = common::create_test_app();

    let response = app.oneshot(delivery(&check_in_insert(), None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_bad_signature_rejected() {
    let (app, state) = common::create_test_app();
    let body = check_in_insert();

    let mut sub = state.changes.subscribe("check_ins", ChangeKind::Insert, None);

    let forged = sign_body(body.as_bytes(), b"wrong_secret").unwrap();
    let response = app.oneshot(delivery(&body, Some(&forged))).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Nothing was published
    let waited = tokio::time::timeout(Duration::from_millis(50), sub.next()).await;
    assert!(waited.is_err());
}

#[tokio::test]
async fn test_unparseable_delivery_acknowledged() {
    let (app, state) = common::create_test_app();
    let body = r#"{"type":"TRUNCATE","table":"check_ins"}"#;

    let signature = sign_body(body.as_bytes(), &state.config.webhook_secret).unwrap();
    let response = app.oneshot(delivery(body, Some(&signature))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_signed_delivery_published() {
    let (app, state) = common::create_test_app();
    let body = check_in_insert();

    let mut sub = state.changes.subscribe(
        "check_ins",
        ChangeKind::Insert,
        Some(RowFilter::eq("is_public", "true")),
    );

    let signature = sign_body(body.as_bytes(), &state.config.webhook_secret).unwrap();
    let response = app.oneshot(delivery(&body, Some(&signature))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let event = tokio::time::timeout(Duration::from_secs(1), sub.next())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(event.record["id"], "c-42");
    assert_eq!(event.kind, ChangeKind::Insert);
}

#[tokio::test]
async fn test_delete_publishes_old_row() {
    let (app, state) = common::create_test_app();
    let body = json!({
        "type": "DELETE",
        "table": "friends",
        "schema": "public",
        "record": null,
        "old_record": { "user_id": "alice", "friend_id": "bob", "status": "accepted" }
    })
    .to_string();

    let mut sub = state.changes.subscribe("friends", ChangeKind::Delete, None);

    let signature = sign_body(body.as_bytes(), &state.config.webhook_secret).unwrap();
    let response = app.oneshot(delivery(&body, Some(&signature))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let event = tokio::time::timeout(Duration::from_secs(1), sub.next())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(event.record["friend_id"], "bob");
}

#[tokio::test]
async fn test_other_schemas_ignored() {
    let (app, state) = common::create_test_app();
    let body = json!({
        "type": "INSERT",
        "table": "check_ins",
        "schema": "audit",
        "record": { "id": "x" },
        "old_record": null
    })
    .to_string();

    let mut sub = state.changes.subscribe("check_ins", ChangeKind::Insert, None);

    let signature = sign_body(body.as_bytes(), &state.config.webhook_secret).unwrap();
    let response = app.oneshot(delivery(&body, Some(&signature))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let waited = tokio::time::timeout(Duration::from_millis(50), sub.next()).await;
    assert!(waited.is_err());
}
