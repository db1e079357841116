// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request, Response};
use packwalk::config::Config;
use packwalk::db::{BackendDb, MemoryStore};
use packwalk::middleware::auth::create_jwt;
use packwalk::routes::create_router;
use packwalk::services::{ChangeHub, LocalStore};
use packwalk::AppState;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

/// Create a test app backed by the in-memory store and an in-memory cache.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let changes = ChangeHub::new();
    let db = BackendDb::memory(changes.clone());
    let state = Arc::new(AppState::with_parts(
        config,
        db,
        changes,
        Arc::new(LocalStore::memory()),
    ));

    (create_router(state.clone()), state)
}

/// The in-memory store behind a test app.
#[allow(dead_code)]
pub fn memory_store(state: &AppState) -> &Arc<MemoryStore> {
    state
        .db
        .memory_store()
        .expect("test app uses the memory backend")
}

/// Access token for `user_id`, signed with the test secret.
#[allow(dead_code)]
pub fn token_for(state: &AppState, user_id: &str) -> String {
    let email = format!("{}@example.com", user_id);
    create_jwt(
        user_id,
        Some(email.as_str()),
        None,
        &state.config.jwt_secret,
    )
    .expect("Failed to create test token")
}

/// Build an authenticated request with an optional JSON body.
#[allow(dead_code)]
pub fn authed(method: &str, uri: &str, token: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token));

    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Send a request and decode the JSON response body (Null when empty).
#[allow(dead_code)]
pub async fn send(app: &axum::Router, request: Request<Body>) -> (axum::http::StatusCode, Value) {
    let response: Response<Body> = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

/// Make `a` and `b` accepted friends through the API.
#[allow(dead_code)]
pub async fn befriend(app: &axum::Router, state: &AppState, a: &str, b: &str) {
    let token_a = token_for(state, a);
    let token_b = token_for(state, b);

    // Both need profiles before a request can be addressed to them
    send(app, authed("GET", "/api/me", &token_a, None)).await;
    send(app, authed("GET", "/api/me", &token_b, None)).await;

    let (status, _) = send(
        app,
        authed(
            "POST",
            "/api/friends/requests",
            &token_a,
            Some(serde_json::json!({ "friend_id": b })),
        ),
    )
    .await;
    assert_eq!(status, 201);

    let (status, _) = send(
        app,
        authed(
            "POST",
            &format!("/api/friends/requests/{}/accept", a),
            &token_b,
            None,
        ),
    )
    .await;
    assert_eq!(status, 200);
}
