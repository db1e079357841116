// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-user session tests: walk tracking, dogs and notifications.

use axum::http::StatusCode;
use serde_json::{json, Value};

mod common;

#[tokio::test]
async fn test_walk_lifecycle() {
    let (app, state) = common::create_test_app();
    let token = common::token_for(&state, "alice");

    let (status, body) = common::send(&app, common::authed("GET", "/api/walk", &token, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "idle");
    assert_eq!(body["elapsed"], "0:00");

    let (status, body) = common::send(&app, common::authed("POST", "/api/walk/end", &token, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");

    let (status, body) = common::send(&app, common::authed("POST", "/api/walk/start", &token, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "active");
    assert!(body["started_at"].is_string());
    assert_eq!(body["stats"]["steps"], 0);

    let (_, body) = common::send(&app, common::authed("GET", "/api/walk", &token, None)).await;
    assert_eq!(body["state"], "active");

    let (status, body) = common::send(&app, common::authed("POST", "/api/walk/end", &token, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "idle");
    assert!(body["stats"]["duration"].is_u64());

    // Sessions are per user
    let other = common::token_for(&state, "bob");
    let (_, body) = common::send(&app, common::authed("GET", "/api/walk", &other, None)).await;
    assert_eq!(body["state"], "idle");
}

#[tokio::test]
async fn test_walk_end_fans_out_duration() {
    let (app, state) = common::create_test_app();
    common::befriend(&app, &state, "alice", "bob").await;
    let alice = common::token_for(&state, "alice");
    let bob = common::token_for(&state, "bob");

    common::send(&app, common::authed("POST", "/api/walk/start", &alice, None)).await;
    common::send(&app, common::authed("POST", "/api/walk/end", &alice, None)).await;

    let (_, feed) = common::send(&app, common::authed("GET", "/api/feed/activities", &bob, None)).await;
    let ended: Vec<&Value> = feed
        .as_array()
        .unwrap()
        .iter()
        .filter(|a| a["activity_type"] == "walk_ended")
        .collect();
    assert_eq!(ended.len(), 1);
    assert_eq!(ended[0]["activity_data"]["duration"], "0:00");
    assert_eq!(ended[0]["text"], "alice finished a walk for 0:00");
}

#[tokio::test]
async fn test_dog_crud() {
    let (app, state) = common::create_test_app();
    let token = common::token_for(&state, "alice");

    let (status, dogs) = common::send(&app, common::authed("GET", "/api/dogs", &token, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(dogs.as_array().unwrap().is_empty());

    let (status, dog) = common::send(
        &app,
        common::authed(
            "POST",
            "/api/dogs",
            &token,
            Some(json!({
                "name": "Biscuit",
                "breed": "Corgi",
                "age": "3 years",
                "size": "Small",
                "personality": ["Playful"],
                "vaccinated": true,
                "spayedNeutered": true,
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(dog["name"], "Biscuit");
    let uri = format!("/api/dogs/{}", dog["id"].as_str().unwrap());

    let (status, updated) = common::send(
        &app,
        common::authed("PUT", &uri, &token, Some(json!({ "age": "4 years" }))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["age"], "4 years");
    assert_eq!(updated["breed"], "Corgi");

    let (status, fetched) = common::send(&app, common::authed("GET", &uri, &token, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, updated);

    let (status, _) = common::send(&app, common::authed("DELETE", &uri, &token, None)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = common::send(&app, common::authed("GET", &uri, &token, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let (status, _) = common::send(&app, common::authed("DELETE", &uri, &token, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_dog_validation() {
    let (app, state) = common::create_test_app();
    let token = common::token_for(&state, "alice");

    let (status, _) = common::send(
        &app,
        common::authed("POST", "/api/dogs", &token, Some(json!({ "name": "", "size": "Large" }))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_notifications() {
    let (app, state) = common::create_test_app();
    let token = common::token_for(&state, "alice");

    let (status, body) = common::send(&app, common::authed("GET", "/api/notifications", &token, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["unread_count"], 2);
    let notifications = body["notifications"].as_array().unwrap();
    assert_eq!(notifications.len(), 2);
    assert_eq!(notifications[0]["id"], "1");

    let (status, _) = common::send(&app, common::authed("POST", "/api/notifications/1/read", &token, None)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = common::send(&app, common::authed("DELETE", "/api/notifications/2", &token, None)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = common::send(&app, common::authed("GET", "/api/notifications", &token, None)).await;
    assert_eq!(body["unread_count"], 0);
    assert_eq!(body["notifications"].as_array().unwrap().len(), 1);
    assert_eq!(body["notifications"][0]["read"], true);

    let (status, _) = common::send(&app, common::authed("POST", "/api/notifications/2/read", &token, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = common::send(&app, common::authed("DELETE", "/api/notifications/99", &token, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_added_notification_is_unread_at_top() {
    let (app, state) = common::create_test_app();
    let token = common::token_for(&state, "alice");

    let (status, added) = common::send(
        &app,
        common::authed(
            "POST",
            "/api/notifications",
            &token,
            Some(json!({
                "type": "walk_joined",
                "title": "Walk Joined",
                "message": "Bob joined your walk",
                "from": "Bob",
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(added["id"], "3");
    assert_eq!(added["time"], "Now");
    assert_eq!(added["read"], false);

    let (_, body) = common::send(&app, common::authed("GET", "/api/notifications", &token, None)).await;
    assert_eq!(body["unread_count"], 3);
    assert_eq!(body["notifications"][0]["id"], "3");

    let (status, _) = common::send(
        &app,
        common::authed(
            "POST",
            "/api/notifications",
            &token,
            Some(json!({ "type": "walk_ended", "title": "", "message": "x" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
