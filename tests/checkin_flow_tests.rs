// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Check-in flow tests: creation, privacy, activity fan-out and the local
//! fallback when the backend is unreachable.

use axum::http::StatusCode;
use serde_json::{json, Value};

mod common;

fn park_draft(name: &str, is_public: bool) -> Value {
    json!({
        "location_name": name,
        "location_type": "park",
        "latitude": 37.7694,
        "longitude": -122.4862,
        "notes": "Lots of squirrels",
        "is_public": is_public,
    })
}

#[tokio::test]
async fn test_check_in_round_trip() {
    let (app, state) = common::create_test_app();
    let token = common::token_for(&state, "alice");

    let (status, body) = common::send(
        &app,
        common::authed("POST", "/api/checkins", &token, Some(park_draft("Golden Gate Park", true))),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["saved_locally"], false);
    assert_eq!(body["check_in"]["name"], "Golden Gate Park");
    assert_eq!(body["check_in"]["type"], "park");
    let id = body["check_in"]["id"].as_str().unwrap().to_string();
    assert!(!id.starts_with("local-"));

    let (status, body) = common::send(&app, common::authed("GET", "/api/checkins", &token, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["from_cache"], false);
    let check_ins = body["check_ins"].as_array().unwrap();
    assert_eq!(check_ins.len(), 1);
    assert_eq!(check_ins[0]["id"], id.as_str());
    assert_eq!(check_ins[0]["notes"], "Lots of squirrels");

    // The author's profile was created on the way
    let (_, me) = common::send(&app, common::authed("GET", "/api/me", &token, None)).await;
    assert_eq!(me["full_name"], "alice");
}

#[tokio::test]
async fn test_check_in_requires_location() {
    let (app, state) = common::create_test_app();
    let token = common::token_for(&state, "alice");

    let (status, body) = common::send(
        &app,
        common::authed(
            "POST",
            "/api/checkins",
            &token,
            Some(json!({ "location_name": "Somewhere" })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "location_unavailable");
}

#[tokio::test]
async fn test_check_in_validation() {
    let (app, state) = common::create_test_app();
    let token = common::token_for(&state, "alice");

    let mut draft = park_draft("", true);
    let (status, _) = common::send(&app, common::authed("POST", "/api/checkins", &token, Some(draft.clone()))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    draft["location_name"] = json!("Park");
    draft["latitude"] = json!(123.0);
    let (status, _) = common::send(&app, common::authed("POST", "/api/checkins", &token, Some(draft))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_private_check_ins_stay_private() {
    let (app, state) = common::create_test_app();
    common::befriend(&app, &state, "alice", "bob").await;
    let alice = common::token_for(&state, "alice");
    let bob = common::token_for(&state, "bob");
    let carol = common::token_for(&state, "carol");

    common::send(&app, common::authed("POST", "/api/checkins", &alice, Some(park_draft("Dolores Park", true)))).await;
    common::send(&app, common::authed("POST", "/api/checkins", &alice, Some(park_draft("Secret Spot", false)))).await;

    // Friend sees only the public one, with the author's profile
    let (status, feed) = common::send(&app, common::authed("GET", "/api/feed/checkins", &bob, None)).await;
    assert_eq!(status, StatusCode::OK);
    let feed = feed.as_array().unwrap();
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0]["location_name"], "Dolores Park");
    assert_eq!(feed[0]["username"], "alice");
    assert_eq!(feed[0]["location_emoji"], "🏞️");
    assert_eq!(feed[0]["time_ago"], "Just now");

    // Not a friend: nothing
    let (_, feed) = common::send(&app, common::authed("GET", "/api/feed/checkins", &carol, None)).await;
    assert!(feed.as_array().unwrap().is_empty());

    // The author still sees both
    let (_, history) = common::send(&app, common::authed("GET", "/api/checkins", &alice, None)).await;
    assert_eq!(history["check_ins"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_public_check_in_fans_out_to_friends() {
    let (app, state) = common::create_test_app();
    common::befriend(&app, &state, "alice", "bob").await;
    let alice = common::token_for(&state, "alice");
    let bob = common::token_for(&state, "bob");
    let carol = common::token_for(&state, "carol");

    common::send(&app, common::authed("POST", "/api/checkins", &alice, Some(park_draft("Central Park", true)))).await;
    common::send(&app, common::authed("POST", "/api/checkins", &alice, Some(park_draft("Back Yard", false)))).await;

    let (status, feed) = common::send(&app, common::authed("GET", "/api/feed/activities", &bob, None)).await;
    assert_eq!(status, StatusCode::OK);

    let check_in_activities: Vec<&Value> = feed
        .as_array()
        .unwrap()
        .iter()
        .filter(|a| a["activity_type"] == "check_in")
        .collect();
    assert_eq!(check_in_activities.len(), 1);
    let activity = check_in_activities[0];
    assert_eq!(activity["actor_id"], "alice");
    assert_eq!(activity["text"], "alice checked in at Central Park");
    assert_eq!(activity["icon"], "📍");
    assert_eq!(activity["activity_data"]["location_name"], "Central Park");

    let (_, feed) = common::send(&app, common::authed("GET", "/api/feed/activities", &carol, None)).await;
    assert!(feed.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_update_and_delete_own_check_in_only() {
    let (app, state) = common::create_test_app();
    let alice = common::token_for(&state, "alice");
    let bob = common::token_for(&state, "bob");

    let (_, body) = common::send(&app, common::authed("POST", "/api/checkins", &alice, Some(park_draft("Crissy Field", true)))).await;
    let id = body["check_in"]["id"].as_str().unwrap().to_string();
    let uri = format!("/api/checkins/{}", id);

    let (status, updated) = common::send(
        &app,
        common::authed("PUT", &uri, &alice, Some(json!({ "notes": "Windy", "user_id": "bob" }))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["notes"], "Windy");
    assert_eq!(updated["user_id"], "alice");

    let (status, _) = common::send(&app, common::authed("PUT", &uri, &bob, Some(json!({ "notes": "Mine now" })))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Someone else's delete is a no-op
    let (status, _) = common::send(&app, common::authed("DELETE", &uri, &bob, None)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, history) = common::send(&app, common::authed("GET", "/api/checkins", &alice, None)).await;
    assert_eq!(history["check_ins"].as_array().unwrap().len(), 1);

    let (status, _) = common::send(&app, common::authed("DELETE", &uri, &alice, None)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, history) = common::send(&app, common::authed("GET", "/api/checkins", &alice, None)).await;
    assert!(history["check_ins"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_offline_check_in_saved_locally() {
    let (app, state) = common::create_test_app();
    let token = common::token_for(&state, "alice");

    common::send(&app, common::authed("POST", "/api/checkins", &token, Some(park_draft("Presidio", true)))).await;

    common::memory_store(&state).set_offline(true);

    let (status, body) = common::send(
        &app,
        common::authed("POST", "/api/checkins", &token, Some(park_draft("Lands End", true))),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["saved_locally"], true);
    assert!(body["check_in"]["id"].as_str().unwrap().starts_with("local-"));
    assert_eq!(body["check_in"]["lat"], 37.7694);

    // History comes from the cache, newest first
    let (status, history) = common::send(&app, common::authed("GET", "/api/checkins", &token, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history["from_cache"], true);
    let names: Vec<&str> = history["check_ins"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Lands End", "Presidio"]);

    // Feeds have no fallback
    let (status, body) = common::send(&app, common::authed("GET", "/api/feed/checkins", &token, None)).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["retryable"], true);

    common::memory_store(&state).set_offline(false);
    let (_, history) = common::send(&app, common::authed("GET", "/api/checkins", &token, None)).await;
    assert_eq!(history["from_cache"], false);
    assert_eq!(history["check_ins"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_feed_limit_validation() {
    let (app, state) = common::create_test_app();
    let token = common::token_for(&state, "alice");

    let (status, _) = common::send(&app, common::authed("GET", "/api/feed/checkins?limit=0", &token, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = common::send(&app, common::authed("GET", "/api/feed/activities?limit=500", &token, None)).await;
    assert_eq!(status, StatusCode::OK);
}
