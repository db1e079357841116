// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Nearby search tests.

use axum::http::StatusCode;
use serde_json::json;

mod common;

/// Kilometres per degree of latitude on the mean-radius sphere.
const KM_PER_DEGREE: f64 = 111.195;

const CENTER_LAT: f64 = 37.7749;
const CENTER_LNG: f64 = -122.4194;

async fn check_in_north(app: &axum::Router, token: &str, name: &str, km: f64, is_public: bool) {
    let (status, _) = common::send(
        app,
        common::authed(
            "POST",
            "/api/checkins",
            token,
            Some(json!({
                "location_name": name,
                "latitude": CENTER_LAT + km / KM_PER_DEGREE,
                "longitude": CENTER_LNG,
                "is_public": is_public,
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_nearby_filters_and_sorts_by_distance() {
    let (app, state) = common::create_test_app();
    let alice = common::token_for(&state, "alice");
    let bob = common::token_for(&state, "bob");

    check_in_north(&app, &alice, "Far", 9.9, true).await;
    check_in_north(&app, &alice, "Close", 0.5, true).await;
    check_in_north(&app, &alice, "Just Outside", 10.1, true).await;
    check_in_north(&app, &alice, "Way Out", 25.0, true).await;
    check_in_north(&app, &alice, "Hidden", 1.0, false).await;

    let uri = format!("/api/nearby?lat={}&lng={}", CENTER_LAT, CENTER_LNG);
    let (status, body) = common::send(&app, common::authed("GET", &uri, &bob, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["radius_km"], 10.0);

    let results = body["check_ins"].as_array().unwrap();
    let names: Vec<&str> = results
        .iter()
        .map(|r| r["location_name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Close", "Far"]);

    let first = results[0]["distance_km"].as_f64().unwrap();
    let second = results[1]["distance_km"].as_f64().unwrap();
    assert!((first - 0.5).abs() < 0.01, "got {first}");
    assert!((second - 9.9).abs() < 0.01, "got {second}");
    assert_eq!(results[0]["username"], "alice");
}

#[tokio::test]
async fn test_nearby_defaults_to_city_center() {
    let (app, state) = common::create_test_app();
    let alice = common::token_for(&state, "alice");

    check_in_north(&app, &alice, "Downtown", 2.0, true).await;

    let (status, body) = common::send(&app, common::authed("GET", "/api/nearby", &alice, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["center"]["lat"], CENTER_LAT);
    assert_eq!(body["check_ins"].as_array().unwrap().len(), 1);

    // Wider radius brings in more
    check_in_north(&app, &alice, "Marin", 20.0, true).await;
    let (_, body) = common::send(&app, common::authed("GET", "/api/nearby?radius_km=30", &alice, None)).await;
    assert_eq!(body["check_ins"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_nearby_rejects_bad_parameters() {
    let (app, state) = common::create_test_app();
    let alice = common::token_for(&state, "alice");

    for uri in [
        "/api/nearby?radius_km=0",
        "/api/nearby?radius_km=-5",
        "/api/nearby?lat=95&lng=0",
        "/api/nearby?limit=0",
    ] {
        let (status, _) = common::send(&app, common::authed("GET", uri, &alice, None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
    }
}

#[tokio::test]
async fn test_map_link_follows_platform() {
    let (app, state) = common::create_test_app();
    let alice = common::token_for(&state, "alice");

    let mut request = common::authed(
        "GET",
        "/api/maps/link?lat=37.7694&lng=-122.4862&name=Golden%20Gate%20Park",
        &alice,
        None,
    );
    request.headers_mut().insert(
        axum::http::header::USER_AGENT,
        "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X)".parse().unwrap(),
    );

    let (status, body) = common::send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["platform"], "apple");
    assert!(body["open_url"]
        .as_str()
        .unwrap()
        .starts_with("http://maps.apple.com/?q=Golden%20Gate%20Park"));
    assert!(body["directions_url"].as_str().unwrap().ends_with("dirflg=w"));
    assert_eq!(body["coordinates"], "37.7694, -122.4862");
}
