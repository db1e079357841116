// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{
    ActivityWithActor, CheckIn, CheckInDraft, CheckInUpdate, CheckInWithProfile, Coordinate,
    Friendship, Profile, ProfileUpdate,
};
use crate::services::activity::{activity_icon, format_activity_text, DEFAULT_ACTIVITY_LIMIT};
use crate::services::checkins::{CheckInHistory, SavedCheckIn, DEFAULT_FRIENDS_LIMIT};
use crate::services::friends::FriendEntry;
use crate::services::location::DeviceFix;
use crate::services::maps::MapLinks;
use crate::services::proximity::Ranked;
use crate::time_utils::{compact_relative_time, parse_rfc3339, relative_time};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

/// Upper bound on any `limit` parameter.
const MAX_LIMIT: u32 = 100;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me).put(update_me))
        .route("/api/checkins", get(list_check_ins).post(create_check_in))
        .route(
            "/api/checkins/{id}",
            put(update_check_in).delete(delete_check_in),
        )
        .route("/api/feed/checkins", get(get_check_in_feed))
        .route("/api/feed/activities", get(get_activity_feed))
        .route("/api/nearby", get(get_nearby))
        .route("/api/friends", get(list_friends))
        .route(
            "/api/friends/requests",
            get(list_friend_requests).post(send_friend_request),
        )
        .route(
            "/api/friends/requests/{id}/accept",
            post(accept_friend_request),
        )
        .route("/api/maps/link", get(get_map_link))
}

#[derive(Deserialize)]
struct LimitQuery {
    limit: Option<u32>,
}

impl LimitQuery {
    fn or(&self, default: u32) -> Result<u32> {
        match self.limit {
            Some(0) => Err(AppError::BadRequest("limit must be positive".to_string())),
            Some(limit) => Ok(limit.min(MAX_LIMIT)),
            None => Ok(default),
        }
    }
}

// ─── User Profile ────────────────────────────────────────────

/// Get the caller's profile, creating it on first use.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Profile>> {
    Ok(Json(state.profiles.get_or_create(&user).await?))
}

async fn update_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<Profile>> {
    update.validate()?;
    state.profiles.get_or_create(&user).await?;
    Ok(Json(state.profiles.update(&user, &update).await?))
}

// ─── Check-ins ───────────────────────────────────────────────

/// The caller's check-in history (local cache when the backend is down).
async fn list_check_ins(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<CheckInHistory>> {
    Ok(Json(state.check_ins.load_with_fallback(&user).await?))
}

async fn create_check_in(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(draft): Json<CheckInDraft>,
) -> Result<(StatusCode, Json<SavedCheckIn>)> {
    let saved = state.check_ins.check_in_with_fallback(&user, draft).await?;
    let status = if saved.saved_locally {
        StatusCode::ACCEPTED
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(saved)))
}

async fn update_check_in(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(update): Json<CheckInUpdate>,
) -> Result<Json<CheckIn>> {
    Ok(Json(state.check_ins.update(&user, &id, &update).await?))
}

async fn delete_check_in(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.check_ins.delete(&user, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ─── Feeds ───────────────────────────────────────────────────

/// Check-in as rendered in the friends feed.
#[derive(Debug, Clone, Serialize)]
pub struct FeedCheckIn {
    #[serde(flatten)]
    pub check_in: CheckInWithProfile,
    pub location_emoji: &'static str,
    pub time_ago: String,
}

impl From<CheckInWithProfile> for FeedCheckIn {
    fn from(check_in: CheckInWithProfile) -> Self {
        let time_ago = parse_rfc3339(&check_in.check_in.created_at)
            .map(|then| compact_relative_time(then, chrono::Utc::now()))
            .unwrap_or_default();
        Self {
            location_emoji: check_in.check_in.location_type.emoji(),
            time_ago,
            check_in,
        }
    }
}

/// Activity as rendered in the activity feed.
#[derive(Debug, Clone, Serialize)]
pub struct FeedActivity {
    #[serde(flatten)]
    pub activity: ActivityWithActor,
    pub text: String,
    pub icon: &'static str,
    pub time_ago: String,
}

impl From<ActivityWithActor> for FeedActivity {
    fn from(activity: ActivityWithActor) -> Self {
        let time_ago = parse_rfc3339(&activity.created_at)
            .map(|then| relative_time(then, chrono::Utc::now()))
            .unwrap_or_default();
        Self {
            text: format_activity_text(&activity),
            icon: activity_icon(activity.activity_type),
            time_ago,
            activity,
        }
    }
}

/// Friends' recent public check-ins.
async fn get_check_in_feed(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<LimitQuery>,
) -> Result<Json<Vec<FeedCheckIn>>> {
    let limit = params.or(DEFAULT_FRIENDS_LIMIT)?;
    let check_ins = state.check_ins.friends(&user, limit).await?;
    Ok(Json(check_ins.into_iter().map(FeedCheckIn::from).collect()))
}

/// Recent activities addressed to the caller.
async fn get_activity_feed(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<LimitQuery>,
) -> Result<Json<Vec<FeedActivity>>> {
    let limit = params.or(DEFAULT_ACTIVITY_LIMIT)?;
    let activities = state.activities.recent(&user, limit).await?;
    Ok(Json(activities.into_iter().map(FeedActivity::from).collect()))
}

// ─── Nearby ──────────────────────────────────────────────────

#[derive(Deserialize)]
struct NearbyQuery {
    lat: Option<f64>,
    lng: Option<f64>,
    radius_km: Option<f64>,
    limit: Option<u32>,
}

#[derive(Serialize)]
pub struct NearbyResponse {
    pub center: Coordinate,
    pub radius_km: f64,
    pub check_ins: Vec<Ranked<CheckInWithProfile>>,
}

/// Public check-ins around the device (or the default center), nearest first.
async fn get_nearby(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<NearbyQuery>,
) -> Result<Json<NearbyResponse>> {
    let center = DeviceFix {
        lat: params.lat,
        lng: params.lng,
    }
    .map_center()?;
    let radius_km = params.radius_km.unwrap_or(state.config.nearby_radius_km);
    if !(radius_km.is_finite() && radius_km > 0.0) {
        return Err(AppError::BadRequest(
            "radius_km must be a positive number".to_string(),
        ));
    }
    let limit = LimitQuery {
        limit: params.limit,
    }
    .or(state.config.nearby_limit)?;

    let check_ins = state
        .check_ins
        .nearby(&user, center, radius_km, limit)
        .await?;

    Ok(Json(NearbyResponse {
        center,
        radius_km,
        check_ins,
    }))
}

// ─── Friends ─────────────────────────────────────────────────

async fn list_friends(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<FriendEntry>>> {
    Ok(Json(state.friends.list(&user).await?))
}

async fn list_friend_requests(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<FriendEntry>>> {
    Ok(Json(state.friends.pending(&user).await?))
}

#[derive(Deserialize)]
struct FriendRequestBody {
    friend_id: String,
}

async fn send_friend_request(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<FriendRequestBody>,
) -> Result<(StatusCode, Json<Friendship>)> {
    let edge = state.friends.send_request(&user, &body.friend_id).await?;
    Ok((StatusCode::CREATED, Json(edge)))
}

async fn accept_friend_request(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(requester_id): Path<String>,
) -> Result<Json<Friendship>> {
    Ok(Json(state.friends.accept(&user, &requester_id).await?))
}

// ─── Maps ────────────────────────────────────────────────────

#[derive(Deserialize)]
struct MapLinkQuery {
    lat: f64,
    lng: f64,
    name: String,
}

/// Links for opening a place in the device's maps app.
async fn get_map_link(
    headers: HeaderMap,
    Query(params): Query<MapLinkQuery>,
) -> Result<Json<MapLinks>> {
    let at = Coordinate::new(params.lat, params.lng);
    at.validate()?;

    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("");

    Ok(Json(MapLinks::new(user_agent, &params.name, at)))
}
