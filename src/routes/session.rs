// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Routes for per-user session state: walk, dogs and notifications.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{ActivityType, Dog, DogUpdate, NewDog, NewNotification, Notification, WalkStats};
use crate::services::walk::{format_duration, WalkState};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/walk", get(get_walk))
        .route("/api/walk/start", post(start_walk))
        .route("/api/walk/end", post(end_walk))
        .route("/api/dogs", get(list_dogs).post(add_dog))
        .route(
            "/api/dogs/{id}",
            get(get_dog).put(update_dog).delete(delete_dog),
        )
        .route(
            "/api/notifications",
            get(list_notifications).post(add_notification),
        )
        .route(
            "/api/notifications/{id}/read",
            post(mark_notification_read),
        )
        .route(
            "/api/notifications/{id}",
            axum::routing::delete(dismiss_notification),
        )
}

// ─── Walk ────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct WalkResponse {
    #[serde(flatten)]
    pub state: WalkState,
    pub stats: WalkStats,
    /// `duration` formatted for display
    pub elapsed: String,
}

impl WalkResponse {
    fn new(state: WalkState, stats: WalkStats) -> Self {
        Self {
            state,
            elapsed: format_duration(stats.duration),
            stats,
        }
    }
}

async fn get_walk(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Json<WalkResponse> {
    let session = state.sessions.get_or_create(&user.user_id);
    let walk = session.walk();
    Json(WalkResponse::new(walk.state(), walk.stats()))
}

/// Start (or restart) a walk and tell friends about it.
async fn start_walk(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Json<WalkResponse> {
    let response = {
        let session = state.sessions.get_or_create(&user.user_id);
        let mut walk = session.walk();
        walk.start();
        WalkResponse::new(walk.state(), walk.stats())
    };

    state
        .activities
        .fan_out(&user, ActivityType::WalkStarted, serde_json::json!({}))
        .await;

    Json(response)
}

/// End the active walk and return its final stats.
async fn end_walk(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<WalkResponse>> {
    let stats = {
        let session = state.sessions.get_or_create(&user.user_id);
        let mut walk = session.walk();
        walk.end()
    }
    .ok_or_else(|| AppError::BadRequest("No walk in progress".to_string()))?;

    let data = serde_json::json!({
        "duration": format_duration(stats.duration),
        "distance": stats.distance,
        "steps": stats.steps,
    });
    state
        .activities
        .fan_out(&user, ActivityType::WalkEnded, data)
        .await;

    Ok(Json(WalkResponse::new(WalkState::Idle, stats)))
}

// ─── Dogs ────────────────────────────────────────────────────

async fn list_dogs(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Json<Vec<Dog>> {
    let session = state.sessions.get_or_create(&user.user_id);
    let dogs = session.dogs().list().to_vec();
    Json(dogs)
}

async fn add_dog(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(new): Json<NewDog>,
) -> Result<(StatusCode, Json<Dog>)> {
    new.validate()?;
    let session = state.sessions.get_or_create(&user.user_id);
    let dog = session.dogs().add(new);
    tracing::debug!(user_id = %user.user_id, dog_id = %dog.id, "Dog added");
    Ok((StatusCode::CREATED, Json(dog)))
}

fn dog_not_found(id: &str) -> AppError {
    AppError::NotFound(format!("Dog {}", id))
}

async fn get_dog(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Dog>> {
    let session = state.sessions.get_or_create(&user.user_id);
    let dog = session.dogs().get(&id).cloned();
    dog.map(Json).ok_or_else(|| dog_not_found(&id))
}

async fn update_dog(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(update): Json<DogUpdate>,
) -> Result<Json<Dog>> {
    update.validate()?;
    let session = state.sessions.get_or_create(&user.user_id);
    let dog = session.dogs().update(&id, update);
    dog.map(Json).ok_or_else(|| dog_not_found(&id))
}

async fn delete_dog(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let session = state.sessions.get_or_create(&user.user_id);
    let deleted = session.dogs().delete(&id);
    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(dog_not_found(&id))
    }
}

// ─── Notifications ───────────────────────────────────────────

#[derive(Serialize)]
pub struct NotificationsResponse {
    pub notifications: Vec<Notification>,
    pub unread_count: usize,
}

async fn list_notifications(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Json<NotificationsResponse> {
    let session = state.sessions.get_or_create(&user.user_id);
    let center = session.notifications();
    Json(NotificationsResponse {
        notifications: center.list().to_vec(),
        unread_count: center.unread_count(),
    })
}

async fn add_notification(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(new): Json<NewNotification>,
) -> Result<(StatusCode, Json<Notification>)> {
    new.validate()?;
    let session = state.sessions.get_or_create(&user.user_id);
    let notification = session.notifications().add(new);
    Ok((StatusCode::CREATED, Json(notification)))
}

fn notification_not_found(id: &str) -> AppError {
    AppError::NotFound(format!("Notification {}", id))
}

async fn mark_notification_read(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let session = state.sessions.get_or_create(&user.user_id);
    let found = session.notifications().mark_as_read(&id);
    if found {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(notification_not_found(&id))
    }
}

async fn dismiss_notification(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let session = state.sessions.get_or_create(&user.user_id);
    let found = session.notifications().dismiss(&id);
    if found {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(notification_not_found(&id))
    }
}
