// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Live feeds as server-sent events.
//!
//! Each stream opens with a `snapshot` event (load state plus the current
//! page, newest first) followed by one `push` event per new row. The feed,
//! and with it the backend subscription, lives exactly as long as the
//! client connection.

use crate::middleware::auth::AuthUser;
use crate::routes::api::{FeedActivity, FeedCheckIn};
use crate::services::{ActivityFeed, CheckInFeed, FeedState};
use crate::AppState;
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Extension, Router,
};
use futures_util::stream::{self, Stream, StreamExt};
use serde::Serialize;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/feed/checkins/live", get(live_check_ins))
        .route("/api/feed/activities/live", get(live_activities))
}

#[derive(Serialize)]
struct LiveSnapshot<T> {
    #[serde(flatten)]
    state: FeedState,
    items: Vec<T>,
}

fn snapshot_event<T: Serialize>(state: FeedState, items: Vec<T>) -> Result<Event, axum::Error> {
    Event::default()
        .event("snapshot")
        .json_data(LiveSnapshot { state, items })
}

fn push_event<T: Serialize>(item: &T) -> Result<Event, axum::Error> {
    Event::default().event("push").json_data(item)
}

async fn live_check_ins(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let user_id = user.user_id.clone();
    let feed = CheckInFeed::mount(
        state.db.clone(),
        &state.changes,
        user,
        state.config.feed_max_items,
    )
    .await;
    tracing::debug!(%user_id, state = ?feed.state(), "Live check-in feed opened");

    let first = snapshot_event(
        feed.state().clone(),
        feed.log()
            .items()
            .cloned()
            .map(FeedCheckIn::from)
            .collect(),
    );

    let pushes = stream::unfold(feed, |mut feed| async move {
        let item = feed.next_push().await?;
        Some((push_event(&FeedCheckIn::from(item)), feed))
    });

    Sse::new(stream::once(async move { first }).chain(pushes)).keep_alive(KeepAlive::default())
}

async fn live_activities(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let user_id = user.user_id.clone();
    let feed = ActivityFeed::mount(
        state.db.clone(),
        &state.changes,
        user,
        state.config.feed_max_items,
    )
    .await;
    tracing::debug!(%user_id, state = ?feed.state(), "Live activity feed opened");

    let first = snapshot_event(
        feed.state().clone(),
        feed.log()
            .items()
            .cloned()
            .map(FeedActivity::from)
            .collect(),
    );

    let pushes = stream::unfold(feed, |mut feed| async move {
        let item = feed.next_push().await?;
        Some((push_event(&FeedActivity::from(item)), feed))
    });

    Sse::new(stream::once(async move { first }).chain(pushes)).keep_alive(KeepAlive::default())
}
