// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database change webhook.
//!
//! The backend posts one request per row change on the watched tables;
//! each is republished on the in-process [`ChangeHub`](crate::services::ChangeHub)
//! for the live feeds. Signature checking happens in
//! [`require_webhook_signature`](crate::middleware::require_webhook_signature).

use crate::middleware::require_webhook_signature;
use crate::services::realtime::{ChangeEvent, ChangeKind};
use crate::AppState;
use axum::{body::Bytes, extract::State, http::StatusCode, middleware, routing::post, Router};
use serde::Deserialize;
use std::sync::Arc;

/// Schema the watched tables live in.
const PUBLIC_SCHEMA: &str = "public";

pub fn routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/webhook/changes", post(handle_change))
        .route_layer(middleware::from_fn_with_state(
            state,
            require_webhook_signature,
        ))
}

/// Database webhook payload.
#[derive(Debug, Deserialize)]
struct ChangePayload {
    #[serde(rename = "type")]
    kind: ChangeKind,
    table: String,
    schema: String,
    #[serde(default)]
    record: Option<serde_json::Value>,
    #[serde(default)]
    old_record: Option<serde_json::Value>,
}

/// Receive a row change (POST).
async fn handle_change(State(state): State<Arc<AppState>>, body: Bytes) -> StatusCode {
    let payload: ChangePayload = match serde_json::from_slice(&body) {
        Ok(p) => p,
        Err(e) => {
            tracing::error!(error = %e, "Failed to parse change webhook");
            return StatusCode::OK; // Still 200, a retry would fail the same way
        }
    };

    if payload.schema != PUBLIC_SCHEMA {
        tracing::debug!(schema = %payload.schema, table = %payload.table, "Ignoring change outside public schema");
        return StatusCode::OK;
    }

    // Deletes carry only the old row
    let record = match payload.kind {
        ChangeKind::Delete => payload.old_record,
        ChangeKind::Insert | ChangeKind::Update => payload.record,
    }
    .unwrap_or(serde_json::Value::Null);

    tracing::info!(
        table = %payload.table,
        kind = ?payload.kind,
        "Change webhook received"
    );

    let delivered = state.changes.publish(ChangeEvent {
        table: payload.table,
        kind: payload.kind,
        record,
    });
    tracing::debug!(delivered, "Change event fanned out");

    StatusCode::OK
}
