// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sign-out route.
//!
//! Sign-in happens against the backend's auth service directly; this
//! service only has to drop what it holds for the user.

use crate::middleware::auth::{AuthUser, ACCESS_TOKEN_COOKIE};
use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Extension, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/auth/logout", post(logout))
}

/// End the caller's session: stop any walk, forget session state and clear
/// the access token cookie.
async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    jar: CookieJar,
) -> (CookieJar, StatusCode) {
    let had_session = state.sessions.sign_out(&user.user_id);
    tracing::info!(user_id = %user.user_id, had_session, "User signed out");

    let jar = jar.remove(Cookie::build(ACCESS_TOKEN_COOKIE).path("/"));
    (jar, StatusCode::NO_CONTENT)
}
