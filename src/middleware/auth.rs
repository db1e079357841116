// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT authentication middleware.
//!
//! Access tokens are issued by the hosted backend's auth service and signed
//! with its JWT secret (HS256). The raw token is kept on [`AuthUser`] so
//! backend calls run under the caller's identity and row-level security.

use crate::error::AppError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Cookie the web views store the access token in.
pub const ACCESS_TOKEN_COOKIE: &str = "sb-access-token";

/// Audience the backend puts on end-user tokens.
pub const AUTHENTICATED_AUDIENCE: &str = "authenticated";

/// Profile hints the auth service attaches to a user.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct UserMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (auth user id)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
    pub aud: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: UserMetadata,
}

/// Authenticated user extracted from JWT.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
    /// Raw bearer token, forwarded to the backend
    pub access_token: String,
}

impl AuthUser {
    /// Local part of the email address, if any.
    pub fn email_handle(&self) -> Option<&str> {
        self.email
            .as_deref()
            .and_then(|e| e.split('@').next())
            .filter(|h| !h.is_empty())
    }
}

/// Verify an access token and build the caller identity.
pub fn verify_token(token: &str, secret: &[u8]) -> Result<AuthUser, AppError> {
    let key = DecodingKey::from_secret(secret);
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[AUTHENTICATED_AUDIENCE]);

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| {
        tracing::debug!(error = %e, "Rejected access token");
        AppError::InvalidToken
    })?;

    let claims = token_data.claims;
    if claims.sub.is_empty() {
        return Err(AppError::InvalidToken);
    }

    Ok(AuthUser {
        user_id: claims.sub,
        email: claims.email,
        full_name: claims.user_metadata.full_name,
        access_token: token.to_string(),
    })
}

/// Middleware that requires valid JWT authentication.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Header first, then the cookie set by the web views
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(h) if h.starts_with("Bearer ") => h[7..].to_string(),
        Some(_) => return Err(AppError::InvalidToken),
        None => match jar.get(ACCESS_TOKEN_COOKIE) {
            Some(cookie) => cookie.value().to_string(),
            None => return Err(AppError::Unauthorized),
        },
    };

    let auth_user = verify_token(&token, &state.config.jwt_secret)?;
    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

/// Create an access token the way the backend's auth service does.
///
/// Used by tests and local development tooling.
pub fn create_jwt(
    user_id: &str,
    email: Option<&str>,
    full_name: Option<&str>,
    secret: &[u8],
) -> anyhow::Result<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as usize;

    let claims = Claims {
        sub: user_id.to_string(),
        iat: now,
        exp: now + 60 * 60, // 1 hour, like the backend's default
        aud: AUTHENTICATED_AUDIENCE.to_string(),
        email: email.map(str::to_string),
        user_metadata: UserMetadata {
            full_name: full_name.map(str::to_string),
        },
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret),
    )?)
}
