// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database webhook authentication middleware.
//!
//! The backend signs every webhook body with the shared webhook secret and
//! sends `X-Webhook-Signature: sha256=<hex HMAC-SHA256(body)>`.

use crate::AppState;
use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-webhook-signature";
const SIGNATURE_PREFIX: &str = "sha256=";

/// Webhook payloads larger than this are rejected.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Signature header value for `body`.
pub fn sign_body(body: &[u8], secret: &[u8]) -> anyhow::Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| anyhow::anyhow!("HMAC init failed: {}", e))?;
    mac.update(body);
    Ok(format!(
        "{}{}",
        SIGNATURE_PREFIX,
        hex::encode(mac.finalize().into_bytes())
    ))
}

/// Check a signature header value against `body` in constant time.
pub fn verify_signature(body: &[u8], header: &str, secret: &[u8]) -> bool {
    let Some(signature_hex) = header.trim().strip_prefix(SIGNATURE_PREFIX) else {
        return false;
    };
    let Ok(signature) = hex::decode(signature_hex) else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return false;
    };
    mac.update(body);
    let expected = mac.finalize().into_bytes();

    expected.as_slice().ct_eq(&signature).into()
}

/// Require a valid body signature for `/webhook/*` routes.
pub async fn require_webhook_signature(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let (parts, body) = request.into_parts();

    let Some(header) = parts
        .headers
        .get(SIGNATURE_HEADER)
        .and_then(|h| h.to_str().ok())
    else {
        tracing::warn!("Blocked webhook request without signature");
        return Err(StatusCode::UNAUTHORIZED);
    };

    let bytes = to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|_| StatusCode::PAYLOAD_TOO_LARGE)?;

    if !verify_signature(&bytes, header, &state.config.webhook_secret) {
        tracing::warn!("Security Alert: Webhook signature mismatch");
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(next
        .run(Request::from_parts(parts, Body::from(bytes)))
        .await)
}
