// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Packwalk API Server
//!
//! Serves the dog-walker web views: check-ins, friends, live feeds, nearby
//! search and walk tracking on top of a hosted backend.

use packwalk::{
    config::{BackendMode, Config},
    services::session::SESSION_SWEEP_INTERVAL,
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env().inspect_err(|e| {
        tracing::error!(error = %e, "Failed to load configuration");
    })?;
    tracing::info!(port = config.port, "Starting Packwalk API");

    match config.backend_mode {
        BackendMode::Remote => {
            tracing::info!(backend = %config.backend_url, "Using hosted backend");
        }
        BackendMode::Memory => {
            tracing::warn!("Using in-memory backend, nothing will be persisted");
        }
    }
    tracing::info!(
        path = %config.local_cache_dir.display(),
        "Local check-in cache directory"
    );

    // Build shared state
    let port = config.port;
    let idle_timeout = config.session_idle_timeout;
    let state = Arc::new(AppState::new(config));

    // Discard sessions (and walks) of users who left without signing out
    let sweeper = state.clone();
    tokio::spawn(async move {
        sweeper
            .sessions
            .run_idle_sweep(idle_timeout, SESSION_SWEEP_INTERVAL)
            .await
    });

    // Build router
    let app = packwalk::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() -> Result<(), tracing_subscriber::filter::ParseError> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("packwalk=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
