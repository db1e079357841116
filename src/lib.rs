// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Packwalk: the application layer behind the dog-walker web views.
//!
//! This crate serves the views' JSON and event-stream endpoints: check-ins,
//! friends, live feeds, nearby search and walk tracking, backed by a hosted
//! backend that owns all durable state.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::{BackendMode, Config};
use db::BackendDb;
use services::{
    ActivityService, ChangeHub, CheckInService, FriendService, LocalStore, ProfileService,
    SessionRegistry,
};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: BackendDb,
    /// Backend row changes, fed by the webhook (or the in-memory store)
    pub changes: ChangeHub,
    pub sessions: SessionRegistry,
    pub check_ins: CheckInService,
    pub profiles: ProfileService,
    pub friends: FriendService,
    pub activities: ActivityService,
}

impl AppState {
    /// Wire up the services for `config`.
    pub fn new(config: Config) -> Self {
        let changes = ChangeHub::new();
        let db = match config.backend_mode {
            BackendMode::Remote => BackendDb::remote(&config.backend_url, &config.backend_anon_key),
            BackendMode::Memory => BackendDb::memory(changes.clone()),
        };
        let local_store = Arc::new(LocalStore::dir(&config.local_cache_dir));

        Self::with_parts(config, db, changes, local_store)
    }

    /// Wire up the services around an existing backend and local store.
    pub fn with_parts(
        config: Config,
        db: BackendDb,
        changes: ChangeHub,
        local_store: Arc<LocalStore>,
    ) -> Self {
        Self {
            check_ins: CheckInService::new(db.clone(), local_store),
            profiles: ProfileService::new(db.clone()),
            friends: FriendService::new(db.clone()),
            activities: ActivityService::new(db.clone()),
            sessions: SessionRegistry::new(),
            config,
            db,
            changes,
        }
    }
}
