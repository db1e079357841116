// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Check-in service.
//!
//! Handles the check-in workflow:
//! 1. Make sure the author has a profile
//! 2. Store the check-in
//! 3. Tell friends about public check-ins
//!
//! and the reads behind the feed, map and history views. The history view
//! keeps working from the local cache when the backend is unreachable.

use crate::db::BackendDb;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{
    ActivityType, CheckIn, CheckInDraft, CheckInUpdate, CheckInWithProfile, Coordinate,
    LocalCheckIn, NewCheckIn, ProfileSummary,
};
use crate::services::activity::ActivityService;
use crate::services::cache::LocalStore;
use crate::services::location::DeviceFix;
use crate::services::profiles::ProfileService;
use crate::services::proximity::{within_radius, BoundingBox, Ranked};
use crate::time_utils::format_utc_rfc3339;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use validator::Validate;

/// Default number of the user's own check-ins.
pub const DEFAULT_OWN_LIMIT: u32 = 20;
/// Default number of friends' check-ins.
pub const DEFAULT_FRIENDS_LIMIT: u32 = 10;

/// Check-in history as shown by the check-in page.
#[derive(Debug, Clone, Serialize)]
pub struct CheckInHistory {
    pub check_ins: Vec<LocalCheckIn>,
    /// Served from the local cache because the backend failed
    pub from_cache: bool,
}

/// Result of a check-in from the check-in page.
#[derive(Debug, Clone, Serialize)]
pub struct SavedCheckIn {
    pub check_in: LocalCheckIn,
    /// Stored only in the local cache
    pub saved_locally: bool,
}

#[derive(Clone)]
pub struct CheckInService {
    db: BackendDb,
    profiles: ProfileService,
    activities: ActivityService,
    local: Arc<LocalStore>,
}

impl CheckInService {
    pub fn new(db: BackendDb, local: Arc<LocalStore>) -> Self {
        Self {
            profiles: ProfileService::new(db.clone()),
            activities: ActivityService::new(db.clone()),
            db,
            local,
        }
    }

    /// Check in at the device's current position.
    pub async fn create(&self, user: &AuthUser, draft: CheckInDraft) -> Result<CheckIn> {
        draft.validate()?;
        let at = DeviceFix {
            lat: draft.latitude,
            lng: draft.longitude,
        }
        .require_precise()?;

        self.profiles.ensure_exists(user).await;

        let new = NewCheckIn::from_draft(&user.user_id, draft, at);
        let check_in = self.db.insert_check_in(user, &new).await?;

        tracing::info!(
            user_id = %user.user_id,
            check_in_id = %check_in.id,
            location = %check_in.location_name,
            is_public = check_in.is_public,
            "Check-in created"
        );

        if check_in.is_public {
            let data = serde_json::json!({
                "location_name": check_in.location_name,
                "location_type": check_in.location_type,
                "notes": check_in.notes,
                "check_in_id": check_in.id,
            });
            self.activities
                .fan_out(user, ActivityType::CheckIn, data)
                .await;
        }

        Ok(check_in)
    }

    /// The user's own check-ins, newest first.
    pub async fn own(&self, user: &AuthUser, limit: u32) -> Result<Vec<CheckIn>> {
        self.db.check_ins_for_user(user, &user.user_id, limit).await
    }

    /// Friends' recent public check-ins, newest first.
    pub async fn friends(&self, user: &AuthUser, limit: u32) -> Result<Vec<CheckInWithProfile>> {
        self.db.friends_recent_check_ins(user, limit).await
    }

    /// Public check-ins within `radius_km` of `center`, nearest first.
    pub async fn nearby(
        &self,
        viewer: &AuthUser,
        center: Coordinate,
        radius_km: f64,
        limit: u32,
    ) -> Result<Vec<Ranked<CheckInWithProfile>>> {
        let bbox = BoundingBox::around(center, radius_km);
        let candidates = self.db.public_check_ins_in_box(viewer, &bbox, limit).await?;

        let authors: Vec<String> = candidates
            .iter()
            .map(|c| c.user_id.clone())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let profiles: HashMap<String, ProfileSummary> = self
            .db
            .get_profiles(viewer, &authors)
            .await?
            .into_iter()
            .map(|p| (p.id.clone(), p.into()))
            .collect();

        let enriched = candidates.into_iter().map(|check_in| {
            let profile = profiles.get(&check_in.user_id).cloned().unwrap_or_default();
            CheckInWithProfile { check_in, profile }
        });

        let nearby = within_radius(center, radius_km, enriched);
        tracing::debug!(
            lat = center.lat,
            lng = center.lng,
            radius_km,
            found = nearby.len(),
            "Nearby check-ins"
        );
        Ok(nearby)
    }

    pub async fn update(&self, user: &AuthUser, id: &str, update: &CheckInUpdate) -> Result<CheckIn> {
        update.validate()?;
        self.db
            .update_check_in(user, id, update)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Check-in {}", id)))
    }

    pub async fn delete(&self, user: &AuthUser, id: &str) -> Result<()> {
        self.db.delete_check_in(user, id).await?;
        tracing::info!(user_id = %user.user_id, check_in_id = id, "Check-in deleted");
        Ok(())
    }

    // ─── Local Fallback ──────────────────────────────────────────

    async fn cached(&self, user: &AuthUser) -> Vec<LocalCheckIn> {
        match self.local.load_check_ins(&user.user_id).await {
            Ok(check_ins) => check_ins,
            Err(e) => {
                tracing::warn!(user_id = %user.user_id, error = %e, "Ignoring unreadable check-in cache");
                Vec::new()
            }
        }
    }

    async fn remember(&self, user: &AuthUser, check_in: LocalCheckIn) {
        let mut check_ins = self.cached(user).await;
        check_ins.insert(0, check_in);
        if let Err(e) = self.local.save_check_ins(&user.user_id, &check_ins).await {
            tracing::warn!(user_id = %user.user_id, error = %e, "Failed to write check-in cache");
        }
    }

    /// The user's history from the backend, or the local cache if it is unreachable.
    pub async fn load_with_fallback(&self, user: &AuthUser) -> Result<CheckInHistory> {
        match self.own(user, DEFAULT_OWN_LIMIT).await {
            Ok(check_ins) => Ok(CheckInHistory {
                check_ins: check_ins.iter().map(LocalCheckIn::from).collect(),
                from_cache: false,
            }),
            Err(e) if e.is_retryable() => {
                tracing::warn!(user_id = %user.user_id, error = %e, "Loading check-ins from local cache");
                Ok(CheckInHistory {
                    check_ins: self.cached(user).await,
                    from_cache: true,
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Check in, keeping a local copy; falls back to local-only when the
    /// backend is unreachable.
    pub async fn check_in_with_fallback(
        &self,
        user: &AuthUser,
        draft: CheckInDraft,
    ) -> Result<SavedCheckIn> {
        draft.validate()?;
        let at = DeviceFix {
            lat: draft.latitude,
            lng: draft.longitude,
        }
        .require_precise()?;

        let saved = match self.create(user, draft.clone()).await {
            Ok(check_in) => SavedCheckIn {
                check_in: LocalCheckIn::from(&check_in),
                saved_locally: false,
            },
            Err(e) if e.is_retryable() => {
                tracing::warn!(user_id = %user.user_id, error = %e, "Saving check-in locally");
                let now = chrono::Utc::now();
                SavedCheckIn {
                    check_in: LocalCheckIn {
                        id: format!("local-{}", now.timestamp_millis()),
                        name: draft.location_name,
                        kind: draft.location_type,
                        lat: at.lat,
                        lng: at.lng,
                        timestamp: format_utc_rfc3339(now),
                        notes: draft.notes,
                        photo: draft.photo_url,
                        is_public: Some(draft.is_public),
                    },
                    saved_locally: true,
                }
            }
            Err(e) => return Err(e),
        };

        self.remember(user, saved.check_in.clone()).await;
        Ok(saved)
    }
}
