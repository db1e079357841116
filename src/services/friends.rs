// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Friend list and friend requests.
//!
//! A friendship is a directed edge `user_id -> friend_id` with a status.
//! The requester creates a pending edge; the addressee accepts it. Whether
//! an accepted edge is mirrored is up to the backend, so readers look at
//! both directions.

use crate::db::BackendDb;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{ActivityType, FriendStatus, Friendship, ProfileSummary};
use crate::services::activity::ActivityService;
use crate::services::profiles::ProfileService;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Another user with their profile, as shown in friend lists.
#[derive(Debug, Clone, Serialize)]
pub struct FriendEntry {
    pub user_id: String,
    pub status: FriendStatus,
    #[serde(flatten)]
    pub profile: ProfileSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since: Option<String>,
}

#[derive(Clone)]
pub struct FriendService {
    db: BackendDb,
    profiles: ProfileService,
    activities: ActivityService,
}

impl FriendService {
    pub fn new(db: BackendDb) -> Self {
        Self {
            profiles: ProfileService::new(db.clone()),
            activities: ActivityService::new(db.clone()),
            db,
        }
    }

    /// Join the counterpart of each edge with its profile.
    async fn with_profiles(
        &self,
        viewer: &AuthUser,
        edges: Vec<Friendship>,
    ) -> Result<Vec<FriendEntry>> {
        let mut seen = HashSet::new();
        let edges: Vec<Friendship> = edges
            .into_iter()
            .filter(|f| seen.insert(f.counterpart(&viewer.user_id).to_string()))
            .collect();

        let ids: Vec<String> = edges
            .iter()
            .map(|f| f.counterpart(&viewer.user_id).to_string())
            .collect();
        let profiles: HashMap<String, ProfileSummary> = self
            .db
            .get_profiles(viewer, &ids)
            .await?
            .into_iter()
            .map(|p| (p.id.clone(), p.into()))
            .collect();

        Ok(edges
            .into_iter()
            .map(|f| {
                let user_id = f.counterpart(&viewer.user_id).to_string();
                FriendEntry {
                    profile: profiles.get(&user_id).cloned().unwrap_or_default(),
                    user_id,
                    status: f.status,
                    since: f.created_at,
                }
            })
            .collect())
    }

    /// Accepted friends, in either direction.
    pub async fn list(&self, viewer: &AuthUser) -> Result<Vec<FriendEntry>> {
        let edges = self
            .db
            .accepted_friendships(viewer, &viewer.user_id)
            .await?;
        self.with_profiles(viewer, edges).await
    }

    /// Requests waiting for the viewer to accept.
    pub async fn pending(&self, viewer: &AuthUser) -> Result<Vec<FriendEntry>> {
        let edges = self.db.incoming_requests(viewer).await?;
        self.with_profiles(viewer, edges).await
    }

    /// Ask `friend_id` to be friends.
    pub async fn send_request(&self, viewer: &AuthUser, friend_id: &str) -> Result<Friendship> {
        if friend_id == viewer.user_id {
            return Err(AppError::BadRequest(
                "Cannot send a friend request to yourself".to_string(),
            ));
        }
        if self.profiles.summary(viewer, friend_id).await?.is_none() {
            return Err(AppError::NotFound(format!("User {}", friend_id)));
        }
        if let Some(existing) = self.existing_edge(viewer, friend_id).await? {
            let message = match (existing.status, existing.user_id == viewer.user_id) {
                (FriendStatus::Accepted, _) => "Already friends",
                (FriendStatus::Pending, true) => "Friend request already sent",
                (FriendStatus::Pending, false) => "This user has already sent you a friend request",
            };
            return Err(AppError::BadRequest(message.to_string()));
        }

        self.profiles.ensure_exists(viewer).await;
        let edge = self
            .db
            .insert_friendship(
                viewer,
                &Friendship {
                    user_id: viewer.user_id.clone(),
                    friend_id: friend_id.to_string(),
                    status: FriendStatus::Pending,
                    created_at: None,
                },
            )
            .await?;

        tracing::info!(user_id = %viewer.user_id, friend_id, "Friend request sent");

        // The edge is in place; a missing activity only costs the notification
        if let Err(e) = self
            .activities
            .create_friend_activity(viewer, friend_id, ActivityType::FriendRequest)
            .await
        {
            tracing::warn!(
                user_id = %viewer.user_id,
                friend_id,
                error = %e,
                "Failed to record friend request activity"
            );
        }
        Ok(edge)
    }

    /// An edge between the viewer and `other`, in either direction.
    async fn existing_edge(&self, viewer: &AuthUser, other: &str) -> Result<Option<Friendship>> {
        if let Some(edge) = self.db.get_friendship(viewer, &viewer.user_id, other).await? {
            return Ok(Some(edge));
        }
        self.db.get_friendship(viewer, other, &viewer.user_id).await
    }

    /// Accept the pending request from `requester_id`.
    pub async fn accept(&self, viewer: &AuthUser, requester_id: &str) -> Result<Friendship> {
        let edge = self
            .db
            .accept_friendship(viewer, requester_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Friend request from {}", requester_id)))?;

        tracing::info!(user_id = %viewer.user_id, requester_id, "Friend request accepted");
        self.activities
            .create_friend_activity(viewer, requester_id, ActivityType::FriendAccepted)
            .await?;
        Ok(edge)
    }
}
