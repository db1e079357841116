// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Backend client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Profiles (lazy creation, owner updates)
//! - Check-ins (own, bounding-box, owner updates/deletes)
//! - Friendships (accepted edges, incoming requests)
//! - Activities (fan-out inserts, recipient feed)
//!
//! Every call runs as the authenticated caller so the backend's
//! row-level security decides what is visible.

use crate::db::memory::MemoryStore;
use crate::db::query::{Filter, Query};
use crate::db::rest::RestClient;
use crate::db::{collections, rpc};
use crate::error::AppError;
use crate::middleware::auth::AuthUser;
use crate::models::{
    Activity, ActivityWithActor, CheckIn, CheckInUpdate, CheckInWithProfile, FriendStatus,
    Friendship, NewActivity, NewCheckIn, NewProfile, Profile, ProfileUpdate,
};
use crate::services::proximity::BoundingBox;
use crate::services::realtime::ChangeHub;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

#[derive(Clone)]
enum Inner {
    Remote(RestClient),
    Memory(Arc<MemoryStore>),
}

/// Backend database client.
#[derive(Clone)]
pub struct BackendDb {
    inner: Inner,
}

/// Parameters shared by the feed procedures.
#[derive(Serialize)]
struct FeedParams<'a> {
    user_id_param: &'a str,
    limit_param: u32,
}

fn from_rows<T: DeserializeOwned>(rows: Vec<serde_json::Value>) -> Result<Vec<T>, AppError> {
    rows.into_iter()
        .map(|row| {
            serde_json::from_value(row).map_err(|e| AppError::Database(format!("Bad row: {}", e)))
        })
        .collect()
}

fn to_row<B: Serialize + ?Sized>(body: &B) -> Result<serde_json::Value, AppError> {
    serde_json::to_value(body).map_err(|e| AppError::Internal(e.into()))
}

impl BackendDb {
    /// Connect to the hosted backend at `project_url`.
    pub fn remote(project_url: &str, anon_key: &str) -> Self {
        tracing::info!(url = project_url, "Using hosted backend");
        Self {
            inner: Inner::Remote(RestClient::new(project_url, anon_key)),
        }
    }

    /// In-process backend publishing its inserts to `hub`.
    pub fn memory(hub: ChangeHub) -> Self {
        tracing::info!("Using in-memory backend");
        Self {
            inner: Inner::Memory(Arc::new(MemoryStore::new(hub))),
        }
    }

    /// The in-memory store, when running without a hosted backend.
    pub fn memory_store(&self) -> Option<&Arc<MemoryStore>> {
        match &self.inner {
            Inner::Memory(store) => Some(store),
            Inner::Remote(_) => None,
        }
    }

    // ─── Generic Operations ──────────────────────────────────────

    async fn select<T: DeserializeOwned>(
        &self,
        caller: &AuthUser,
        table: &str,
        query: &Query,
    ) -> Result<Vec<T>, AppError> {
        match &self.inner {
            Inner::Remote(client) => client.select(caller, table, query).await,
            Inner::Memory(store) => from_rows(store.select(&caller.user_id, table, query)?),
        }
    }

    async fn insert<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        caller: &AuthUser,
        table: &str,
        rows: &B,
    ) -> Result<Vec<T>, AppError> {
        match &self.inner {
            Inner::Remote(client) => client.insert(caller, table, rows).await,
            Inner::Memory(store) => {
                from_rows(store.insert(&caller.user_id, table, to_row(rows)?)?)
            }
        }
    }

    async fn update<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        caller: &AuthUser,
        table: &str,
        query: &Query,
        patch: &B,
    ) -> Result<Vec<T>, AppError> {
        match &self.inner {
            Inner::Remote(client) => client.update(caller, table, query, patch).await,
            Inner::Memory(store) => from_rows(store.update(
                &caller.user_id,
                table,
                query,
                to_row(patch)?,
            )?),
        }
    }

    async fn delete(&self, caller: &AuthUser, table: &str, query: &Query) -> Result<(), AppError> {
        match &self.inner {
            Inner::Remote(client) => client.delete(caller, table, query).await,
            Inner::Memory(store) => store.delete(&caller.user_id, table, query),
        }
    }

    async fn feed_rpc<T: DeserializeOwned>(
        &self,
        caller: &AuthUser,
        name: &str,
        limit: u32,
    ) -> Result<Vec<T>, AppError> {
        let params = FeedParams {
            user_id_param: &caller.user_id,
            limit_param: limit,
        };
        match &self.inner {
            Inner::Remote(client) => client.rpc(caller, name, &params).await,
            Inner::Memory(store) => from_rows(store.rpc(&caller.user_id, name, &to_row(&params)?)?),
        }
    }

    // ─── Profile Operations ──────────────────────────────────────

    /// Get a profile by user id.
    pub async fn get_profile(
        &self,
        caller: &AuthUser,
        user_id: &str,
    ) -> Result<Option<Profile>, AppError> {
        let query = Query::new().eq("id", user_id).limit(1);
        let profiles: Vec<Profile> = self.select(caller, collections::PROFILES, &query).await?;
        Ok(profiles.into_iter().next())
    }

    /// Get the profiles for a set of user ids. Unknown ids are skipped.
    pub async fn get_profiles(
        &self,
        caller: &AuthUser,
        user_ids: &[String],
    ) -> Result<Vec<Profile>, AppError> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = Query::new().is_in("id", user_ids.to_vec());
        self.select(caller, collections::PROFILES, &query).await
    }

    /// Create the caller's profile.
    pub async fn insert_profile(
        &self,
        caller: &AuthUser,
        profile: &NewProfile,
    ) -> Result<Profile, AppError> {
        let rows: Vec<Profile> = self.insert(caller, collections::PROFILES, profile).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| AppError::Backend("Profile insert returned no row".to_string()))
    }

    /// Update the caller's profile. `None` if it does not exist.
    pub async fn update_profile(
        &self,
        caller: &AuthUser,
        update: &ProfileUpdate,
    ) -> Result<Option<Profile>, AppError> {
        let query = Query::new().eq("id", &caller.user_id);
        let rows: Vec<Profile> = self
            .update(caller, collections::PROFILES, &query, update)
            .await?;
        Ok(rows.into_iter().next())
    }

    // ─── Check-in Operations ─────────────────────────────────────

    pub async fn insert_check_in(
        &self,
        caller: &AuthUser,
        check_in: &NewCheckIn,
    ) -> Result<CheckIn, AppError> {
        let rows: Vec<CheckIn> = self.insert(caller, collections::CHECK_INS, check_in).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| AppError::Backend("Check-in insert returned no row".to_string()))
    }

    /// A user's check-ins, newest first.
    pub async fn check_ins_for_user(
        &self,
        caller: &AuthUser,
        user_id: &str,
        limit: u32,
    ) -> Result<Vec<CheckIn>, AppError> {
        let query = Query::new()
            .eq("user_id", user_id)
            .order_desc("created_at")
            .limit(limit);
        self.select(caller, collections::CHECK_INS, &query).await
    }

    /// Public check-ins inside a bounding box, newest first.
    pub async fn public_check_ins_in_box(
        &self,
        caller: &AuthUser,
        bbox: &BoundingBox,
        limit: u32,
    ) -> Result<Vec<CheckIn>, AppError> {
        let query = Query::new()
            .eq("is_public", true)
            .gte("latitude", bbox.min_lat)
            .lte("latitude", bbox.max_lat)
            .gte("longitude", bbox.min_lng)
            .lte("longitude", bbox.max_lng)
            .order_desc("created_at")
            .limit(limit);
        self.select(caller, collections::CHECK_INS, &query).await
    }

    /// Update one of the caller's check-ins. `None` if no such check-in.
    pub async fn update_check_in(
        &self,
        caller: &AuthUser,
        id: &str,
        update: &CheckInUpdate,
    ) -> Result<Option<CheckIn>, AppError> {
        let query = Query::new().eq("id", id).eq("user_id", &caller.user_id);
        let rows: Vec<CheckIn> = self
            .update(caller, collections::CHECK_INS, &query, update)
            .await?;
        Ok(rows.into_iter().next())
    }

    pub async fn delete_check_in(&self, caller: &AuthUser, id: &str) -> Result<(), AppError> {
        let query = Query::new().eq("id", id).eq("user_id", &caller.user_id);
        self.delete(caller, collections::CHECK_INS, &query).await
    }

    /// Friends' recent public check-ins joined with their profiles.
    pub async fn friends_recent_check_ins(
        &self,
        caller: &AuthUser,
        limit: u32,
    ) -> Result<Vec<CheckInWithProfile>, AppError> {
        self.feed_rpc(caller, rpc::FRIENDS_RECENT_CHECKINS, limit)
            .await
    }

    // ─── Activity Operations ─────────────────────────────────────

    /// Activities addressed to the caller joined with their actors.
    pub async fn friends_recent_activities(
        &self,
        caller: &AuthUser,
        limit: u32,
    ) -> Result<Vec<ActivityWithActor>, AppError> {
        self.feed_rpc(caller, rpc::FRIENDS_RECENT_ACTIVITIES, limit)
            .await
    }

    pub async fn insert_activities(
        &self,
        caller: &AuthUser,
        activities: &[NewActivity],
    ) -> Result<Vec<Activity>, AppError> {
        if activities.is_empty() {
            return Ok(Vec::new());
        }
        self.insert(caller, collections::ACTIVITIES, activities)
            .await
    }

    // ─── Friendship Operations ───────────────────────────────────

    /// Accepted friendships with `user_id` on either side.
    pub async fn accepted_friendships(
        &self,
        caller: &AuthUser,
        user_id: &str,
    ) -> Result<Vec<Friendship>, AppError> {
        let query = Query::new()
            .eq("status", FriendStatus::Accepted.as_str())
            .any_of(vec![
                Filter::Eq("user_id", user_id.to_string()),
                Filter::Eq("friend_id", user_id.to_string()),
            ]);
        self.select(caller, collections::FRIENDS, &query).await
    }

    /// Pending requests addressed to the caller, newest first.
    pub async fn incoming_requests(&self, caller: &AuthUser) -> Result<Vec<Friendship>, AppError> {
        let query = Query::new()
            .eq("friend_id", &caller.user_id)
            .eq("status", FriendStatus::Pending.as_str())
            .order_desc("created_at");
        self.select(caller, collections::FRIENDS, &query).await
    }

    /// Any edge from `user_id` to `friend_id`.
    pub async fn get_friendship(
        &self,
        caller: &AuthUser,
        user_id: &str,
        friend_id: &str,
    ) -> Result<Option<Friendship>, AppError> {
        let query = Query::new()
            .eq("user_id", user_id)
            .eq("friend_id", friend_id)
            .limit(1);
        let rows: Vec<Friendship> = self.select(caller, collections::FRIENDS, &query).await?;
        Ok(rows.into_iter().next())
    }

    pub async fn insert_friendship(
        &self,
        caller: &AuthUser,
        friendship: &Friendship,
    ) -> Result<Friendship, AppError> {
        let rows: Vec<Friendship> = self.insert(caller, collections::FRIENDS, friendship).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| AppError::Backend("Friendship insert returned no row".to_string()))
    }

    /// Accept the pending request from `requester_id` to the caller.
    pub async fn accept_friendship(
        &self,
        caller: &AuthUser,
        requester_id: &str,
    ) -> Result<Option<Friendship>, AppError> {
        let query = Query::new()
            .eq("user_id", requester_id)
            .eq("friend_id", &caller.user_id)
            .eq("status", FriendStatus::Pending.as_str());
        let patch = serde_json::json!({ "status": FriendStatus::Accepted.as_str() });
        let rows: Vec<Friendship> = self
            .update(caller, collections::FRIENDS, &query, &patch)
            .await?;
        Ok(rows.into_iter().next())
    }
}
