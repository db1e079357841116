// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Live feeds: an initial page merged with pushed inserts.
//!
//! A feed session subscribes to the change stream before fetching its
//! initial page, so no insert falls between the two. Pushed rows are
//! enriched with their author's profile and prepended; rows whose profile
//! cannot be resolved are dropped. There is no reconciliation against
//! server order: an insert that is both in the initial page and pushed
//! shows up twice, and every entry carries its arrival sequence number.
//!
//! Dropping a session drops its subscription and any in-flight enrichment.

use crate::db::{collections, BackendDb};
use crate::error::AppError;
use crate::middleware::auth::AuthUser;
use crate::models::{Activity, ActivityWithActor, CheckIn, CheckInWithProfile, ProfileSummary};
use crate::services::realtime::{ChangeHub, ChangeKind, RowFilter, Subscription};
use serde::Serialize;
use std::collections::{HashSet, VecDeque};

/// One feed entry and the order it arrived in (0 for the initial page).
#[derive(Debug, Clone, Serialize)]
pub struct FeedEntry<T> {
    pub seq: u64,
    #[serde(flatten)]
    pub item: T,
}

/// Bounded log, newest arrival first.
#[derive(Debug, Clone)]
pub struct FeedLog<T> {
    entries: VecDeque<FeedEntry<T>>,
    max: usize,
    next_seq: u64,
}

impl<T> FeedLog<T> {
    pub fn new(max: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(max),
            max,
            next_seq: 1,
        }
    }

    /// Replace the contents with an initial page (already newest first).
    pub fn seed(&mut self, page: Vec<T>) {
        self.entries = page
            .into_iter()
            .take(self.max)
            .map(|item| FeedEntry { seq: 0, item })
            .collect();
    }

    /// Insert a pushed item at the front, evicting the oldest past `max`.
    pub fn prepend(&mut self, item: T) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push_front(FeedEntry { seq, item });
        self.entries.truncate(self.max);
        seq
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &FeedEntry<T>> {
        self.entries.iter()
    }

    pub fn items(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|e| &e.item)
    }
}

/// Load state of a feed's initial page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FeedState {
    Loading,
    Ready,
    Failed { message: String, retryable: bool },
}

impl FeedState {
    fn from_error(error: &AppError) -> Self {
        FeedState::Failed {
            message: error.to_string(),
            retryable: true,
        }
    }
}

/// What a view receives when it first opens a feed.
#[derive(Debug, Clone, Serialize)]
pub struct FeedSnapshot<'a, T> {
    #[serde(flatten)]
    pub state: &'a FeedState,
    pub items: Vec<&'a T>,
}

async fn resolve_summary(
    db: &BackendDb,
    viewer: &AuthUser,
    user_id: &str,
) -> Option<ProfileSummary> {
    match db.get_profile(viewer, user_id).await {
        Ok(Some(profile)) => Some(profile.into()),
        Ok(None) => {
            tracing::debug!(user_id, "No profile for pushed row, dropping");
            None
        }
        Err(e) => {
            tracing::debug!(user_id, error = %e, "Profile lookup failed, dropping pushed row");
            None
        }
    }
}

// ─── Check-in Feed ───────────────────────────────────────────

/// Friends' public check-ins, live.
pub struct CheckInFeed {
    db: BackendDb,
    viewer: AuthUser,
    subscription: Subscription,
    /// Viewer and accepted friends at load time
    authors: HashSet<String>,
    log: FeedLog<CheckInWithProfile>,
    state: FeedState,
}

impl CheckInFeed {
    pub async fn mount(db: BackendDb, hub: &ChangeHub, viewer: AuthUser, max: usize) -> Self {
        let subscription = hub.subscribe(
            collections::CHECK_INS,
            ChangeKind::Insert,
            Some(RowFilter::eq("is_public", "true")),
        );

        let mut feed = Self {
            db,
            viewer,
            subscription,
            authors: HashSet::new(),
            log: FeedLog::new(max),
            state: FeedState::Loading,
        };
        feed.load().await;
        feed
    }

    async fn fetch_initial(&self) -> Result<(HashSet<String>, Vec<CheckInWithProfile>), AppError> {
        let limit = self.log.max as u32;

        let mut authors: HashSet<String> = self
            .db
            .accepted_friendships(&self.viewer, &self.viewer.user_id)
            .await?
            .iter()
            .map(|f| f.counterpart(&self.viewer.user_id).to_string())
            .collect();
        authors.insert(self.viewer.user_id.clone());

        let friends = self.db.friends_recent_check_ins(&self.viewer, limit).await?;
        if !friends.is_empty() {
            return Ok((authors, friends));
        }

        // Nothing from friends yet: show the viewer's own
        let own = self
            .db
            .check_ins_for_user(&self.viewer, &self.viewer.user_id, limit)
            .await?;
        Ok((authors, own.into_iter().map(CheckInWithProfile::own).collect()))
    }

    async fn load(&mut self) {
        self.state = FeedState::Loading;
        match self.fetch_initial().await {
            Ok((authors, page)) => {
                self.authors = authors;
                self.log.seed(page);
                self.state = FeedState::Ready;
            }
            Err(e) => {
                tracing::warn!(user_id = %self.viewer.user_id, error = %e, "Check-in feed load failed");
                self.state = FeedState::from_error(&e);
            }
        }
    }

    /// Re-run the initial fetch after a failure.
    pub async fn retry(&mut self) {
        self.load().await;
    }

    pub fn state(&self) -> &FeedState {
        &self.state
    }

    pub fn log(&self) -> &FeedLog<CheckInWithProfile> {
        &self.log
    }

    pub fn snapshot(&self) -> FeedSnapshot<'_, CheckInWithProfile> {
        FeedSnapshot {
            state: &self.state,
            items: self.log.items().collect(),
        }
    }

    /// Wait for the next pushed check-in that belongs in this feed.
    ///
    /// Returns `None` once the change stream closes.
    pub async fn next_push(&mut self) -> Option<CheckInWithProfile> {
        loop {
            let event = self.subscription.next().await?;

            let check_in: CheckIn = match serde_json::from_value(event.record.clone()) {
                Ok(c) => c,
                Err(e) => {
                    tracing::debug!(error = %e, "Undecodable check-in row, dropping");
                    continue;
                }
            };

            if !check_in.is_public || !self.authors.contains(&check_in.user_id) {
                continue;
            }

            let Some(profile) = resolve_summary(&self.db, &self.viewer, &check_in.user_id).await
            else {
                continue;
            };

            let item = CheckInWithProfile { check_in, profile };
            self.log.prepend(item.clone());
            return Some(item);
        }
    }
}

// ─── Activity Feed ───────────────────────────────────────────

/// Activities addressed to the viewer, live.
pub struct ActivityFeed {
    db: BackendDb,
    viewer: AuthUser,
    subscription: Subscription,
    log: FeedLog<ActivityWithActor>,
    state: FeedState,
}

impl ActivityFeed {
    pub async fn mount(db: BackendDb, hub: &ChangeHub, viewer: AuthUser, max: usize) -> Self {
        let subscription = hub.subscribe(
            collections::ACTIVITIES,
            ChangeKind::Insert,
            Some(RowFilter::eq("user_id", viewer.user_id.clone())),
        );

        let mut feed = Self {
            db,
            viewer,
            subscription,
            log: FeedLog::new(max),
            state: FeedState::Loading,
        };
        feed.load().await;
        feed
    }

    async fn load(&mut self) {
        self.state = FeedState::Loading;
        match self
            .db
            .friends_recent_activities(&self.viewer, self.log.max as u32)
            .await
        {
            Ok(page) => {
                self.log.seed(page);
                self.state = FeedState::Ready;
            }
            Err(e) => {
                tracing::warn!(user_id = %self.viewer.user_id, error = %e, "Activity feed load failed");
                self.state = FeedState::from_error(&e);
            }
        }
    }

    pub async fn retry(&mut self) {
        self.load().await;
    }

    pub fn state(&self) -> &FeedState {
        &self.state
    }

    pub fn log(&self) -> &FeedLog<ActivityWithActor> {
        &self.log
    }

    pub fn snapshot(&self) -> FeedSnapshot<'_, ActivityWithActor> {
        FeedSnapshot {
            state: &self.state,
            items: self.log.items().collect(),
        }
    }

    /// Wait for the next pushed activity addressed to the viewer.
    pub async fn next_push(&mut self) -> Option<ActivityWithActor> {
        loop {
            let event = self.subscription.next().await?;

            let activity: Activity = match serde_json::from_value(event.record.clone()) {
                Ok(a) => a,
                Err(e) => {
                    tracing::debug!(error = %e, "Undecodable activity row, dropping");
                    continue;
                }
            };

            let Some(actor) = resolve_summary(&self.db, &self.viewer, &activity.actor_id).await
            else {
                continue;
            };

            let item = ActivityWithActor::from_parts(activity, actor);
            self.log.prepend(item.clone());
            return Some(item);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_log_bounded_newest_first() {
        let mut log = FeedLog::new(3);
        log.seed(vec!["a", "b", "c", "d"]);
        assert_eq!(log.len(), 3);
        assert!(log.entries().all(|e| e.seq == 0));

        for item in ["p1", "p2", "p3", "p4"] {
            log.prepend(item);
            assert!(log.len() <= 3);
            assert_eq!(log.items().next(), Some(&item));
        }

        let seqs: Vec<u64> = log.entries().map(|e| e.seq).collect();
        assert_eq!(seqs, vec![4, 3, 2]);
    }

    #[test]
    fn test_failed_state_is_retryable() {
        let state = FeedState::from_error(&AppError::Backend("timeout".to_string()));
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["state"], "failed");
        assert_eq!(json["retryable"], true);
    }

    fn viewer(id: &str) -> AuthUser {
        AuthUser {
            user_id: id.to_string(),
            email: None,
            full_name: None,
            access_token: String::new(),
        }
    }

    #[tokio::test]
    async fn test_retry_after_backend_recovers() {
        let hub = ChangeHub::new();
        let db = BackendDb::memory(hub.clone());
        let store = db.memory_store().unwrap().clone();

        store.set_offline(true);
        let mut feed = ActivityFeed::mount(db.clone(), &hub, viewer("bob"), 10).await;
        assert!(matches!(
            feed.state(),
            FeedState::Failed { retryable: true, .. }
        ));

        store.set_offline(false);
        feed.retry().await;
        assert_eq!(feed.state(), &FeedState::Ready);
        assert!(feed.log().is_empty());

        let mut feed = CheckInFeed::mount(db, &hub, viewer("bob"), 10).await;
        assert_eq!(feed.state(), &FeedState::Ready);
        feed.retry().await;
        assert_eq!(feed.state(), &FeedState::Ready);
        assert_eq!(hub.active_subscriptions(), 2);
    }

    fn public_check_in(user_id: &str, name: &str) -> serde_json::Value {
        serde_json::json!({
            "user_id": user_id,
            "location_name": name,
            "location_type": "park",
            "latitude": 37.7694,
            "longitude": -122.4862,
            "is_public": true,
        })
    }

    #[tokio::test]
    async fn test_push_without_profile_is_dropped() {
        let hub = ChangeHub::new();
        let db = BackendDb::memory(hub.clone());
        let store = db.memory_store().unwrap().clone();

        // The viewer's own rows pass the author check; only the profile is missing
        let mut feed = CheckInFeed::mount(db, &hub, viewer("ghost"), 10).await;
        assert_eq!(feed.state(), &FeedState::Ready);

        store
            .insert("ghost", collections::CHECK_INS, public_check_in("ghost", "Lands End"))
            .unwrap();

        let pushed =
            tokio::time::timeout(Duration::from_millis(100), feed.next_push()).await;
        assert!(pushed.is_err());
        assert!(feed.log().is_empty());
    }

    #[tokio::test]
    async fn test_pushes_keep_feed_bounded_newest_first() {
        let hub = ChangeHub::new();
        let db = BackendDb::memory(hub.clone());
        let store = db.memory_store().unwrap().clone();
        store
            .insert(
                "alice",
                collections::PROFILES,
                serde_json::json!({ "id": "alice", "username": "alice" }),
            )
            .unwrap();

        let mut feed = CheckInFeed::mount(db, &hub, viewer("alice"), 3).await;

        for i in 0..5 {
            let name = format!("Stop {}", i);
            store
                .insert("alice", collections::CHECK_INS, public_check_in("alice", &name))
                .unwrap();

            let pushed = tokio::time::timeout(Duration::from_secs(1), feed.next_push())
                .await
                .unwrap()
                .unwrap();
            assert_eq!(pushed.check_in.location_name, name);
            assert!(feed.log().len() <= 3);
            assert_eq!(feed.log().items().next(), Some(&pushed));
        }

        let names: Vec<&str> = feed
            .log()
            .items()
            .map(|c| c.check_in.location_name.as_str())
            .collect();
        assert_eq!(names, vec!["Stop 4", "Stop 3", "Stop 2"]);
    }
}
