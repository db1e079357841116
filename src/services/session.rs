// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-user client-local state: walk, dogs and notifications.
//!
//! Sessions are created on a user's first request and discarded on
//! sign-out, or by the idle sweep once the user has gone quiet. Components
//! sit behind their own `std::sync::Mutex`; no lock is held across an
//! `.await`.

use crate::services::dogs::DogRegistry;
use crate::services::notifications::NotificationCenter;
use crate::services::walk::WalkSimulator;
use dashmap::DashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::{interval, Instant, MissedTickBehavior};

/// How often the idle sweep runs.
pub const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// One signed-in user's providers.
pub struct UserSession {
    walk: Mutex<WalkSimulator>,
    dogs: Mutex<DogRegistry>,
    notifications: Mutex<NotificationCenter>,
    last_seen: Mutex<Instant>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

impl UserSession {
    fn new() -> Self {
        Self {
            walk: Mutex::new(WalkSimulator::new()),
            dogs: Mutex::new(DogRegistry::new()),
            notifications: Mutex::new(NotificationCenter::seeded()),
            last_seen: Mutex::new(Instant::now()),
        }
    }

    fn touch(&self) {
        *lock(&self.last_seen) = Instant::now();
    }

    fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(*lock(&self.last_seen))
    }

    /// End any active walk before the session is discarded.
    fn close(&self, user_id: &str, reason: &'static str) {
        if let Some(stats) = self.walk().end() {
            tracing::info!(user_id, reason, duration = stats.duration, "Walk ended with session");
        }
    }

    pub fn walk(&self) -> MutexGuard<'_, WalkSimulator> {
        lock(&self.walk)
    }

    pub fn dogs(&self) -> MutexGuard<'_, DogRegistry> {
        lock(&self.dogs)
    }

    pub fn notifications(&self) -> MutexGuard<'_, NotificationCenter> {
        lock(&self.notifications)
    }
}

/// All live user sessions.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<String, Arc<UserSession>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The user's session, created on first access. Counts as activity
    /// for the idle sweep.
    pub fn get_or_create(&self, user_id: &str) -> Arc<UserSession> {
        let session = self
            .sessions
            .entry(user_id.to_string())
            .or_insert_with(|| {
                tracing::debug!(user_id, "Creating user session");
                Arc::new(UserSession::new())
            })
            .clone();
        session.touch();
        session
    }

    /// Tear down the user's session. Any active walk is ended.
    ///
    /// Returns whether a session existed.
    pub fn sign_out(&self, user_id: &str) -> bool {
        let Some((_, session)) = self.sessions.remove(user_id) else {
            return false;
        };

        session.close(user_id, "sign_out");
        tracing::info!(user_id, "User session removed");
        true
    }

    /// Discard sessions not used for `max_idle`, ending their walks.
    ///
    /// Returns the number of sessions evicted.
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        let now = Instant::now();
        let stale: Vec<String> = self
            .sessions
            .iter()
            .filter(|entry| entry.value().idle_for(now) >= max_idle)
            .map(|entry| entry.key().clone())
            .collect();

        let mut evicted = 0;
        for user_id in stale {
            // Re-checked under the shard lock; a request may have touched it since
            let removed = self
                .sessions
                .remove_if(&user_id, |_, session| session.idle_for(now) >= max_idle);
            if let Some((_, session)) = removed {
                session.close(&user_id, "idle");
                evicted += 1;
            }
        }

        if evicted > 0 {
            tracing::info!(evicted, remaining = self.sessions.len(), "Evicted idle user sessions");
        }
        evicted
    }

    /// Run `evict_idle` every `every`, forever.
    pub async fn run_idle_sweep(&self, max_idle: Duration, every: Duration) {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            self.evict_idle(max_idle);
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
