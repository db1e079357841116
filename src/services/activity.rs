// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity feed service.
//!
//! Handles:
//! 1. Reading the activities addressed to a user
//! 2. Fanning out a new activity to every accepted friend
//! 3. Addressing a single activity to one friend
//! 4. Rendering activities as feed text

use crate::db::BackendDb;
use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::{ActivityType, ActivityWithActor, NewActivity};

/// Default number of activities in the feed.
pub const DEFAULT_ACTIVITY_LIMIT: u32 = 10;

#[derive(Clone)]
pub struct ActivityService {
    db: BackendDb,
}

impl ActivityService {
    pub fn new(db: BackendDb) -> Self {
        Self { db }
    }

    /// Recent activities addressed to the viewer, newest first.
    pub async fn recent(&self, viewer: &AuthUser, limit: u32) -> Result<Vec<ActivityWithActor>> {
        self.db.friends_recent_activities(viewer, limit).await
    }

    /// Record an activity for every accepted friend of `actor`.
    ///
    /// Best-effort: failures are logged and the number of rows written is
    /// returned.
    pub async fn fan_out(
        &self,
        actor: &AuthUser,
        activity_type: ActivityType,
        activity_data: serde_json::Value,
    ) -> usize {
        let friendships = match self.db.accepted_friendships(actor, &actor.user_id).await {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(
                    actor_id = %actor.user_id,
                    activity_type = activity_type.as_str(),
                    error = %e,
                    "Failed to load friends for activity fan-out"
                );
                return 0;
            }
        };

        let activities: Vec<NewActivity> = friendships
            .iter()
            .map(|f| NewActivity {
                user_id: f.counterpart(&actor.user_id).to_string(),
                actor_id: actor.user_id.clone(),
                activity_type,
                activity_data: activity_data.clone(),
            })
            .collect();

        if activities.is_empty() {
            return 0;
        }

        match self.db.insert_activities(actor, &activities).await {
            Ok(rows) => {
                tracing::debug!(
                    actor_id = %actor.user_id,
                    activity_type = activity_type.as_str(),
                    recipients = rows.len(),
                    "Activity fanned out"
                );
                rows.len()
            }
            Err(e) => {
                tracing::warn!(
                    actor_id = %actor.user_id,
                    activity_type = activity_type.as_str(),
                    error = %e,
                    "Failed to create activity notifications"
                );
                0
            }
        }
    }

    /// Address a friend-related activity to one user.
    pub async fn create_friend_activity(
        &self,
        actor: &AuthUser,
        friend_id: &str,
        activity_type: ActivityType,
    ) -> Result<()> {
        let activity = NewActivity {
            user_id: friend_id.to_string(),
            actor_id: actor.user_id.clone(),
            activity_type,
            activity_data: serde_json::json!({}),
        };
        self.db.insert_activities(actor, &[activity]).await?;
        Ok(())
    }
}

/// Feed line for an activity.
pub fn format_activity_text(activity: &ActivityWithActor) -> String {
    let actor = [&activity.actor_full_name, &activity.actor_username]
        .into_iter()
        .find(|s| !s.is_empty())
        .map(String::as_str)
        .unwrap_or("Someone");
    let dog = if activity.actor_dog_name.is_empty() {
        String::new()
    } else {
        format!(" with {}", activity.actor_dog_name)
    };

    match activity.activity_type {
        ActivityType::CheckIn => {
            let location = activity
                .activity_data
                .get("location_name")
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .unwrap_or("somewhere");
            format!("{}{} checked in at {}", actor, dog, location)
        }
        ActivityType::FriendAccepted => format!("{} accepted your friend request", actor),
        ActivityType::WalkStarted => format!("{}{} started a walk", actor, dog),
        ActivityType::WalkEnded => {
            let duration = match activity.activity_data.get("duration") {
                Some(serde_json::Value::String(d)) if !d.is_empty() => format!(" for {}", d),
                Some(serde_json::Value::Number(n)) if n.as_f64() != Some(0.0) => {
                    format!(" for {}", n)
                }
                _ => String::new(),
            };
            format!("{}{} finished a walk{}", actor, dog, duration)
        }
        ActivityType::WalkJoined => format!("{}{} joined a walk", actor, dog),
        ActivityType::FriendRequest | ActivityType::Unknown => {
            format!("{} did something", actor)
        }
    }
}

/// Feed icon for an activity type.
pub fn activity_icon(activity_type: ActivityType) -> &'static str {
    match activity_type {
        ActivityType::CheckIn => "📍",
        ActivityType::FriendRequest | ActivityType::FriendAccepted => "👥",
        ActivityType::WalkStarted | ActivityType::WalkEnded | ActivityType::WalkJoined => "🚶",
        ActivityType::Unknown => "📱",
    }
}
