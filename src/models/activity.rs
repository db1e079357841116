// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Friend activity model for storage and API.

use super::profile::ProfileSummary;
use serde::{Deserialize, Serialize};

/// Notable action fanned out to an actor's friends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    CheckIn,
    FriendRequest,
    FriendAccepted,
    WalkStarted,
    WalkEnded,
    WalkJoined,
    /// Types added on the backend after this client was built
    #[serde(other)]
    Unknown,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::CheckIn => "check_in",
            ActivityType::FriendRequest => "friend_request",
            ActivityType::FriendAccepted => "friend_accepted",
            ActivityType::WalkStarted => "walk_started",
            ActivityType::WalkEnded => "walk_ended",
            ActivityType::WalkJoined => "walk_joined",
            ActivityType::Unknown => "unknown",
        }
    }
}

/// Activity row in the `activities` collection. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Activity {
    pub id: String,
    /// Recipient
    pub user_id: String,
    pub actor_id: String,
    pub activity_type: ActivityType,
    #[serde(default)]
    pub activity_data: serde_json::Value,
    pub created_at: String,
}

/// Insert payload for the `activities` collection.
#[derive(Debug, Clone, Serialize)]
pub struct NewActivity {
    pub user_id: String,
    pub actor_id: String,
    pub activity_type: ActivityType,
    pub activity_data: serde_json::Value,
}

/// Activity joined with the actor's profile, as returned by the
/// `get_friends_recent_activities` RPC.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActivityWithActor {
    pub id: String,
    pub actor_id: String,
    #[serde(default)]
    pub actor_username: String,
    #[serde(default)]
    pub actor_full_name: String,
    #[serde(default)]
    pub actor_dog_name: String,
    #[serde(default)]
    pub actor_avatar_url: Option<String>,
    pub activity_type: ActivityType,
    #[serde(default)]
    pub activity_data: serde_json::Value,
    pub created_at: String,
}

impl ActivityWithActor {
    pub fn from_parts(activity: Activity, actor: ProfileSummary) -> Self {
        Self {
            id: activity.id,
            actor_id: activity.actor_id,
            actor_username: actor.username,
            actor_full_name: actor.full_name,
            actor_dog_name: actor.dog_name,
            actor_avatar_url: actor.avatar_url,
            activity_type: activity.activity_type,
            activity_data: activity.activity_data,
            created_at: activity.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_activity_type_tolerated() {
        let t: ActivityType = serde_json::from_str("\"dog_birthday\"").unwrap();
        assert_eq!(t, ActivityType::Unknown);

        let t: ActivityType = serde_json::from_str("\"walk_ended\"").unwrap();
        assert_eq!(t, ActivityType::WalkEnded);
    }
}
