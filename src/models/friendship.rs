// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Friendship edge model.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FriendStatus {
    Pending,
    Accepted,
}

impl FriendStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FriendStatus::Pending => "pending",
            FriendStatus::Accepted => "accepted",
        }
    }
}

/// Directed edge in the `friends` collection (requester → addressee).
///
/// Whether accepting one direction creates the reverse edge is decided by
/// the backend; readers treat an accepted edge in either direction as a
/// friendship.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Friendship {
    pub user_id: String,
    pub friend_id: String,
    pub status: FriendStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Friendship {
    /// The other side of the edge, seen from `user_id`.
    pub fn counterpart(&self, user_id: &str) -> &str {
        if self.user_id == user_id {
            &self.friend_id
        } else {
            &self.user_id
        }
    }
}
