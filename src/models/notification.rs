// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! In-app notification model (client-local, never persisted).

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    WalkInvite,
    FriendRequest,
    WalkJoined,
    WalkEnded,
}

/// Follow-up the view can offer on a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    AcceptWalkInvite,
    AcceptFriendRequest,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationAction {
    pub kind: ActionKind,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    /// Display time label ("Now", "2 min ago")
    pub time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    pub read: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<NotificationAction>,
}

/// Caller-supplied part of a notification; id, time and read state are assigned.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewNotification {
    #[serde(rename = "type")]
    pub kind: NotificationType,
    #[validate(length(min = 1, max = 100))]
    pub title: String,
    #[validate(length(min = 1, max = 500))]
    pub message: String,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub action: Option<NotificationAction>,
}
