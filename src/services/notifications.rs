// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-user in-app notifications (in memory only).

use crate::models::{
    ActionKind, NewNotification, Notification, NotificationAction, NotificationType,
};

/// A user's notification list, newest first.
#[derive(Debug, Clone)]
pub struct NotificationCenter {
    notifications: Vec<Notification>,
    next_id: u64,
}

impl NotificationCenter {
    /// Start with the two demo notifications every new session shows.
    pub fn seeded() -> Self {
        let notifications = vec![
            Notification {
                id: "1".to_string(),
                kind: NotificationType::WalkInvite,
                title: "Walk Invitation".to_string(),
                message: "Sarah wants to join your walk with Buddy!".to_string(),
                time: "2 min ago".to_string(),
                from: Some("Sarah".to_string()),
                read: false,
                action: Some(NotificationAction {
                    kind: ActionKind::AcceptWalkInvite,
                    label: "Accept".to_string(),
                }),
            },
            Notification {
                id: "2".to_string(),
                kind: NotificationType::FriendRequest,
                title: "Friend Request".to_string(),
                message: "Mike wants to be your dog walking friend".to_string(),
                time: "1 hour ago".to_string(),
                from: Some("Mike".to_string()),
                read: false,
                action: Some(NotificationAction {
                    kind: ActionKind::AcceptFriendRequest,
                    label: "Accept".to_string(),
                }),
            },
        ];

        Self {
            notifications,
            next_id: 3,
        }
    }

    /// Add an unread notification at the top.
    pub fn add(&mut self, new: NewNotification) -> Notification {
        let notification = Notification {
            id: self.next_id.to_string(),
            kind: new.kind,
            title: new.title,
            message: new.message,
            time: "Now".to_string(),
            from: new.from,
            read: false,
            action: new.action,
        };
        self.next_id += 1;

        self.notifications.insert(0, notification.clone());
        notification
    }

    /// Mark one notification read. Returns false if there is no such id.
    pub fn mark_as_read(&mut self, id: &str) -> bool {
        match self.notifications.iter_mut().find(|n| n.id == id) {
            Some(notification) => {
                notification.read = true;
                true
            }
            None => false,
        }
    }

    /// Remove one notification. Returns false if there is no such id.
    pub fn dismiss(&mut self, id: &str) -> bool {
        let before = self.notifications.len();
        self.notifications.retain(|n| n.id != id);
        self.notifications.len() != before
    }

    pub fn unread_count(&self) -> usize {
        self.notifications.iter().filter(|n| !n.read).count()
    }

    pub fn list(&self) -> &[Notification] {
        &self.notifications
    }
}
