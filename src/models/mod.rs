// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod activity;
pub mod check_in;
pub mod dog;
pub mod friendship;
pub mod location;
pub mod notification;
pub mod profile;
pub mod walk;

pub use activity::{Activity, ActivityType, ActivityWithActor, NewActivity};
pub use check_in::{
    CheckIn, CheckInDraft, CheckInUpdate, CheckInWithProfile, LocalCheckIn, LocationType,
    NewCheckIn,
};
pub use dog::{Dog, DogSize, DogUpdate, NewDog};
pub use friendship::{FriendStatus, Friendship};
pub use location::{Coordinate, Geotagged};
pub use notification::{
    ActionKind, NewNotification, Notification, NotificationAction, NotificationType,
};
pub use profile::{NewProfile, Profile, ProfileSummary, ProfileUpdate};
pub use walk::WalkStats;
