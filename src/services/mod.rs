// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod activity;
pub mod cache;
pub mod checkins;
pub mod dogs;
pub mod feed;
pub mod friends;
pub mod location;
pub mod maps;
pub mod notifications;
pub mod profiles;
pub mod proximity;
pub mod realtime;
pub mod session;
pub mod walk;

pub use activity::ActivityService;
pub use cache::LocalStore;
pub use checkins::CheckInService;
pub use feed::{ActivityFeed, CheckInFeed, FeedLog, FeedState};
pub use friends::FriendService;
pub use profiles::ProfileService;
pub use realtime::ChangeHub;
pub use session::SessionRegistry;
pub use walk::WalkSimulator;
