//! Backend data access layer.
//!
//! The hosted backend owns all durable state. [`BackendDb`] exposes typed
//! operations over either the remote query interface or the in-process
//! [`MemoryStore`] used for tests and local development.

pub mod backend;
pub mod memory;
pub mod query;
pub mod rest;

pub use backend::BackendDb;
pub use memory::MemoryStore;
pub use query::{Filter, Query};
pub use rest::RestClient;

/// Collection names as constants.
pub mod collections {
    pub const CHECK_INS: &str = "check_ins";
    pub const PROFILES: &str = "profiles";
    pub const FRIENDS: &str = "friends";
    pub const ACTIVITIES: &str = "activities";
}

/// Remote procedures exposed by the backend.
pub mod rpc {
    /// Friends' public check-ins, newest first, joined with author profiles.
    pub const FRIENDS_RECENT_CHECKINS: &str = "get_friends_recent_checkins";
    /// Activities addressed to the viewer, newest first, joined with actor profiles.
    pub const FRIENDS_RECENT_ACTIVITIES: &str = "get_friends_recent_activities";
}
