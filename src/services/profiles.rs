// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User profiles: lazy creation, owner updates, feed lookups.

use crate::db::BackendDb;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{NewProfile, Profile, ProfileSummary, ProfileUpdate};

/// Fallback username when the account has no email.
const DEFAULT_USERNAME: &str = "user";

#[derive(Clone)]
pub struct ProfileService {
    db: BackendDb,
}

impl ProfileService {
    pub fn new(db: BackendDb) -> Self {
        Self { db }
    }

    fn username_for(user: &AuthUser) -> String {
        user.email_handle().unwrap_or(DEFAULT_USERNAME).to_string()
    }

    /// The caller's profile, created with defaults if missing.
    ///
    /// Creation failure is returned to the caller.
    pub async fn get_or_create(&self, user: &AuthUser) -> Result<Profile> {
        if let Some(profile) = self.db.get_profile(user, &user.user_id).await? {
            return Ok(profile);
        }

        let new = NewProfile {
            id: user.user_id.clone(),
            username: Self::username_for(user),
            full_name: user.full_name.clone().unwrap_or_default(),
            dog_name: String::new(),
        };
        tracing::info!(user_id = %user.user_id, username = %new.username, "Creating profile");
        self.db.insert_profile(user, &new).await
    }

    /// Make sure the caller has a profile before writing rows that join to it.
    ///
    /// Failures are logged and swallowed.
    pub async fn ensure_exists(&self, user: &AuthUser) {
        match self.db.get_profile(user, &user.user_id).await {
            Ok(Some(_)) => return,
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(user_id = %user.user_id, error = %e, "Profile lookup failed");
                return;
            }
        }

        let full_name = user
            .full_name
            .clone()
            .or_else(|| user.email_handle().map(str::to_string))
            .unwrap_or_else(|| "Anonymous User".to_string());

        let new = NewProfile {
            id: user.user_id.clone(),
            username: Self::username_for(user),
            full_name,
            dog_name: String::new(),
        };

        if let Err(e) = self.db.insert_profile(user, &new).await {
            tracing::warn!(user_id = %user.user_id, error = %e, "Failed to create profile");
        }
    }

    /// Update the caller's own profile.
    pub async fn update(&self, user: &AuthUser, update: &ProfileUpdate) -> Result<Profile> {
        if update.is_empty() {
            return Err(AppError::BadRequest("No profile fields to update".to_string()));
        }
        self.db
            .update_profile(user, update)
            .await?
            .ok_or_else(|| AppError::NotFound("Profile".to_string()))
    }

    /// Display fields for any user, if they have a profile.
    pub async fn summary(&self, viewer: &AuthUser, user_id: &str) -> Result<Option<ProfileSummary>> {
        Ok(self
            .db
            .get_profile(viewer, user_id)
            .await?
            .map(ProfileSummary::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::realtime::ChangeHub;

    fn user(id: &str, email: Option<&str>, full_name: Option<&str>) -> AuthUser {
        AuthUser {
            user_id: id.to_string(),
            email: email.map(str::to_string),
            full_name: full_name.map(str::to_string),
            access_token: String::new(),
        }
    }

    #[tokio::test]
    async fn test_get_or_create_defaults() {
        let service = ProfileService::new(BackendDb::memory(ChangeHub::new()));

        let rex = user("u1", Some("rex@example.com"), None);
        let profile = service.get_or_create(&rex).await.unwrap();
        assert_eq!(profile.username, "rex");
        assert_eq!(profile.full_name, "");
        assert_eq!(profile.dog_name, "");

        // Second call finds the existing row
        let again = service.get_or_create(&rex).await.unwrap();
        assert_eq!(again, profile);
    }

    #[tokio::test]
    async fn test_ensure_exists_fills_full_name() {
        let service = ProfileService::new(BackendDb::memory(ChangeHub::new()));

        let anon = user("u2", None, None);
        service.ensure_exists(&anon).await;
        let profile = service.get_or_create(&anon).await.unwrap();
        assert_eq!(profile.username, "user");
        assert_eq!(profile.full_name, "Anonymous User");

        let named = user("u3", Some("max@example.com"), Some("Max Power"));
        service.ensure_exists(&named).await;
        let summary = service.summary(&anon, "u3").await.unwrap().unwrap();
        assert_eq!(summary.full_name, "Max Power");
        assert_eq!(summary.username, "max");
    }

    #[tokio::test]
    async fn test_update_requires_fields() {
        let service = ProfileService::new(BackendDb::memory(ChangeHub::new()));
        let rex = user("u1", Some("rex@example.com"), None);
        service.get_or_create(&rex).await.unwrap();

        let err = service.update(&rex, &ProfileUpdate::default()).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let updated = service
            .update(
                &rex,
                &ProfileUpdate {
                    dog_name: Some("Biscuit".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.dog_name, "Biscuit");
        assert_eq!(updated.username, "rex");
    }
}
