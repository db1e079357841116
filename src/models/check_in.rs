// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Check-in model for storage and API.

use super::location::{Coordinate, Geotagged};
use super::profile::ProfileSummary;
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// Kind of place a check-in pins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum LocationType {
    Park,
    Poi,
    #[default]
    Custom,
}

impl LocationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationType::Park => "park",
            LocationType::Poi => "poi",
            LocationType::Custom => "custom",
        }
    }

    /// Marker shown next to the location name in the feed.
    pub fn emoji(&self) -> &'static str {
        match self {
            LocationType::Park => "🏞️",
            LocationType::Poi => "📍",
            LocationType::Custom => "📌",
        }
    }
}

/// Check-in row in the `check_ins` collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CheckIn {
    pub id: String,
    /// Owner (immutable after creation)
    pub user_id: String,
    pub location_name: String,
    pub location_type: LocationType,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
    pub is_public: bool,
    /// Creation time (ISO 8601, immutable after creation)
    pub created_at: String,
}

impl Geotagged for CheckIn {
    fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// Check-in joined with its author's profile, as shown in feeds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckInWithProfile {
    #[serde(flatten)]
    pub check_in: CheckIn,
    #[serde(flatten)]
    pub profile: ProfileSummary,
}

impl Geotagged for CheckInWithProfile {
    fn coordinate(&self) -> Coordinate {
        self.check_in.coordinate()
    }
}

impl CheckInWithProfile {
    /// Present one of the viewer's own check-ins in the friends feed.
    pub fn own(check_in: CheckIn) -> Self {
        Self {
            check_in,
            profile: ProfileSummary {
                username: "You".to_string(),
                full_name: "Your Check-in".to_string(),
                dog_name: String::new(),
                avatar_url: None,
            },
        }
    }
}

/// What the user submits when checking in.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CheckInDraft {
    #[validate(length(min = 1, max = 100))]
    pub location_name: String,
    #[serde(default)]
    pub location_type: LocationType,
    /// Device fix; missing when location access was denied
    #[serde(default)]
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[serde(default)]
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
    #[serde(default)]
    #[validate(length(max = 500))]
    pub notes: Option<String>,
    #[serde(default)]
    #[validate(url)]
    pub photo_url: Option<String>,
    #[serde(default = "default_public")]
    pub is_public: bool,
}

fn default_public() -> bool {
    true
}

/// Insert payload for the `check_ins` collection.
#[derive(Debug, Clone, Serialize)]
pub struct NewCheckIn {
    pub user_id: String,
    pub location_name: String,
    pub location_type: LocationType,
    pub latitude: f64,
    pub longitude: f64,
    pub notes: Option<String>,
    pub photo_url: Option<String>,
    pub is_public: bool,
}

impl NewCheckIn {
    pub fn from_draft(user_id: &str, draft: CheckInDraft, at: Coordinate) -> Self {
        Self {
            user_id: user_id.to_string(),
            location_name: draft.location_name,
            location_type: draft.location_type,
            latitude: at.lat,
            longitude: at.lng,
            notes: draft.notes,
            photo_url: draft.photo_url,
            is_public: draft.is_public,
        }
    }
}

/// Partial update by the owner. `user_id` and `created_at` are not updatable.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CheckInUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 100))]
    pub location_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_type: Option<LocationType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 500))]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(url)]
    pub photo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
}

/// Check-in as kept in the local fallback cache.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocalCheckIn {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: LocationType,
    pub lat: f64,
    pub lng: f64,
    pub timestamp: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub photo: Option<String>,
    #[serde(default)]
    pub is_public: Option<bool>,
}

impl From<&CheckIn> for LocalCheckIn {
    fn from(check_in: &CheckIn) -> Self {
        Self {
            id: check_in.id.clone(),
            name: check_in.location_name.clone(),
            kind: check_in.location_type,
            lat: check_in.latitude,
            lng: check_in.longitude,
            timestamp: check_in.created_at.clone(),
            notes: check_in.notes.clone(),
            photo: check_in.photo_url.clone(),
            is_public: Some(check_in.is_public),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_profile_flattens() {
        let record = CheckInWithProfile {
            check_in: CheckIn {
                id: "c1".to_string(),
                user_id: "u1".to_string(),
                location_name: "Dolores Park".to_string(),
                location_type: LocationType::Park,
                latitude: 37.7596,
                longitude: -122.4269,
                notes: None,
                photo_url: None,
                is_public: true,
                created_at: "2025-05-01T10:00:00Z".to_string(),
            },
            profile: ProfileSummary {
                username: "sarah".to_string(),
                full_name: "Sarah".to_string(),
                dog_name: "Buddy".to_string(),
                avatar_url: None,
            },
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["location_type"], "park");
        assert_eq!(json["dog_name"], "Buddy");
        assert_eq!(json["user_id"], "u1");

        let back: CheckInWithProfile = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_draft_validation() {
        let draft: CheckInDraft = serde_json::from_value(serde_json::json!({
            "location_name": "",
            "latitude": 95.0,
            "longitude": 0.0
        }))
        .unwrap();

        assert!(draft.is_public);
        assert!(draft.validate().is_err());

        let no_fix: CheckInDraft =
            serde_json::from_value(serde_json::json!({"location_name": "Park"})).unwrap();
        assert!(no_fix.validate().is_ok());
        assert_eq!(no_fix.latitude, None);
    }
}
