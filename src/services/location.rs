// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Device geolocation as reported by the views.
//!
//! The view asks for a single fix and passes it along as optional
//! `lat`/`lng` query parameters. Map views fall back to a default center;
//! check-ins need a real fix.

use crate::error::AppError;
use crate::models::Coordinate;
use serde::Deserialize;
use validator::Validate;

/// Map center when the device gave no fix (San Francisco).
pub const DEFAULT_CENTER: Coordinate = Coordinate::new(37.7749, -122.4194);

/// One-shot fix; either half missing means no fix.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct DeviceFix {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

impl DeviceFix {
    /// The reported position, if any. Out-of-range values are rejected.
    pub fn coordinate(&self) -> Result<Option<Coordinate>, AppError> {
        let (Some(lat), Some(lng)) = (self.lat, self.lng) else {
            return Ok(None);
        };
        let coordinate = Coordinate::new(lat, lng);
        coordinate.validate()?;
        Ok(Some(coordinate))
    }

    /// Where to center the map.
    pub fn map_center(&self) -> Result<Coordinate, AppError> {
        Ok(self.coordinate()?.unwrap_or(DEFAULT_CENTER))
    }

    /// A fix for operations that must not use the default.
    pub fn require_precise(&self) -> Result<Coordinate, AppError> {
        self.coordinate()?.ok_or_else(|| {
            AppError::LocationUnavailable(
                "Location access is needed for this. Enable location services and try again."
                    .to_string(),
            )
        })
    }
}
