// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Proximity filtering for the nearby map view.
//!
//! Two passes: a cheap latitude/longitude box the backend can evaluate,
//! then an exact great-circle distance filter and sort over the survivors.

use crate::models::{Coordinate, Geotagged};
use geo::{Distance, Haversine};
use serde::Serialize;

/// Kilometres per degree of latitude (and of longitude at the equator).
const KM_PER_DEGREE: f64 = 111.0;

/// Below this `cos(lat)` a longitude delta is meaningless.
const POLE_EPSILON: f64 = 1e-6;

/// Approximate search box around a point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl BoundingBox {
    /// Box enclosing every point within `radius_km` of `center`.
    ///
    /// Near the poles the longitude span covers the whole globe. Boxes that
    /// cross the antimeridian are not split, so points just across it are
    /// missed.
    pub fn around(center: Coordinate, radius_km: f64) -> Self {
        let lat_delta = radius_km / KM_PER_DEGREE;
        let cos_lat = center.lat.to_radians().cos();

        let (min_lng, max_lng) = if cos_lat < POLE_EPSILON {
            (-180.0, 180.0)
        } else {
            let lng_delta = radius_km / (KM_PER_DEGREE * cos_lat);
            if lng_delta > 180.0 {
                (-180.0, 180.0)
            } else {
                (center.lng - lng_delta, center.lng + lng_delta)
            }
        };

        Self {
            min_lat: (center.lat - lat_delta).max(-90.0),
            max_lat: (center.lat + lat_delta).min(90.0),
            min_lng,
            max_lng,
        }
    }

    pub fn contains(&self, point: Coordinate) -> bool {
        (self.min_lat..=self.max_lat).contains(&point.lat)
            && (self.min_lng..=self.max_lng).contains(&point.lng)
    }
}

/// Great-circle distance in kilometres.
pub fn distance_km(a: Coordinate, b: Coordinate) -> f64 {
    Haversine.distance(a.to_point(), b.to_point()) / 1000.0
}

/// An item with its distance from the search center.
#[derive(Debug, Clone, Serialize)]
pub struct Ranked<T> {
    #[serde(flatten)]
    pub item: T,
    pub distance_km: f64,
}

/// Keep items within `radius_km` of `center`, nearest first.
pub fn within_radius<T: Geotagged>(
    center: Coordinate,
    radius_km: f64,
    items: impl IntoIterator<Item = T>,
) -> Vec<Ranked<T>> {
    let mut ranked: Vec<Ranked<T>> = items
        .into_iter()
        .map(|item| {
            let distance_km = distance_km(center, item.coordinate());
            Ranked { item, distance_km }
        })
        .filter(|r| r.distance_km <= radius_km)
        .collect();

    ranked.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    ranked
}
