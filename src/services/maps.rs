// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Hand-off links to the device's maps app.

use crate::models::Coordinate;
use serde::Serialize;

/// Maps app to open for a given device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MapPlatform {
    Apple,
    Google,
}

impl MapPlatform {
    /// Apple Maps on iOS and macOS, Google Maps everywhere else.
    pub fn from_user_agent(user_agent: &str) -> Self {
        const APPLE_DEVICES: [&str; 4] = ["iPad", "iPhone", "iPod", "Macintosh"];

        if APPLE_DEVICES.iter().any(|d| user_agent.contains(d)) {
            MapPlatform::Apple
        } else {
            MapPlatform::Google
        }
    }
}

/// URL showing a named place.
pub fn open_in_maps_url(platform: MapPlatform, name: &str, at: Coordinate) -> String {
    let name = urlencoding::encode(name);
    match platform {
        MapPlatform::Apple => format!(
            "http://maps.apple.com/?q={}&ll={},{}&z=16",
            name, at.lat, at.lng
        ),
        MapPlatform::Google => format!(
            "https://www.google.com/maps/search/?api=1&query={},{}&query_place_id={}",
            at.lat, at.lng, name
        ),
    }
}

/// URL for walking directions to a point.
pub fn directions_url(platform: MapPlatform, to: Coordinate) -> String {
    match platform {
        MapPlatform::Apple => format!("http://maps.apple.com/?daddr={},{}&dirflg=w", to.lat, to.lng),
        MapPlatform::Google => format!(
            "https://www.google.com/maps/dir/?api=1&destination={},{}&travelmode=walking",
            to.lat, to.lng
        ),
    }
}

/// Coordinates as copied to the clipboard.
pub fn coordinates_text(at: Coordinate) -> String {
    format!("{}, {}", at.lat, at.lng)
}

/// Everything the location sheet offers for one place.
#[derive(Debug, Clone, Serialize)]
pub struct MapLinks {
    pub platform: MapPlatform,
    pub open_url: String,
    pub directions_url: String,
    pub coordinates: String,
}

impl MapLinks {
    pub fn new(user_agent: &str, name: &str, at: Coordinate) -> Self {
        let platform = MapPlatform::from_user_agent(user_agent);
        Self {
            platform,
            open_url: open_in_maps_url(platform, name, at),
            directions_url: directions_url(platform, at),
            coordinates: coordinates_text(at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IPHONE: &str =
        "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15";
    const ANDROID: &str = "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36";

    #[test]
    fn test_platform_detection() {
        assert_eq!(MapPlatform::from_user_agent(IPHONE), MapPlatform::Apple);
        assert_eq!(
            MapPlatform::from_user_agent("Mozilla/5.0 (Macintosh; Intel Mac OS X 14_0)"),
            MapPlatform::Apple
        );
        assert_eq!(MapPlatform::from_user_agent(ANDROID), MapPlatform::Google);
        assert_eq!(MapPlatform::from_user_agent(""), MapPlatform::Google);
    }

    #[test]
    fn test_links_encode_name() {
        let at = Coordinate::new(37.7596, -122.4269);
        let links = MapLinks::new(IPHONE, "Dolores Park & Cafe", at);
        assert_eq!(
            links.open_url,
            "http://maps.apple.com/?q=Dolores%20Park%20%26%20Cafe&ll=37.7596,-122.4269&z=16"
        );
        assert_eq!(
            links.directions_url,
            "http://maps.apple.com/?daddr=37.7596,-122.4269&dirflg=w"
        );
        assert_eq!(links.coordinates, "37.7596, -122.4269");

        let google = open_in_maps_url(MapPlatform::Google, "Dog Run", at);
        assert_eq!(
            google,
            "https://www.google.com/maps/search/?api=1&query=37.7596,-122.4269&query_place_id=Dog%20Run"
        );
    }
}
