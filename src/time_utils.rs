// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{DateTime, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse an RFC3339 timestamp into UTC, if valid.
pub fn parse_rfc3339(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn plural(n: i64) -> &'static str {
    if n > 1 {
        "s"
    } else {
        ""
    }
}

/// Long relative time used by the activity feed ("5 minutes ago").
pub fn relative_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = now.signed_duration_since(then).num_seconds();

    if secs < 60 {
        "just now".to_string()
    } else if secs < 3600 {
        let minutes = secs / 60;
        format!("{} minute{} ago", minutes, plural(minutes))
    } else if secs < 86400 {
        let hours = secs / 3600;
        format!("{} hour{} ago", hours, plural(hours))
    } else {
        let days = secs / 86400;
        format!("{} day{} ago", days, plural(days))
    }
}

/// Compact relative time used by the check-in feed ("5m ago").
///
/// Older than a week falls back to the calendar date.
pub fn compact_relative_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = now.signed_duration_since(then).num_minutes();

    if minutes < 1 {
        return "Just now".to_string();
    }
    if minutes < 60 {
        return format!("{}m ago", minutes);
    }
    let hours = minutes / 60;
    if hours < 24 {
        return format!("{}h ago", hours);
    }
    let days = hours / 24;
    if days < 7 {
        return format!("{}d ago", days);
    }
    then.format("%Y-%m-%d").to_string()
}
