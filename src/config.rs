// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Which backend implementation the service talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendMode {
    /// Hosted backend over HTTP.
    Remote,
    /// In-process store (local development and tests).
    Memory,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Hosted backend base URL (e.g. https://xyz.supabase.co)
    pub backend_url: String,
    /// Public anon key sent as `apikey` on every backend call
    pub backend_anon_key: String,
    /// Backend implementation to use
    pub backend_mode: BackendMode,
    /// Frontend URL (CORS origin)
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// Directory for the local check-in fallback cache
    pub local_cache_dir: PathBuf,
    /// Maximum number of entries kept by a live feed
    pub feed_max_items: usize,
    /// Default radius for the nearby view (km)
    pub nearby_radius_km: f64,
    /// Maximum number of candidates fetched by the nearby bounding-box query
    pub nearby_limit: u32,
    /// Per-user sessions unused for this long are discarded
    pub session_idle_timeout: Duration,

    // --- Secrets ---
    /// Secret the backend signs access tokens with (HS256)
    pub jwt_secret: Vec<u8>,
    /// Shared secret for database change webhooks
    pub webhook_secret: Vec<u8>,
}

pub const DEFAULT_FEED_MAX_ITEMS: usize = 10;
pub const DEFAULT_NEARBY_RADIUS_KM: f64 = 10.0;
pub const DEFAULT_NEARBY_LIMIT: u32 = 50;
pub const DEFAULT_SESSION_IDLE_MINUTES: u64 = 120;

impl Config {
    /// Config for tests: in-memory backend and fixed secrets.
    pub fn test_default() -> Self {
        Self {
            backend_url: "http://localhost:54321".to_string(),
            backend_anon_key: "test_anon_key".to_string(),
            backend_mode: BackendMode::Memory,
            frontend_url: "http://localhost:5173".to_string(),
            port: 8080,
            local_cache_dir: env::temp_dir().join("packwalk-test-cache"),
            feed_max_items: DEFAULT_FEED_MAX_ITEMS,
            nearby_radius_km: DEFAULT_NEARBY_RADIUS_KM,
            nearby_limit: DEFAULT_NEARBY_LIMIT,
            session_idle_timeout: Duration::from_secs(DEFAULT_SESSION_IDLE_MINUTES * 60),
            jwt_secret: b"test_jwt_secret_32_bytes_minimum!".to_vec(),
            webhook_secret: b"test_webhook_secret".to_vec(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file is honoured for local development. With
    /// `BACKEND_MODE=memory` the backend URL and anon key are optional.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let backend_mode = match env::var("BACKEND_MODE").as_deref() {
            Ok("memory") => BackendMode::Memory,
            Ok("remote") | Err(_) => BackendMode::Remote,
            Ok(_) => return Err(ConfigError::Invalid("BACKEND_MODE")),
        };

        let required = |name: &'static str| -> Result<String, ConfigError> {
            match (env::var(name), backend_mode) {
                (Ok(v), _) => Ok(v.trim().to_string()),
                (Err(_), BackendMode::Memory) => Ok(String::new()),
                (Err(_), BackendMode::Remote) => Err(ConfigError::Missing(name)),
            }
        };

        let config = Self {
            backend_url: required("SUPABASE_URL")?
                .trim_end_matches('/')
                .to_string(),
            backend_anon_key: required("SUPABASE_ANON_KEY")?,
            backend_mode,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            port: parse_or("PORT", 8080)?,
            local_cache_dir: env::var("LOCAL_CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".packwalk-cache")),
            feed_max_items: parse_or("FEED_MAX_ITEMS", DEFAULT_FEED_MAX_ITEMS)?,
            nearby_radius_km: parse_or("NEARBY_RADIUS_KM", DEFAULT_NEARBY_RADIUS_KM)?,
            nearby_limit: parse_or("NEARBY_LIMIT", DEFAULT_NEARBY_LIMIT)?,
            session_idle_timeout: Duration::from_secs(
                parse_or("SESSION_IDLE_MINUTES", DEFAULT_SESSION_IDLE_MINUTES)?.saturating_mul(60),
            ),

            jwt_secret: env::var("SUPABASE_JWT_SECRET")
                .map_err(|_| ConfigError::Missing("SUPABASE_JWT_SECRET"))?
                .trim()
                .as_bytes()
                .to_vec(),
            webhook_secret: env::var("WEBHOOK_SECRET")
                .map_err(|_| ConfigError::Missing("WEBHOOK_SECRET"))?
                .trim()
                .as_bytes()
                .to_vec(),
        };
        config.validate()
    }

    /// Reject limits that would leave a feed or the nearby view unusable.
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.feed_max_items == 0 {
            return Err(ConfigError::Invalid("FEED_MAX_ITEMS"));
        }
        if !self.nearby_radius_km.is_finite() || self.nearby_radius_km <= 0.0 {
            return Err(ConfigError::Invalid("NEARBY_RADIUS_KM"));
        }
        if self.nearby_limit == 0 {
            return Err(ConfigError::Invalid("NEARBY_LIMIT"));
        }
        if self.session_idle_timeout.is_zero() {
            return Err(ConfigError::Invalid("SESSION_IDLE_MINUTES"));
        }
        Ok(self)
    }
}

/// Parse an optional numeric variable, falling back to a default when unset.
fn parse_or<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
