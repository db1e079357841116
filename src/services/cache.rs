// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Local key-value fallback for when the backend is unreachable.
//!
//! Values are strings; the check-in helpers store a JSON array of
//! [`LocalCheckIn`] per user under `dogWalkerCheckIns:<user>`.

use crate::error::AppError;
use crate::models::LocalCheckIn;
use dashmap::DashMap;
use std::path::PathBuf;

const CHECK_INS_KEY_PREFIX: &str = "dogWalkerCheckIns";

/// Errors from the local store.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Local store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Local store value is not valid JSON: {0}")]
    Corrupt(#[from] serde_json::Error),
}

impl From<CacheError> for AppError {
    fn from(err: CacheError) -> Self {
        AppError::Internal(err.into())
    }
}

/// String key-value store: a directory of files, or memory for tests.
pub enum LocalStore {
    Memory(DashMap<String, String>),
    Dir(PathBuf),
}

impl LocalStore {
    pub fn memory() -> Self {
        LocalStore::Memory(DashMap::new())
    }

    pub fn dir(path: impl Into<PathBuf>) -> Self {
        LocalStore::Dir(path.into())
    }

    fn file_for(dir: &std::path::Path, key: &str) -> PathBuf {
        dir.join(format!("{}.json", urlencoding::encode(key)))
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        match self {
            LocalStore::Memory(map) => Ok(map.get(key).map(|v| v.value().clone())),
            LocalStore::Dir(dir) => match tokio::fs::read_to_string(Self::file_for(dir, key)).await {
                Ok(value) => Ok(Some(value)),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
                Err(e) => Err(e.into()),
            },
        }
    }

    pub async fn set(&self, key: &str, value: String) -> Result<(), CacheError> {
        match self {
            LocalStore::Memory(map) => {
                map.insert(key.to_string(), value);
            }
            LocalStore::Dir(dir) => {
                tokio::fs::create_dir_all(dir).await?;
                tokio::fs::write(Self::file_for(dir, key), value).await?;
            }
        }
        Ok(())
    }

    /// Cached check-ins for a user, newest first. Empty when nothing is cached.
    pub async fn load_check_ins(&self, user_id: &str) -> Result<Vec<LocalCheckIn>, CacheError> {
        match self.get(&check_ins_key(user_id)).await? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    /// Overwrite a user's cached check-ins.
    pub async fn save_check_ins(
        &self,
        user_id: &str,
        check_ins: &[LocalCheckIn],
    ) -> Result<(), CacheError> {
        let raw = serde_json::to_string(check_ins)?;
        self.set(&check_ins_key(user_id), raw).await
    }
}

pub fn check_ins_key(user_id: &str) -> String {
    format!("{}:{}", CHECK_INS_KEY_PREFIX, user_id)
}
