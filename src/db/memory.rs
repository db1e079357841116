// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process stand-in for the hosted backend.
//!
//! Evaluates the same [`Query`] parameters and remote procedures as the
//! hosted backend over JSON rows, with row-visibility rules matching the
//! backend's policies:
//! - check-ins: readable when public or owned; written by the owner
//! - profiles: readable by everyone; written by the owner
//! - friends: readable and writable by either participant; created by the requester
//! - activities: readable by the recipient; created by the actor
//!
//! Inserts are published to the [`ChangeHub`] the way the backend's
//! change webhooks would deliver them.

use crate::db::collections;
use crate::db::query::{field_text, Query};
use crate::db::rpc;
use crate::error::AppError;
use crate::services::realtime::{ChangeEvent, ChangeHub, ChangeKind};
use crate::time_utils::format_utc_rfc3339;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Columns a row's owner may never change after creation.
const IMMUTABLE_COLUMNS: &[&str] = &["id", "user_id", "actor_id", "created_at"];

/// In-memory backend store.
pub struct MemoryStore {
    /// Rows per collection, oldest first
    tables: RwLock<HashMap<String, Vec<Value>>>,
    next_id: AtomicU64,
    offline: AtomicBool,
    hub: ChangeHub,
}

fn text(row: &Value, column: &str) -> Option<String> {
    row.get(column).and_then(field_text)
}

fn is(row: &Value, column: &str, caller: &str) -> bool {
    text(row, column).is_some_and(|v| v == caller)
}

/// Row-level read policy.
fn visible(table: &str, row: &Value, caller: &str) -> bool {
    match table {
        collections::CHECK_INS => {
            row.get("is_public").and_then(Value::as_bool).unwrap_or(false)
                || is(row, "user_id", caller)
        }
        collections::PROFILES => true,
        collections::FRIENDS => is(row, "user_id", caller) || is(row, "friend_id", caller),
        collections::ACTIVITIES => is(row, "user_id", caller),
        _ => true,
    }
}

/// Row-level insert policy.
fn insertable(table: &str, row: &Value, caller: &str) -> bool {
    match table {
        collections::CHECK_INS | collections::FRIENDS => is(row, "user_id", caller),
        collections::PROFILES => is(row, "id", caller),
        collections::ACTIVITIES => is(row, "actor_id", caller),
        _ => true,
    }
}

/// Row-level update/delete policy.
fn writable(table: &str, row: &Value, caller: &str) -> bool {
    match table {
        collections::CHECK_INS => is(row, "user_id", caller),
        collections::PROFILES => is(row, "id", caller),
        collections::FRIENDS => is(row, "user_id", caller) || is(row, "friend_id", caller),
        collections::ACTIVITIES => false,
        _ => true,
    }
}

impl MemoryStore {
    pub fn new(hub: ChangeHub) -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            offline: AtomicBool::new(false),
            hub,
        }
    }

    /// Simulate an unreachable backend: every call fails until reset.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
        tracing::info!(offline, "Memory backend connectivity changed");
    }

    fn ensure_online(&self) -> Result<(), AppError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(AppError::Backend(AppError::BACKEND_UNREACHABLE.to_string()));
        }
        Ok(())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<String, Vec<Value>>>, AppError> {
        self.ensure_online()?;
        self.tables
            .read()
            .map_err(|_| AppError::Database("memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, Vec<Value>>>, AppError> {
        self.ensure_online()?;
        self.tables
            .write()
            .map_err(|_| AppError::Database("memory store lock poisoned".to_string()))
    }

    fn rows_where(
        tables: &HashMap<String, Vec<Value>>,
        table: &str,
        caller: &str,
        query: &Query,
    ) -> Vec<Value> {
        let rows: Vec<Value> = tables
            .get(table)
            .map(|rows| {
                // Newest-inserted first so the stable sort breaks ties by recency
                rows.iter()
                    .rev()
                    .filter(|row| visible(table, row, caller) && query.matches(row))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        query.order_and_limit(rows)
    }

    /// Read rows visible to `caller`.
    pub fn select(&self, caller: &str, table: &str, query: &Query) -> Result<Vec<Value>, AppError> {
        let tables = self.read()?;
        Ok(Self::rows_where(&tables, table, caller, query))
    }

    /// Insert one row (object) or many (array) and return them as stored.
    pub fn insert(&self, caller: &str, table: &str, rows: Value) -> Result<Vec<Value>, AppError> {
        let rows = match rows {
            Value::Array(rows) => rows,
            row => vec![row],
        };

        let mut stored = Vec::with_capacity(rows.len());
        {
            let mut tables = self.write()?;
            let existing = tables.entry(table.to_string()).or_default();

            for row in rows {
                let Value::Object(mut object) = row else {
                    return Err(AppError::BadRequest("row must be a JSON object".to_string()));
                };

                if !object.contains_key("id") {
                    let n = self.next_id.fetch_add(1, Ordering::SeqCst);
                    object.insert("id".to_string(), Value::String(format!("{}-{}", table, n)));
                }
                if !object.contains_key("created_at") {
                    object.insert(
                        "created_at".to_string(),
                        Value::String(format_utc_rfc3339(chrono::Utc::now())),
                    );
                }

                let row = Value::Object(object);
                if !insertable(table, &row, caller) {
                    return Err(AppError::Backend(format!(
                        "new row violates row-level security policy for table \"{}\"",
                        table
                    )));
                }

                let id = text(&row, "id");
                if existing.iter().any(|r| text(r, "id") == id) {
                    return Err(AppError::Backend(format!(
                        "duplicate key value violates unique constraint \"{}_pkey\"",
                        table
                    )));
                }

                existing.push(row.clone());
                stored.push(row);
            }
        }

        for row in &stored {
            self.hub.publish(ChangeEvent {
                table: table.to_string(),
                kind: ChangeKind::Insert,
                record: row.clone(),
            });
        }

        Ok(stored)
    }

    /// Patch the caller's writable rows matching `query`.
    pub fn update(
        &self,
        caller: &str,
        table: &str,
        query: &Query,
        patch: Value,
    ) -> Result<Vec<Value>, AppError> {
        let Value::Object(patch) = patch else {
            return Err(AppError::BadRequest("patch must be a JSON object".to_string()));
        };

        let mut tables = self.write()?;
        let mut updated = Vec::new();

        if let Some(rows) = tables.get_mut(table) {
            for row in rows.iter_mut() {
                if !(query.matches(row) && writable(table, row, caller)) {
                    continue;
                }
                if let Value::Object(object) = row {
                    apply_patch(object, &patch);
                }
                updated.push(row.clone());
            }
        }

        Ok(updated)
    }

    /// Delete the caller's writable rows matching `query`.
    pub fn delete(&self, caller: &str, table: &str, query: &Query) -> Result<(), AppError> {
        let mut tables = self.write()?;
        if let Some(rows) = tables.get_mut(table) {
            rows.retain(|row| !(query.matches(row) && writable(table, row, caller)));
        }
        Ok(())
    }

    /// Evaluate one of the backend's remote procedures.
    pub fn rpc(&self, caller: &str, name: &str, params: &Value) -> Result<Vec<Value>, AppError> {
        let user_id = params
            .get("user_id_param")
            .and_then(Value::as_str)
            .ok_or_else(|| AppError::BadRequest("user_id_param is required".to_string()))?;
        let limit = params
            .get("limit_param")
            .and_then(Value::as_u64)
            .unwrap_or(10) as u32;

        // Procedures run with the caller's rights
        if user_id != caller {
            return Ok(Vec::new());
        }

        let tables = self.read()?;
        match name {
            rpc::FRIENDS_RECENT_CHECKINS => {
                let friends = Self::accepted_friend_ids(&tables, caller);
                let query = Query::new()
                    .eq("is_public", true)
                    .is_in("user_id", friends.into_iter().collect())
                    .order_desc("created_at")
                    .limit(limit);

                Ok(Self::rows_where(&tables, collections::CHECK_INS, caller, &query)
                    .into_iter()
                    .map(|row| {
                        let profile = Self::profile_of(&tables, text(&row, "user_id"));
                        join_profile(row, profile.as_ref(), "")
                    })
                    .collect())
            }
            rpc::FRIENDS_RECENT_ACTIVITIES => {
                let query = Query::new()
                    .eq("user_id", caller)
                    .order_desc("created_at")
                    .limit(limit);

                Ok(Self::rows_where(&tables, collections::ACTIVITIES, caller, &query)
                    .into_iter()
                    .map(|row| {
                        let profile = Self::profile_of(&tables, text(&row, "actor_id"));
                        join_profile(row, profile.as_ref(), "actor_")
                    })
                    .collect())
            }
            _ => Err(AppError::NotFound(format!("function {} not found", name))),
        }
    }

    fn accepted_friend_ids(tables: &HashMap<String, Vec<Value>>, user_id: &str) -> HashSet<String> {
        tables
            .get(collections::FRIENDS)
            .map(|rows| {
                rows.iter()
                    .filter(|r| text(r, "status").as_deref() == Some("accepted"))
                    .filter_map(|r| {
                        if is(r, "user_id", user_id) {
                            text(r, "friend_id")
                        } else if is(r, "friend_id", user_id) {
                            text(r, "user_id")
                        } else {
                            None
                        }
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn profile_of(tables: &HashMap<String, Vec<Value>>, id: Option<String>) -> Option<Value> {
        let id = id?;
        tables
            .get(collections::PROFILES)?
            .iter()
            .find(|p| text(p, "id").as_deref() == Some(id.as_str()))
            .cloned()
    }
}

fn apply_patch(object: &mut Map<String, Value>, patch: &Map<String, Value>) {
    for (key, value) in patch {
        if IMMUTABLE_COLUMNS.contains(&key.as_str()) {
            continue;
        }
        object.insert(key.clone(), value.clone());
    }
}

/// Left-join profile columns onto a row, prefixing their names.
fn join_profile(row: Value, profile: Option<&Value>, prefix: &str) -> Value {
    let Value::Object(mut object) = row else {
        return row;
    };

    for column in ["username", "full_name", "dog_name", "avatar_url"] {
        let value = profile
            .and_then(|p| p.get(column))
            .cloned()
            .unwrap_or(if column == "avatar_url" {
                Value::Null
            } else {
                Value::String(String::new())
            });
        object.insert(format!("{}{}", prefix, column), value);
    }

    Value::Object(object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> MemoryStore {
        MemoryStore::new(ChangeHub::new())
    }

    #[test]
    fn test_private_check_ins_hidden_from_others() {
        let store = store();
        store
            .insert(
                "alice",
                collections::CHECK_INS,
                json!({"user_id": "alice", "is_public": false, "location_name": "Home"}),
            )
            .unwrap();

        let own = store.select("alice", collections::CHECK_INS, &Query::new()).unwrap();
        let other = store.select("bob", collections::CHECK_INS, &Query::new()).unwrap();
        assert_eq!(own.len(), 1);
        assert!(other.is_empty());
    }

    #[test]
    fn test_insert_for_someone_else_rejected() {
        let store = store();
        let err = store
            .insert("bob", collections::CHECK_INS, json!({"user_id": "alice", "is_public": true}))
            .unwrap_err();
        assert!(matches!(err, AppError::Backend(_)));
    }

    #[test]
    fn test_update_keeps_immutable_columns() {
        let store = store();
        let rows = store
            .insert(
                "alice",
                collections::CHECK_INS,
                json!({"user_id": "alice", "is_public": true, "location_name": "Park"}),
            )
            .unwrap();
        let id = rows[0]["id"].as_str().unwrap().to_string();
        let created_at = rows[0]["created_at"].clone();

        let updated = store
            .update(
                "alice",
                collections::CHECK_INS,
                &Query::new().eq("id", &id),
                json!({"location_name": "Big Park", "user_id": "mallory", "created_at": "x"}),
            )
            .unwrap();

        assert_eq!(updated[0]["location_name"], "Big Park");
        assert_eq!(updated[0]["user_id"], "alice");
        assert_eq!(updated[0]["created_at"], created_at);

        // Not the owner: nothing matches
        let none = store
            .update(
                "bob",
                collections::CHECK_INS,
                &Query::new().eq("id", &id),
                json!({"location_name": "Mine"}),
            )
            .unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_offline_fails_every_call() {
        let store = store();
        store.set_offline(true);
        let err = store.select("alice", collections::PROFILES, &Query::new()).unwrap_err();
        assert!(err.is_retryable());

        store.set_offline(false);
        assert!(store.select("alice", collections::PROFILES, &Query::new()).is_ok());
    }
}
