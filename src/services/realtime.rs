// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process fan-out of backend row changes.
//!
//! Change events reach the service from the backend (database webhooks,
//! or the in-memory store directly) and are published on a broadcast
//! channel. Each live view holds a [`Subscription`] scoped to one
//! collection, one event kind and an optional row filter. Dropping the
//! subscription releases it.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Events buffered per subscriber before it starts lagging.
const CHANNEL_CAPACITY: usize = 256;

/// Row change type, as named by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// A single row change.
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    pub table: String,
    pub kind: ChangeKind,
    /// The new row, or the old row for deletes
    pub record: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FilterOp {
    Eq,
    Neq,
}

/// Row filter in the backend's `column=op.value` syntax.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowFilter {
    column: String,
    op: FilterOp,
    value: String,
}

impl RowFilter {
    pub fn eq(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            op: FilterOp::Eq,
            value: value.into(),
        }
    }

    /// Parse `is_public=eq.true` / `user_id=neq.abc`.
    pub fn parse(raw: &str) -> Result<Self, FilterParseError> {
        let (column, rest) = raw
            .split_once('=')
            .ok_or_else(|| FilterParseError(raw.to_string()))?;
        let (op, value) = rest
            .split_once('.')
            .ok_or_else(|| FilterParseError(raw.to_string()))?;

        let op = match op {
            "eq" => FilterOp::Eq,
            "neq" => FilterOp::Neq,
            _ => return Err(FilterParseError(raw.to_string())),
        };

        if column.is_empty() {
            return Err(FilterParseError(raw.to_string()));
        }

        Ok(Self {
            column: column.to_string(),
            op,
            value: value.to_string(),
        })
    }

    /// Whether a row satisfies this filter. Missing columns never match.
    pub fn matches(&self, record: &serde_json::Value) -> bool {
        let Some(field) = record.get(&self.column) else {
            return false;
        };

        let equal = match field {
            serde_json::Value::String(s) => *s == self.value,
            serde_json::Value::Null => self.value == "null",
            other => other.to_string() == self.value,
        };

        match self.op {
            FilterOp::Eq => equal,
            FilterOp::Neq => !equal,
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Invalid row filter: {0}")]
pub struct FilterParseError(String);

/// Broadcast hub for backend change events.
#[derive(Clone)]
pub struct ChangeHub {
    sender: broadcast::Sender<Arc<ChangeEvent>>,
    active: Arc<AtomicUsize>,
}

impl Default for ChangeHub {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeHub {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            sender,
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Publish a change to every live subscription.
    ///
    /// Returns the number of subscriptions that received it.
    pub fn publish(&self, event: ChangeEvent) -> usize {
        tracing::debug!(table = %event.table, kind = ?event.kind, "Publishing change event");
        // No receivers is not an error: nobody is watching right now.
        self.sender.send(Arc::new(event)).unwrap_or(0)
    }

    /// Subscribe to one kind of change on one collection.
    pub fn subscribe(
        &self,
        table: &str,
        kind: ChangeKind,
        filter: Option<RowFilter>,
    ) -> Subscription {
        let count = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(table, ?kind, active = count, "Subscription opened");

        Subscription {
            receiver: self.sender.subscribe(),
            table: table.to_string(),
            kind,
            filter,
            active: self.active.clone(),
        }
    }

    /// Number of subscriptions that have not been dropped yet.
    pub fn active_subscriptions(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

/// A live, filtered view of the change stream.
pub struct Subscription {
    receiver: broadcast::Receiver<Arc<ChangeEvent>>,
    table: String,
    kind: ChangeKind,
    filter: Option<RowFilter>,
    active: Arc<AtomicUsize>,
}

impl Subscription {
    fn wants(&self, event: &ChangeEvent) -> bool {
        event.table == self.table
            && event.kind == self.kind
            && self
                .filter
                .as_ref()
                .is_none_or(|f| f.matches(&event.record))
    }

    /// Wait for the next matching event.
    ///
    /// Returns `None` once the hub is gone. Lagging drops the missed events
    /// and keeps going.
    pub async fn next(&mut self) -> Option<Arc<ChangeEvent>> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.wants(&event) => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!(table = %self.table, missed, "Subscription lagged, events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let remaining = self.active.fetch_sub(1, Ordering::SeqCst) - 1;
        tracing::debug!(table = %self.table, active = remaining, "Subscription released");
    }
}
