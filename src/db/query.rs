// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Filter/order/limit parameters for collection queries.
//!
//! A [`Query`] renders to the backend's URL parameter syntax and can also
//! be evaluated against JSON rows by the in-memory store.

use serde_json::Value;
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(&'static str, String),
    Gte(&'static str, f64),
    Lte(&'static str, f64),
    In(&'static str, Vec<String>),
    /// Any of the inner equality filters holds
    AnyOf(Vec<Filter>),
}

/// Textual form of a JSON scalar, as compared by equality filters.
pub(crate) fn field_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Null => Some("null".to_string()),
        _ => None,
    }
}

impl Filter {
    /// Render as a `column=op.value` pair (or an `or=(...)` group).
    fn to_param(&self) -> (String, String) {
        match self {
            Filter::Eq(column, value) => (column.to_string(), format!("eq.{}", value)),
            Filter::Gte(column, value) => (column.to_string(), format!("gte.{}", value)),
            Filter::Lte(column, value) => (column.to_string(), format!("lte.{}", value)),
            Filter::In(column, values) => {
                let quoted: Vec<String> = values.iter().map(|v| format!("\"{}\"", v)).collect();
                (column.to_string(), format!("in.({})", quoted.join(",")))
            }
            Filter::AnyOf(filters) => {
                let parts: Vec<String> = filters
                    .iter()
                    .map(|f| {
                        let (column, expr) = f.to_param();
                        format!("{}.{}", column, expr)
                    })
                    .collect();
                ("or".to_string(), format!("({})", parts.join(",")))
            }
        }
    }

    /// Evaluate against a row. Missing columns never match.
    pub fn matches(&self, row: &Value) -> bool {
        match self {
            Filter::Eq(column, value) => row
                .get(*column)
                .and_then(field_text)
                .is_some_and(|text| text == *value),
            Filter::Gte(column, bound) => row
                .get(*column)
                .and_then(Value::as_f64)
                .is_some_and(|v| v >= *bound),
            Filter::Lte(column, bound) => row
                .get(*column)
                .and_then(Value::as_f64)
                .is_some_and(|v| v <= *bound),
            Filter::In(column, values) => row
                .get(*column)
                .and_then(field_text)
                .is_some_and(|text| values.contains(&text)),
            Filter::AnyOf(filters) => filters.iter().any(|f| f.matches(row)),
        }
    }
}

/// Ordering on a single column.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub column: &'static str,
    pub descending: bool,
}

/// Filter/order/limit for one collection read (or the row set of a write).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub limit: Option<u32>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: &'static str, value: impl ToString) -> Self {
        self.filters.push(Filter::Eq(column, value.to_string()));
        self
    }

    pub fn gte(mut self, column: &'static str, value: f64) -> Self {
        self.filters.push(Filter::Gte(column, value));
        self
    }

    pub fn lte(mut self, column: &'static str, value: f64) -> Self {
        self.filters.push(Filter::Lte(column, value));
        self
    }

    pub fn is_in(mut self, column: &'static str, values: Vec<String>) -> Self {
        self.filters.push(Filter::In(column, values));
        self
    }

    pub fn any_of(mut self, filters: Vec<Filter>) -> Self {
        self.filters.push(Filter::AnyOf(filters));
        self
    }

    pub fn order_desc(mut self, column: &'static str) -> Self {
        self.order = Some(Order {
            column,
            descending: true,
        });
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// URL query parameters in the backend's syntax.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params: Vec<(String, String)> =
            self.filters.iter().map(Filter::to_param).collect();

        if let Some(order) = &self.order {
            let direction = if order.descending { "desc" } else { "asc" };
            params.push((
                "order".to_string(),
                format!("{}.{}", order.column, direction),
            ));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        params
    }

    pub fn matches(&self, row: &Value) -> bool {
        self.filters.iter().all(|f| f.matches(row))
    }

    /// Apply ordering and limit to rows that already passed the filters.
    ///
    /// The sort is stable, so callers pass rows newest-inserted first to
    /// break timestamp ties by recency.
    pub fn order_and_limit(&self, mut rows: Vec<Value>) -> Vec<Value> {
        if let Some(order) = &self.order {
            rows.sort_by(|a, b| {
                let ordering = compare_fields(a.get(order.column), b.get(order.column));
                if order.descending {
                    ordering.reverse()
                } else {
                    ordering
                }
            });
        }
        if let Some(limit) = self.limit {
            rows.truncate(limit as usize);
        }
        rows
    }
}

fn compare_fields(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.total_cmp(&y)
        }
        (Some(x), Some(y)) => field_text(x).cmp(&field_text(y)),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}
