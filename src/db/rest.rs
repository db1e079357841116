// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP client for the hosted backend's query interface.
//!
//! Handles:
//! - Collection reads with filter/order/limit parameters
//! - Inserts and updates returning the written rows
//! - Deletes
//! - Remote procedure calls
//!
//! Every request carries the project anon key and the caller's access
//! token, so the backend applies its row-level security to the caller.

use crate::db::query::Query;
use crate::error::AppError;
use crate::middleware::auth::AuthUser;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Backend query client.
#[derive(Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl RestClient {
    /// Create a client for the project at `project_url`.
    pub fn new(project_url: &str, anon_key: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: format!("{}/rest/v1", project_url.trim_end_matches('/')),
            anon_key: anon_key.to_string(),
        }
    }

    fn request(
        &self,
        method: reqwest::Method,
        path: &str,
        caller: &AuthUser,
    ) -> reqwest::RequestBuilder {
        self.http
            .request(method, format!("{}/{}", self.base_url, path))
            .header("apikey", &self.anon_key)
            .bearer_auth(&caller.access_token)
    }

    /// Read rows from a collection.
    pub async fn select<T: DeserializeOwned>(
        &self,
        caller: &AuthUser,
        table: &str,
        query: &Query,
    ) -> Result<Vec<T>, AppError> {
        let mut params = query.to_params();
        params.push(("select".to_string(), "*".to_string()));

        let response = self
            .request(reqwest::Method::GET, table, caller)
            .query(&params)
            .send()
            .await
            .map_err(|e| AppError::Backend(e.to_string()))?;

        self.check_response_json(response).await
    }

    /// Insert rows and return them as stored.
    pub async fn insert<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        caller: &AuthUser,
        table: &str,
        rows: &B,
    ) -> Result<Vec<T>, AppError> {
        let response = self
            .request(reqwest::Method::POST, table, caller)
            .header("Prefer", "return=representation")
            .json(rows)
            .send()
            .await
            .map_err(|e| AppError::Backend(e.to_string()))?;

        self.check_response_json(response).await
    }

    /// Patch the rows matching `query` and return them as stored.
    pub async fn update<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        caller: &AuthUser,
        table: &str,
        query: &Query,
        patch: &B,
    ) -> Result<Vec<T>, AppError> {
        let response = self
            .request(reqwest::Method::PATCH, table, caller)
            .header("Prefer", "return=representation")
            .query(&query.to_params())
            .json(patch)
            .send()
            .await
            .map_err(|e| AppError::Backend(e.to_string()))?;

        self.check_response_json(response).await
    }

    /// Delete the rows matching `query`.
    pub async fn delete(
        &self,
        caller: &AuthUser,
        table: &str,
        query: &Query,
    ) -> Result<(), AppError> {
        let response = self
            .request(reqwest::Method::DELETE, table, caller)
            .query(&query.to_params())
            .send()
            .await
            .map_err(|e| AppError::Backend(e.to_string()))?;

        self.check_response(response).await
    }

    /// Call a remote procedure that returns a set of rows.
    pub async fn rpc<P: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        caller: &AuthUser,
        name: &str,
        params: &P,
    ) -> Result<Vec<T>, AppError> {
        let response = self
            .request(reqwest::Method::POST, &format!("rpc/{}", name), caller)
            .json(params)
            .send()
            .await
            .map_err(|e| AppError::Backend(e.to_string()))?;

        self.check_response_json(response).await
    }

    /// Map a failed response to an error.
    async fn error_for(response: reqwest::Response) -> AppError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        // Expired or missing session - the view sends the user to sign in
        if status.as_u16() == 401 {
            return AppError::Unauthorized;
        }

        tracing::warn!(status = %status, body = %body, "Backend request failed");
        AppError::Backend(format!("HTTP {}: {}", status, body))
    }

    /// Check response status and return error if not successful.
    async fn check_response(&self, response: reqwest::Response) -> Result<(), AppError> {
        if response.status().is_success() {
            return Ok(());
        }
        Err(Self::error_for(response).await)
    }

    /// Check response and parse JSON body.
    async fn check_response_json<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, AppError> {
        if !response.status().is_success() {
            return Err(Self::error_for(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Backend(format!("JSON parse error: {}", e)))
    }
}
