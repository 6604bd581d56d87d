// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! REST client for the transaction server.
//!
//! [`TransactionApi`] is the seam the mutation client depends on; [`HttpApi`]
//! implements it over reqwest and also carries the read-only health and log
//! queries. Every request gets a fresh `X-Request-Id`, recorded on the
//! tracing span for the call, so client logs line up with server logs.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span, Instrument};
use txsync_core::{GroupedLogs, JobHandle, LogEntry, NewTransaction, Transaction, TransactionId};
use uuid::Uuid;

use crate::config::SyncConfig;
use crate::idempotency::{IdempotencyKey, IDEMPOTENCY_KEY_HEADER};

/// Header carrying the per-request correlation id.
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Error type for REST calls.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Non-success response. `message` is the server's detail when it sent
    /// one, `HTTP <code>` otherwise.
    #[error("{message}")]
    Status { status: u16, message: String },

    /// The request never produced a response.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// A success response whose body could not be decoded.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("invalid base url '{0}'")]
    InvalidUrl(String),
}

/// Result type for REST calls.
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// HTTP status, when the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether resending the same request could succeed.
    ///
    /// True for connection faults, timeouts, 429 and 5xx.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Status { status, .. } => *status == 429 || (500..600).contains(status),
            ApiError::Transport(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            ApiError::InvalidResponse(_) | ApiError::InvalidUrl(_) => false,
        }
    }

    /// Heuristic for upstream quota exhaustion.
    pub fn is_quota_exceeded(&self) -> bool {
        self.status() == Some(429) || self.to_string().to_lowercase().contains("quota")
    }
}

/// Extracts a human-readable message from an error response body.
///
/// FastAPI-style `{"detail": ...}` is unwrapped; structured details are
/// rendered as JSON. An empty body falls back to `HTTP <code>`.
pub fn error_message(status: u16, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        return format!("HTTP {}", status);
    }
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        let detail = ["detail", "message", "error"]
            .iter()
            .find_map(|field| value.get(field));
        match detail {
            Some(serde_json::Value::String(s)) => return s.clone(),
            Some(other) => return other.to_string(),
            None => {}
        }
    }
    body.to_string()
}

/// Response of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
}

/// Boxed future returned by [`TransactionApi`] methods.
pub type ApiFuture<'a, T> = Pin<Box<dyn Future<Output = ApiResult<T>> + Send + 'a>>;

/// Transaction endpoints used by the mutation client.
pub trait TransactionApi: Send + Sync {
    /// `GET /transactions?limit=N`, newest first.
    fn list_transactions(&self, limit: usize) -> ApiFuture<'_, Vec<Transaction>>;

    /// `POST /transactions/create` with the intent's idempotency key.
    fn create_transaction<'a>(
        &'a self,
        body: &'a NewTransaction,
        key: &'a IdempotencyKey,
    ) -> ApiFuture<'a, Transaction>;

    /// `POST /transactions/async-process?transaction_id=ID`.
    fn process_transaction<'a>(&'a self, id: &'a TransactionId) -> ApiFuture<'a, JobHandle>;
}

/// reqwest-backed REST client.
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: Client,
    base_url: Url,
}

impl HttpApi {
    /// Create a client for `base_url` with a per-request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> ApiResult<Self> {
        let base_url =
            Url::parse(base_url).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(base_url.to_string()));
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &SyncConfig) -> ApiResult<Self> {
        Self::new(&config.base_url, config.request_timeout())
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `GET /health`.
    pub async fn health(&self) -> ApiResult<Health> {
        let url = self.endpoint(&["health"])?;
        self.execute(self.client.get(url)).await
    }

    /// `GET /logs?limit=N`, newest first.
    pub async fn logs(&self, limit: usize) -> ApiResult<Vec<LogEntry>> {
        let url = self.endpoint(&["logs"])?;
        self.execute(self.client.get(url).query(&[("limit", limit)]))
            .await
    }

    /// `GET /logs/grouped?limit=N`, keyed by request id.
    pub async fn logs_grouped(&self, limit: usize) -> ApiResult<GroupedLogs> {
        let url = self.endpoint(&["logs", "grouped"])?;
        self.execute(self.client.get(url).query(&[("limit", limit)]))
            .await
    }

    /// `GET /logs/transaction/{id}`.
    pub async fn logs_for_transaction(&self, id: &TransactionId) -> ApiResult<Vec<LogEntry>> {
        let url = self.endpoint(&["logs", "transaction", id.as_str()])?;
        self.execute(self.client.get(url)).await
    }

    /// `GET /logs/request/{id}`.
    pub async fn logs_for_request(&self, request_id: &str) -> ApiResult<Vec<LogEntry>> {
        let url = self.endpoint(&["logs", "request", request_id])?;
        self.execute(self.client.get(url)).await
    }

    /// Base URL with `segments` appended as escaped path segments.
    fn endpoint(&self, segments: &[&str]) -> ApiResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResult<T> {
        let request_id = Uuid::new_v4().to_string();
        let request = request.header(REQUEST_ID_HEADER, &request_id).build()?;
        let span = debug_span!(
            "api",
            method = %request.method(),
            path = request.url().path(),
            request_id = %request_id,
        );

        async move {
            let response = self.client.execute(request).await?;
            let status = response.status();
            debug!(status = status.as_u16(), "response received");

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(ApiError::Status {
                    status: status.as_u16(),
                    message: error_message(status.as_u16(), &body),
                });
            }

            let bytes = response.bytes().await?;
            serde_json::from_slice(&bytes).map_err(|e| ApiError::InvalidResponse(e.to_string()))
        }
        .instrument(span)
        .await
    }
}

impl TransactionApi for HttpApi {
    fn list_transactions(&self, limit: usize) -> ApiFuture<'_, Vec<Transaction>> {
        Box::pin(async move {
            let url = self.endpoint(&["transactions"])?;
            self.execute(self.client.get(url).query(&[("limit", limit)]))
                .await
        })
    }

    fn create_transaction<'a>(
        &'a self,
        body: &'a NewTransaction,
        key: &'a IdempotencyKey,
    ) -> ApiFuture<'a, Transaction> {
        Box::pin(async move {
            let url = self.endpoint(&["transactions", "create"])?;
            let request = self
                .client
                .post(url)
                .header(IDEMPOTENCY_KEY_HEADER, key.as_str())
                .json(body);
            self.execute(request).await
        })
    }

    fn process_transaction<'a>(&'a self, id: &'a TransactionId) -> ApiFuture<'a, JobHandle> {
        Box::pin(async move {
            let url = self.endpoint(&["transactions", "async-process"])?;
            let request = self
                .client
                .post(url)
                .query(&[("transaction_id", id.as_str())]);
            self.execute(request).await
        })
    }
}

#[cfg(test)]
#[path = "api_tests.rs"]
pub(crate) mod tests;
