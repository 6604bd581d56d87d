// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Client-initiated changes to remote transactions.
//!
//! The mutation client is the only writer of the store besides the push
//! channel: a successful create is prepended, and a refresh replaces the
//! whole baseline. Processing never touches local status; the resulting
//! `status_changed` push event does. Results that arrive after the owning
//! session is disposed are discarded.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use txsync_core::{JobHandle, Transaction, TransactionId};

use crate::api::{ApiError, TransactionApi};
use crate::config::RetryPolicy;
use crate::idempotency::{CreateIntent, IdempotencyKey, InFlightCreates, InFlightGuard};
use crate::sync::{lock, SharedStore};

/// Error type for mutations.
#[derive(Debug, thiserror::Error)]
pub enum MutationError {
    /// The server or network rejected the request.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The same intent is already being submitted.
    #[error("create with idempotency key {0} is already in flight")]
    CreateInFlight(IdempotencyKey),

    /// The session was disposed; the result was not applied.
    #[error("session disposed")]
    Disposed,
}

/// Result type for mutations.
pub type MutationResult<T> = Result<T, MutationError>;

/// Submits creates and process requests and reflects them in the store.
pub struct MutationClient<A: TransactionApi> {
    api: Arc<A>,
    store: SharedStore,
    cancel_token: CancellationToken,
    in_flight: InFlightCreates,
}

impl<A: TransactionApi> Clone for MutationClient<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            store: Arc::clone(&self.store),
            cancel_token: self.cancel_token.clone(),
            in_flight: self.in_flight.clone(),
        }
    }
}

impl<A: TransactionApi> MutationClient<A> {
    pub fn new(api: Arc<A>, store: SharedStore, cancel_token: CancellationToken) -> Self {
        Self {
            api,
            store,
            cancel_token,
            in_flight: InFlightCreates::new(),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Whether a create for this intent is currently unresolved.
    pub fn is_in_flight(&self, intent: &CreateIntent) -> bool {
        self.in_flight.contains(intent.key())
    }

    /// Submit a create once.
    ///
    /// On success the returned transaction is prepended to the store.
    ///
    /// # Errors
    ///
    /// - [`MutationError::CreateInFlight`] if this intent is already pending
    /// - [`MutationError::Api`] with the server's message on failure
    /// - [`MutationError::Disposed`] if the session ended meanwhile
    pub async fn create_transaction(&self, intent: &CreateIntent) -> MutationResult<Transaction> {
        let _guard = self.begin_create(intent)?;
        let tx = self
            .api
            .create_transaction(intent.body(), intent.key())
            .await?;
        self.commit_created(tx)
    }

    /// Submit a create, retrying transient failures with the same key.
    ///
    /// Retries happen at `policy.delay()` for at most `policy.max_attempts`
    /// attempts in total. Non-retryable errors are returned immediately.
    pub async fn create_with_retry(
        &self,
        intent: &CreateIntent,
        policy: &RetryPolicy,
    ) -> MutationResult<Transaction> {
        let _guard = self.begin_create(intent)?;
        let max_attempts = policy.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self
                .api
                .create_transaction(intent.body(), intent.key())
                .await
            {
                Ok(tx) => return self.commit_created(tx),
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    warn!(
                        key = %intent.key(),
                        attempt,
                        max_attempts,
                        error = %e,
                        "create failed, retrying with the same key"
                    );
                    tokio::select! {
                        _ = self.cancel_token.cancelled() => return Err(MutationError::Disposed),
                        _ = tokio::time::sleep(policy.delay()) => {}
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Enqueue a transaction for server-side processing.
    ///
    /// The local status is left alone; the push channel reports the outcome.
    pub async fn process_transaction(&self, id: &TransactionId) -> MutationResult<JobHandle> {
        if self.cancel_token.is_cancelled() {
            return Err(MutationError::Disposed);
        }
        let local_status = lock(&self.store).get(id).map(|t| t.status);
        if let Some(status) = local_status {
            if status.is_terminal() {
                // The server decides; it may reject or ignore this.
                debug!(%id, status = status.as_str(), "processing a transaction that is already final");
            }
        }

        let job = self.api.process_transaction(id).await?;
        info!(%id, job_id = %job.job_id, "transaction enqueued for processing");
        Ok(job)
    }

    /// Full fetch replacing the store baseline. Returns the record count.
    pub async fn refresh(&self, limit: usize) -> MutationResult<usize> {
        let transactions = self.api.list_transactions(limit).await?;
        if self.cancel_token.is_cancelled() {
            debug!("session disposed, fetched list discarded");
            return Err(MutationError::Disposed);
        }
        let count = transactions.len();
        lock(&self.store).replace_all(transactions);
        Ok(count)
    }

    fn begin_create(&self, intent: &CreateIntent) -> MutationResult<InFlightGuard> {
        if self.cancel_token.is_cancelled() {
            return Err(MutationError::Disposed);
        }
        self.in_flight
            .acquire(intent.key())
            .ok_or_else(|| MutationError::CreateInFlight(intent.key().clone()))
    }

    fn commit_created(&self, tx: Transaction) -> MutationResult<Transaction> {
        if self.cancel_token.is_cancelled() {
            debug!(id = %tx.id, "session disposed, created transaction not applied");
            return Err(MutationError::Disposed);
        }
        info!(id = %tx.id, amount = %tx.amount, kind = tx.kind.as_str(), "transaction created");
        lock(&self.store).insert_created(tx.clone());
        Ok(tx)
    }
}

#[cfg(test)]
#[path = "mutation_tests.rs"]
mod tests;
