// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Local view of the remote transaction list.
//!
//! The store is seeded by a full fetch, grows through optimistic inserts
//! after a successful create, and is reconciled by `status_changed` events
//! from the push channel. Only the status and `updated_at` of an existing
//! record are ever changed by an event.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use txsync_core::{DomainEvent, StatusChange, Transaction, TransactionId};

use super::lock;
use super::router::{Subscriber, SubscriberResult};

/// How to treat updates that are not newer than the record they target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcilePolicy {
    /// The last event applied wins, regardless of timestamps.
    #[default]
    LastApplied,
    /// Skip events not strictly newer than the record's `updated_at`, and
    /// keep newer local records across a full fetch.
    NewerOnly,
}

/// Result of applying one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The record was updated.
    Applied,
    /// No record with that id; the event was dropped.
    UnknownTransaction,
    /// Not newer than the record under [`ReconcilePolicy::NewerOnly`].
    Stale,
    /// The event kind does not touch the store.
    Ignored,
}

/// Ordered list of transactions, newest first as delivered by the server.
#[derive(Debug, Default)]
pub struct StateStore {
    transactions: Vec<Transaction>,
    policy: ReconcilePolicy,
}

/// Store shared between the session, the router subscriber, and mutations.
pub type SharedStore = Arc<Mutex<StateStore>>;

impl StateStore {
    pub fn new(policy: ReconcilePolicy) -> Self {
        StateStore {
            transactions: Vec::new(),
            policy,
        }
    }

    pub fn policy(&self) -> ReconcilePolicy {
        self.policy
    }

    /// Replace the whole baseline with the result of a full fetch.
    ///
    /// The fetched page decides membership and order. Under
    /// [`ReconcilePolicy::NewerOnly`] a local record whose `updated_at` is
    /// newer than its fetched copy is kept, so a page read before a pushed
    /// status change cannot roll that change back.
    pub fn replace_all(&mut self, transactions: Vec<Transaction>) {
        let count = transactions.len();
        let mut kept = 0;
        let mut fetched = transactions;
        if self.policy == ReconcilePolicy::NewerOnly {
            for tx in &mut fetched {
                if let Some(local) = self.get(&tx.id) {
                    if local.updated_at > tx.updated_at {
                        *tx = local.clone();
                        kept += 1;
                    }
                }
            }
        }
        debug!(count, kept, "store baseline replaced");
        self.transactions = fetched;
    }

    /// Insert a transaction returned by a successful create.
    ///
    /// New records go to the front. If the id is already present (a retried
    /// create deduplicated by the server) the record is replaced in place.
    /// Returns `true` when the record was new.
    pub fn insert_created(&mut self, transaction: Transaction) -> bool {
        match self.position(&transaction.id) {
            Some(index) => {
                debug!(id = %transaction.id, "created transaction already present, replacing");
                self.transactions[index] = transaction;
                false
            }
            None => {
                debug!(id = %transaction.id, "created transaction inserted");
                self.transactions.insert(0, transaction);
                true
            }
        }
    }

    /// Apply a push event to the store.
    pub fn apply(&mut self, event: &DomainEvent) -> ApplyOutcome {
        match event {
            DomainEvent::StatusChanged(change) => self.apply_status_change(change),
            _ => ApplyOutcome::Ignored,
        }
    }

    /// Reconcile one status change against the matching record.
    pub fn apply_status_change(&mut self, change: &StatusChange) -> ApplyOutcome {
        let policy = self.policy;
        let Some(record) = self
            .transactions
            .iter_mut()
            .find(|t| t.id == change.transaction_id)
        else {
            debug!(id = %change.transaction_id, "status change for unknown transaction dropped");
            return ApplyOutcome::UnknownTransaction;
        };

        if policy == ReconcilePolicy::NewerOnly {
            if let Some(ts) = change.timestamp {
                if ts <= record.updated_at {
                    debug!(
                        id = %record.id,
                        event_ts = %ts,
                        updated_at = %record.updated_at,
                        "stale status change skipped"
                    );
                    return ApplyOutcome::Stale;
                }
            }
        }

        if record.status != change.new_status && !record.status.can_transition_to(change.new_status) {
            // The server is the authority; apply it but make the anomaly visible.
            warn!(
                id = %record.id,
                from = record.status.as_str(),
                to = change.new_status.as_str(),
                "server reported an unexpected status transition"
            );
        }

        record.status = change.new_status;
        if let Some(ts) = change.timestamp {
            record.updated_at = ts;
        }
        ApplyOutcome::Applied
    }

    pub fn get(&self, id: &TransactionId) -> Option<&Transaction> {
        self.transactions.iter().find(|t| &t.id == id)
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    fn position(&self, id: &TransactionId) -> Option<usize> {
        self.transactions.iter().position(|t| &t.id == id)
    }
}

/// Router subscriber that reconciles the shared store.
///
/// Once the owning session is disposed, events are no longer applied.
pub struct StoreSubscriber {
    store: SharedStore,
    cancel_token: CancellationToken,
}

impl StoreSubscriber {
    pub fn new(store: SharedStore, cancel_token: CancellationToken) -> Self {
        StoreSubscriber {
            store,
            cancel_token,
        }
    }
}

impl Subscriber for StoreSubscriber {
    fn name(&self) -> &str {
        "store"
    }

    fn on_event(&mut self, event: &DomainEvent) -> SubscriberResult {
        if self.cancel_token.is_cancelled() {
            debug!(event = event.tag(), "session disposed, event not applied");
            return Ok(());
        }
        lock(&self.store).apply(event);
        Ok(())
    }
}
