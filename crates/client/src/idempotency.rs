// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Create intents and the keys that make their submission idempotent.
//!
//! A [`CreateIntent`] pairs a create request with an [`IdempotencyKey`]
//! minted once, when the intent is built. Every submission of the same
//! intent, including retries, sends the same key, so the server returns the
//! same transaction instead of creating a second one.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use txsync_core::NewTransaction;
use uuid::Uuid;

use crate::sync::lock;

/// Header carrying the key on create requests.
pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// Opaque client-generated key for one logical create.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    /// Mint a fresh random key.
    pub fn generate() -> Self {
        IdempotencyKey(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for IdempotencyKey {
    fn from(s: &str) -> Self {
        IdempotencyKey(s.to_string())
    }
}

impl From<String> for IdempotencyKey {
    fn from(s: String) -> Self {
        IdempotencyKey(s)
    }
}

/// One logical "create this transaction" request.
///
/// Cloning keeps the key, so clones are the same intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateIntent {
    key: IdempotencyKey,
    body: NewTransaction,
}

impl CreateIntent {
    /// New intent with a freshly minted key.
    pub fn new(body: NewTransaction) -> Self {
        Self::with_key(body, IdempotencyKey::generate())
    }

    /// Intent with a caller-supplied key, e.g. one persisted across restarts.
    pub fn with_key(body: NewTransaction, key: IdempotencyKey) -> Self {
        CreateIntent { key, body }
    }

    pub fn key(&self) -> &IdempotencyKey {
        &self.key
    }

    pub fn body(&self) -> &NewTransaction {
        &self.body
    }
}

/// Keys of creates that have been submitted and not yet resolved.
#[derive(Debug, Clone, Default)]
pub struct InFlightCreates {
    keys: Arc<Mutex<HashSet<IdempotencyKey>>>,
}

impl InFlightCreates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `key` as in flight.
    ///
    /// Returns `None` if a submission with the same key is already pending.
    /// The key is released when the returned guard is dropped.
    pub fn acquire(&self, key: &IdempotencyKey) -> Option<InFlightGuard> {
        if !lock(&self.keys).insert(key.clone()) {
            return None;
        }
        Some(InFlightGuard {
            keys: Arc::clone(&self.keys),
            key: key.clone(),
        })
    }

    pub fn contains(&self, key: &IdempotencyKey) -> bool {
        lock(&self.keys).contains(key)
    }

    pub fn len(&self) -> usize {
        lock(&self.keys).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.keys).is_empty()
    }
}

/// Releases an in-flight key on drop.
#[derive(Debug)]
pub struct InFlightGuard {
    keys: Arc<Mutex<HashSet<IdempotencyKey>>>,
    key: IdempotencyKey,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        lock(&self.keys).remove(&self.key);
    }
}

#[cfg(test)]
#[path = "idempotency_tests.rs"]
mod tests;
