// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Core transaction types.
//!
//! This module contains the records the client mirrors from the remote store:
//! Transaction, its Kind and Status, the NewTransaction request body, and the
//! JobHandle returned when processing is enqueued.
//!
//! Deserialization also accepts the field and value names used by the
//! original server (`monto`, `tipo`, `pendiente`, ...). Serialization always
//! emits the canonical names.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Opaque, server-assigned transaction identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(String);

impl TransactionId {
    pub fn new(id: impl Into<String>) -> Self {
        TransactionId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TransactionId {
    fn from(s: &str) -> Self {
        TransactionId(s.to_string())
    }
}

impl From<String> for TransactionId {
    fn from(s: String) -> Self {
        TransactionId(s)
    }
}

/// Direction of money movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    /// Money coming in.
    #[serde(alias = "ingreso")]
    Inflow,
    /// Money going out.
    #[serde(alias = "egreso")]
    Outflow,
}

impl Kind {
    /// Returns the canonical wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Inflow => "inflow",
            Kind::Outflow => "outflow",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Kind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "inflow" | "ingreso" => Ok(Kind::Inflow),
            "outflow" | "egreso" => Ok(Kind::Outflow),
            _ => Err(Error::InvalidKind(s.to_string())),
        }
    }
}

/// Lifecycle status of a transaction.
///
/// Owned by the server. The client only ever observes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Created, not yet processed. Initial state for new transactions.
    #[serde(alias = "pendiente")]
    Pending,
    /// Processed successfully.
    #[serde(alias = "procesado", alias = "posted")]
    Processed,
    /// Processing failed.
    #[serde(alias = "fallido")]
    Failed,
    /// Cancelled before processing.
    #[serde(alias = "cancelado", alias = "canceled")]
    Cancelled,
}

impl Status {
    /// Returns the canonical wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Processed => "processed",
            Status::Failed => "failed",
            Status::Cancelled => "cancelled",
        }
    }

    /// Check if a transition from this status to target is legal.
    ///
    /// Only `pending` has outgoing transitions.
    pub fn can_transition_to(&self, target: Status) -> bool {
        matches!(self, Status::Pending) && target != Status::Pending
    }

    /// Get valid transition targets as a formatted string.
    pub fn valid_targets(&self) -> &'static str {
        match self {
            Status::Pending => "processed, failed, cancelled",
            Status::Processed | Status::Failed | Status::Cancelled => "none (terminal)",
        }
    }

    /// Returns true if no further transitions are expected.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Status::Pending)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Status {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "pending" | "pendiente" => Ok(Status::Pending),
            "processed" | "procesado" | "posted" => Ok(Status::Processed),
            "failed" | "fallido" => Ok(Status::Failed),
            "cancelled" | "canceled" | "cancelado" => Ok(Status::Cancelled),
            _ => Err(Error::InvalidStatus(s.to_string())),
        }
    }
}

/// Parses a positive decimal amount.
pub fn parse_amount(s: &str) -> Result<Decimal> {
    let amount =
        Decimal::from_str(s.trim()).map_err(|_| Error::InvalidAmount(s.to_string()))?;
    if amount <= Decimal::ZERO {
        return Err(Error::InvalidAmount(s.to_string()));
    }
    Ok(amount)
}

/// A financial transaction as held by the remote store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Server-assigned identifier.
    pub id: TransactionId,
    /// Owner of the transaction.
    pub user_id: String,
    /// Exact amount, carried as a string on the wire.
    #[serde(alias = "monto", with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    /// Inflow or outflow.
    #[serde(alias = "tipo")]
    pub kind: Kind,
    /// Current lifecycle status.
    pub status: Status,
    /// When the transaction was created.
    pub created_at: DateTime<Utc>,
    /// When the transaction was last modified.
    pub updated_at: DateTime<Utc>,
}

/// Body of a create request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub user_id: String,
    #[serde(alias = "monto", with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    #[serde(alias = "tipo")]
    pub kind: Kind,
}

impl NewTransaction {
    /// Creates a validated create request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAmount`] if the amount is not positive and
    /// [`Error::InvalidInput`] if the user id is blank.
    pub fn new(user_id: impl Into<String>, amount: Decimal, kind: Kind) -> Result<Self> {
        let user_id = user_id.into();
        if user_id.trim().is_empty() {
            return Err(Error::InvalidInput("user_id must not be blank".to_string()));
        }
        if amount <= Decimal::ZERO {
            return Err(Error::InvalidAmount(amount.to_string()));
        }
        Ok(NewTransaction {
            user_id,
            amount,
            kind,
        })
    }
}

/// Handle returned when a transaction is enqueued for processing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobHandle {
    pub job_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<TransactionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[cfg(test)]
#[path = "transaction_tests.rs"]
mod tests;
