// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Push-channel protocol between the transaction server and its clients.
//!
//! The protocol is simple:
//! - Client sends the literal `ping` at a fixed interval to keep the socket warm
//! - Server may answer with the literal `pong`, send `{"type": "keepalive"}`
//!   when idle, and pushes JSON domain events as transactions move
//!
//! [`decode_frame`] turns one inbound text frame into an [`InboundFrame`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::transaction::{Status, TransactionId};

/// Liveness frame sent by the client.
pub const LIVENESS_PING: &str = "ping";

/// Liveness acknowledgement the server may send back. Not JSON.
pub const LIVENESS_ACK: &str = "pong";

const KEEPALIVE_TAG: &str = "keepalive";

/// A status transition pushed by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub transaction_id: TransactionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_status: Option<Status>,
    pub new_status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Server-originated domain events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DomainEvent {
    /// A transaction was created on the server.
    Created {
        transaction_id: Option<TransactionId>,
        status: Option<Status>,
        timestamp: Option<DateTime<Utc>>,
    },

    /// A transaction was enqueued for asynchronous processing.
    Enqueued {
        transaction_id: Option<TransactionId>,
        job_id: Option<String>,
        timestamp: Option<DateTime<Utc>>,
    },

    /// A worker picked the transaction up.
    ProcessingStarted {
        transaction_id: Option<TransactionId>,
        previous_status: Option<Status>,
        timestamp: Option<DateTime<Utc>>,
    },

    /// The transaction moved to a new status.
    StatusChanged(StatusChange),
}

impl DomainEvent {
    /// Returns the canonical event tag.
    pub fn tag(&self) -> &'static str {
        match self {
            DomainEvent::Created { .. } => "created",
            DomainEvent::Enqueued { .. } => "enqueued",
            DomainEvent::ProcessingStarted { .. } => "processing_started",
            DomainEvent::StatusChanged(_) => "status_changed",
        }
    }

    /// Returns the transaction this event refers to, if any.
    pub fn transaction_id(&self) -> Option<&TransactionId> {
        match self {
            DomainEvent::Created { transaction_id, .. }
            | DomainEvent::Enqueued { transaction_id, .. }
            | DomainEvent::ProcessingStarted { transaction_id, .. } => transaction_id.as_ref(),
            DomainEvent::StatusChanged(change) => Some(&change.transaction_id),
        }
    }

    /// Returns the server-side timestamp of the event, if present.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            DomainEvent::Created { timestamp, .. }
            | DomainEvent::Enqueued { timestamp, .. }
            | DomainEvent::ProcessingStarted { timestamp, .. } => *timestamp,
            DomainEvent::StatusChanged(change) => change.timestamp,
        }
    }

    /// Serializes the event to JSON.
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Classification of one inbound text frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    /// The literal liveness acknowledgement.
    Ack,
    /// A JSON frame tagged as keepalive.
    Keepalive,
    /// A domain event for subscribers.
    Event(DomainEvent),
}

/// Raw shape of a JSON frame. Every field is optional on the wire.
#[derive(Debug, Deserialize)]
struct WireFrame {
    #[serde(default)]
    event: Option<String>,
    #[serde(default, rename = "type")]
    frame_type: Option<String>,
    #[serde(default)]
    transaction_id: Option<TransactionId>,
    #[serde(default, alias = "old_status")]
    previous_status: Option<String>,
    #[serde(default)]
    new_status: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    job_id: Option<String>,
    #[serde(default)]
    timestamp: Option<String>,
}

/// Decodes one inbound text frame.
///
/// # Errors
///
/// - [`Error::Json`] if the frame is neither the acknowledgement nor JSON
/// - [`Error::InvalidInput`] if the JSON is not an event object
/// - [`Error::UnrecognizedEvent`] for unknown event tags
/// - [`Error::MissingField`] / [`Error::InvalidStatus`] for incomplete events
pub fn decode_frame(text: &str) -> Result<InboundFrame> {
    if text.trim() == LIVENESS_ACK {
        return Ok(InboundFrame::Ack);
    }

    let value: serde_json::Value = serde_json::from_str(text)?;
    let wire = WireFrame::deserialize(&value)
        .map_err(|e| Error::InvalidInput(format!("not an event frame: {}", e)))?;

    if wire.frame_type.as_deref() == Some(KEEPALIVE_TAG) {
        return Ok(InboundFrame::Keepalive);
    }

    let raw_tag = wire
        .event
        .as_deref()
        .ok_or_else(|| Error::InvalidInput("frame has no event tag".to_string()))?;

    match normalize_tag(raw_tag) {
        KEEPALIVE_TAG => Ok(InboundFrame::Keepalive),
        "created" => Ok(InboundFrame::Event(DomainEvent::Created {
            transaction_id: wire.transaction_id,
            status: parse_status(wire.status.as_deref())?,
            timestamp: parse_timestamp(wire.timestamp.as_deref()),
        })),
        "enqueued" => Ok(InboundFrame::Event(DomainEvent::Enqueued {
            transaction_id: wire.transaction_id,
            job_id: wire.job_id,
            timestamp: parse_timestamp(wire.timestamp.as_deref()),
        })),
        "processing_started" => Ok(InboundFrame::Event(DomainEvent::ProcessingStarted {
            transaction_id: wire.transaction_id,
            previous_status: parse_previous_status(wire.previous_status.as_deref()),
            timestamp: parse_timestamp(wire.timestamp.as_deref()),
        })),
        "status_changed" => {
            let transaction_id = wire.transaction_id.ok_or(Error::MissingField {
                event: "status_changed",
                field: "transaction_id",
            })?;
            let new_status =
                parse_status(wire.new_status.as_deref())?.ok_or(Error::MissingField {
                    event: "status_changed",
                    field: "new_status",
                })?;
            Ok(InboundFrame::Event(DomainEvent::StatusChanged(StatusChange {
                transaction_id,
                previous_status: parse_previous_status(wire.previous_status.as_deref()),
                new_status,
                timestamp: parse_timestamp(wire.timestamp.as_deref()),
            })))
        }
        _ => Err(Error::UnrecognizedEvent(raw_tag.to_string())),
    }
}

/// Strips a namespace prefix such as `transaction.` or `worker.`.
fn normalize_tag(tag: &str) -> &str {
    tag.rsplit('.').next().unwrap_or(tag)
}

fn parse_status(raw: Option<&str>) -> Result<Option<Status>> {
    raw.map(str::parse::<Status>).transpose()
}

// Prior statuses are informational; values such as "unknown" degrade to None.
fn parse_previous_status(raw: Option<&str>) -> Option<Status> {
    raw.and_then(|s| s.parse::<Status>().ok())
}

// Unparseable timestamps degrade to None; the event itself is still valid.
fn parse_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
