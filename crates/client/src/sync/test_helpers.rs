// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for sync module tests.

#![allow(clippy::unwrap_used)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use txsync_core::{Kind, Status, StatusChange, Transaction, TransactionId};

/// Fixed base time so tests can reason about ordering.
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

pub fn at(offset_secs: i64) -> DateTime<Utc> {
    base_time() + Duration::seconds(offset_secs)
}

pub fn make_tx(id: &str, status: Status) -> Transaction {
    Transaction {
        id: TransactionId::new(id),
        user_id: "user-1".to_string(),
        amount: Decimal::new(1050, 2),
        kind: Kind::Inflow,
        status,
        created_at: base_time(),
        updated_at: base_time(),
    }
}

pub fn status_change(
    id: &str,
    new_status: Status,
    timestamp: Option<DateTime<Utc>>,
) -> StatusChange {
    StatusChange {
        transaction_id: TransactionId::new(id),
        previous_status: None,
        new_status,
        timestamp,
    }
}

pub fn status_changed_frame(id: &str, from: &str, to: &str) -> String {
    format!(
        r#"{{"event":"status_changed","transaction_id":"{}","old_status":"{}","new_status":"{}"}}"#,
        id, from, to
    )
}
