// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! txsync-core: Shared types for the transaction sync client
//!
//! This crate provides the transaction records, the push-channel protocol,
//! and the error type used by the txsync client.

pub mod error;
pub mod log_entry;
pub mod protocol;
pub mod transaction;

pub use error::{Error, Result};
pub use log_entry::{GroupedLogs, LogEntry};
pub use protocol::{decode_frame, DomainEvent, InboundFrame, StatusChange};
pub use transaction::{
    parse_amount, JobHandle, Kind, NewTransaction, Status, Transaction, TransactionId,
};
