// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Read-only observability records served by the `/logs` endpoints.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One entry of the server's event log.
///
/// Fields beyond the common envelope vary per event and are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: String,
    #[serde(default)]
    pub level: String,
    #[serde(default)]
    pub service: String,
    pub event: String,
    #[serde(default)]
    pub request_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Log entries grouped by request id, each group in chronological order.
///
/// Groups keep the order the server sent them in, most recent request first.
pub type GroupedLogs = IndexMap<String, Vec<LogEntry>>;

#[cfg(test)]
#[path = "log_entry_tests.rs"]
mod tests;
