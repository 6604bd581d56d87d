// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use txsync_core::{DomainEvent, LogEntry, Transaction};

/// Width of the id column in list output.
const ID_WIDTH: usize = 12;

/// Format a transaction as a single list line.
///
/// `- [outflow] tx-1: 125.50 (pending) user-1`
pub fn format_transaction_line(tx: &Transaction) -> String {
    format!(
        "- [{}] {:<width$} {} ({}) {}",
        tx.kind,
        format!("{}:", tx.id),
        tx.amount,
        tx.status,
        tx.user_id,
        width = ID_WIDTH,
    )
}

/// Format a pushed event for the watch stream.
pub fn format_event(event: &DomainEvent) -> String {
    let id = event
        .transaction_id()
        .map(|id| id.as_str())
        .unwrap_or("?");
    let detail = match event {
        DomainEvent::Created { status, .. } => status
            .map(|s| format!("created as {}", s))
            .unwrap_or_else(|| "created".to_string()),
        DomainEvent::Enqueued { job_id, .. } => match job_id {
            Some(job) => format!("enqueued as job {}", job),
            None => "enqueued".to_string(),
        },
        DomainEvent::ProcessingStarted { .. } => "processing started".to_string(),
        DomainEvent::StatusChanged(change) => match change.previous_status {
            Some(from) => format!("{} -> {}", from, change.new_status),
            None => format!("-> {}", change.new_status),
        },
    };
    match event.timestamp() {
        Some(ts) => format!("{} {}: {}", ts.format("%H:%M:%S"), id, detail),
        None => format!("{}: {}", id, detail),
    }
}

/// Format a log entry as a single line.
pub fn format_log_entry(entry: &LogEntry) -> String {
    let mut line = format!("{} {:<5} {}", entry.timestamp, entry.level, entry.event);
    if let Some(tx) = &entry.transaction_id {
        line.push_str(&format!(" tx={}", tx));
    }
    if let Some(job) = &entry.job_id {
        line.push_str(&format!(" job={}", job));
    }
    if !entry.request_id.is_empty() {
        line.push_str(&format!(" req={}", entry.request_id));
    }
    line
}

#[cfg(test)]
#[path = "display_tests.rs"]
mod tests;
