// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use txsync_core::{LogEntry, TransactionId};

use crate::api::HttpApi;
use crate::cli::OutputFormat;
use crate::config::SyncConfig;
use crate::display::format_log_entry;
use crate::error::Result;

use super::print_json;

/// Which slice of the server log to show.
pub enum LogQuery {
    Recent,
    Grouped,
    Transaction(String),
    Request(String),
}

pub async fn run(
    config: &SyncConfig,
    query: LogQuery,
    limit: Option<usize>,
    output: OutputFormat,
) -> Result<()> {
    let api = HttpApi::from_config(config)?;
    let limit = limit.unwrap_or(config.list_limit);

    let entries = match query {
        LogQuery::Grouped => {
            let groups = api.logs_grouped(limit).await?;
            match output {
                OutputFormat::Json => print_json(&groups)?,
                OutputFormat::Text => {
                    for (request_id, entries) in &groups {
                        println!("{}:", request_id);
                        for entry in entries {
                            println!("    {}", format_log_entry(entry));
                        }
                    }
                }
            }
            return Ok(());
        }
        LogQuery::Recent => api.logs(limit).await?,
        LogQuery::Transaction(id) => api.logs_for_transaction(&TransactionId::new(id)).await?,
        LogQuery::Request(id) => api.logs_for_request(&id).await?,
    };
    print_entries(&entries, output)
}

fn print_entries(entries: &[LogEntry], output: OutputFormat) -> Result<()> {
    match output {
        OutputFormat::Json => print_json(entries)?,
        OutputFormat::Text => {
            if entries.is_empty() {
                println!("No log entries");
            }
            for entry in entries {
                println!("{}", format_log_entry(entry));
            }
        }
    }
    Ok(())
}
