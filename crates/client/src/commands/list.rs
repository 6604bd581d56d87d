// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use crate::api::{HttpApi, TransactionApi};
use crate::cli::OutputFormat;
use crate::config::SyncConfig;
use crate::display::format_transaction_line;
use crate::error::Result;

use super::print_json;

pub async fn run(config: &SyncConfig, limit: Option<usize>, output: OutputFormat) -> Result<()> {
    let api = HttpApi::from_config(config)?;
    let transactions = api
        .list_transactions(limit.unwrap_or(config.list_limit))
        .await?;

    match output {
        OutputFormat::Json => print_json(&transactions)?,
        OutputFormat::Text => {
            if transactions.is_empty() {
                println!("No transactions");
            }
            for tx in &transactions {
                println!("{}", format_transaction_line(tx));
            }
        }
    }
    Ok(())
}
