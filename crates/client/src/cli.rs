// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use txsync_core::Kind;

/// Parse a string that must not be empty or whitespace-only.
fn non_empty_string(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        Err("cannot be empty".to_string())
    } else {
        Ok(s.to_string())
    }
}

/// Parse a strictly positive decimal amount.
fn positive_amount(s: &str) -> Result<Decimal, String> {
    txsync_core::parse_amount(s).map_err(|e| e.to_string())
}

/// Output format for commands supporting structured output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "txsync")]
#[command(version)]
#[command(about = "Real-time client for a transaction processing server")]
#[command(
    long_about = "Real-time client for a transaction processing server.\n\n\
    Lists and creates transactions over REST and follows their status live over the push channel."
)]
pub struct Cli {
    /// Config file (default: $XDG_CONFIG_HOME/txsync/config.toml)
    #[arg(short, long, global = true, value_name = "path")]
    pub config: Option<PathBuf>,

    /// Server base URL, overriding the config file
    #[arg(long, global = true, value_name = "url")]
    pub base_url: Option<String>,

    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone)]
pub struct LimitArgs {
    /// Maximum number of entries to fetch
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch the transaction list and follow live status changes
    Watch {
        /// Skip the initial full fetch
        #[arg(long)]
        no_refresh: bool,
    },

    /// List recent transactions, newest first
    List {
        #[command(flatten)]
        limits: LimitArgs,

        #[arg(long, short, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },

    /// Create a transaction
    Create {
        /// Owner of the transaction
        #[arg(long, short, value_parser = non_empty_string)]
        user: String,

        /// Positive amount, e.g. 125.50
        #[arg(long, short, value_parser = positive_amount)]
        amount: Decimal,

        /// inflow or outflow
        #[arg(long, short)]
        kind: Kind,

        /// Reuse an idempotency key from an earlier attempt
        #[arg(long, value_parser = non_empty_string)]
        key: Option<String>,

        /// Submit once, without retrying transient failures
        #[arg(long)]
        no_retry: bool,

        #[arg(long, short, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },

    /// Enqueue a transaction for asynchronous processing
    Process {
        /// Transaction id
        #[arg(value_parser = non_empty_string)]
        id: String,
    },

    /// Show server-side log entries
    Logs {
        #[command(flatten)]
        limits: LimitArgs,

        /// Group entries by request id
        #[arg(long, conflicts_with_all = ["transaction", "request"])]
        grouped: bool,

        /// Only entries for this transaction
        #[arg(long, value_name = "id", conflicts_with = "request")]
        transaction: Option<String>,

        /// Only entries for this request id
        #[arg(long, value_name = "id")]
        request: Option<String>,

        #[arg(long, short, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },

    /// Check that the server is up
    Health,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
