// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! txsync - A real-time client for a transaction processing server.
//!
//! This crate keeps a local view of the server's transaction list current.
//! A REST full fetch seeds the view, a push channel delivers status changes
//! as they happen, and creates go through the REST API with idempotency keys.
//!
//! # Main Components
//!
//! - [`Session`] - One live view: connection, router, store and mutations
//! - [`sync`] - Push channel connection, message routing and the state store
//! - [`MutationClient`] - Creates and processing requests
//! - [`HttpApi`] - REST client, including health and log queries
//! - [`SyncConfig`] - File and environment configuration
//!
//! ```rust,ignore
//! use txsync::{Session, SyncConfig};
//!
//! let config = SyncConfig::resolve(None)?;
//! let mut session = Session::from_config(&config)?;
//! session.refresh().await?;
//! session.open()?;
//! let mut events = session.subscribe_channel();
//! while let Some(event) = events.recv().await {
//!     println!("{}", event.tag());
//! }
//! session.dispose().await;
//! ```

mod cli;
mod commands;
mod display;

pub mod api;
pub mod config;
pub mod env;
pub mod error;
pub mod idempotency;
pub mod mutation;
pub mod session;
pub mod sync;

pub use api::{ApiError, HttpApi, TransactionApi};
pub use cli::{Cli, Command, LimitArgs, OutputFormat};
pub use config::{ConfigError, RetryPolicy, SyncConfig};
pub use error::{Error, Result};
pub use idempotency::{CreateIntent, IdempotencyKey};
pub use mutation::{MutationClient, MutationError};
pub use session::Session;

use commands::logs::LogQuery;

/// Execute a CLI command. This is the main entry point for library users
/// and provides a testable way to run commands without process execution.
pub async fn run(cli: Cli) -> Result<()> {
    let config = commands::load_config(cli.config.as_deref(), cli.base_url.as_deref())?;

    match cli.command {
        Command::Watch { no_refresh } => commands::watch::run(&config, no_refresh).await,
        Command::List { limits, output } => commands::list::run(&config, limits.limit, output).await,
        Command::Create {
            user,
            amount,
            kind,
            key,
            no_retry,
            output,
        } => commands::create::run(&config, user, amount, kind, key, no_retry, output).await,
        Command::Process { id } => commands::process::run(&config, &id).await,
        Command::Logs {
            limits,
            grouped,
            transaction,
            request,
            output,
        } => {
            let query = match (grouped, transaction, request) {
                (true, _, _) => LogQuery::Grouped,
                (false, Some(id), _) => LogQuery::Transaction(id),
                (false, None, Some(id)) => LogQuery::Request(id),
                (false, None, None) => LogQuery::Recent,
            };
            commands::logs::run(&config, query, limits.limit, output).await
        }
        Command::Health => commands::health::run(&config).await,
    }
}
