// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

use crate::api::ApiError;
use crate::config::ConfigError;
use crate::mutation::MutationError;
use crate::sync::ConnectionError;

/// All errors surfaced by the txsync library and CLI.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Mutation(#[from] MutationError),

    #[error(transparent)]
    Invalid(#[from] txsync_core::Error),

    #[error("transaction not found: {0}\n  hint: run 'txsync list' to see known transactions")]
    TransactionNotFound(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
