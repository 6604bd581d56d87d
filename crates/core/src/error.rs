// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for txsync-core operations.

use thiserror::Error;

/// All possible errors that can occur while decoding or validating domain data.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid status: '{0}'\n  hint: valid statuses are: pending, processed, failed, cancelled")]
    InvalidStatus(String),

    #[error("invalid kind: '{0}'\n  hint: valid kinds are: inflow, outflow")]
    InvalidKind(String),

    #[error("invalid amount: '{0}'\n  hint: amounts are positive decimals such as 100.50")]
    InvalidAmount(String),

    #[error("unrecognized event tag: '{0}'")]
    UnrecognizedEvent(String),

    #[error("event '{event}' is missing required field '{field}'")]
    MissingField {
        event: &'static str,
        field: &'static str,
    },

    #[error("{0}")]
    InvalidInput(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for txsync-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
