// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use rust_decimal::Decimal;
use serde::Serialize;
use txsync_core::{Kind, NewTransaction, Transaction};

use crate::cli::OutputFormat;
use crate::config::{RetryPolicy, SyncConfig};
use crate::error::Result;
use crate::idempotency::{CreateIntent, IdempotencyKey};
use crate::mutation::MutationError;
use crate::session::Session;

use super::print_json;

#[derive(Serialize)]
struct CreatedJson<'a> {
    transaction: &'a Transaction,
    idempotency_key: &'a str,
}

pub async fn run(
    config: &SyncConfig,
    user: String,
    amount: Decimal,
    kind: Kind,
    key: Option<String>,
    no_retry: bool,
    output: OutputFormat,
) -> Result<()> {
    let body = NewTransaction::new(user, amount, kind)?;
    let intent = match key {
        Some(key) => CreateIntent::with_key(body, IdempotencyKey::from(key)),
        None => CreateIntent::new(body),
    };
    let policy = if no_retry {
        RetryPolicy {
            max_attempts: 1,
            ..config.create_retry.clone()
        }
    } else {
        config.create_retry.clone()
    };

    let session = Session::from_config(config)?;
    let tx = match session.mutations().create_with_retry(&intent, &policy).await {
        Ok(tx) => tx,
        Err(MutationError::Api(e)) if e.is_retryable() => {
            eprintln!(
                "hint: the server may still have applied this create; rerun with --key {} to retry safely",
                intent.key()
            );
            return Err(MutationError::Api(e).into());
        }
        Err(e) => return Err(e.into()),
    };

    match output {
        OutputFormat::Json => print_json(&CreatedJson {
            transaction: &tx,
            idempotency_key: intent.key().as_str(),
        })?,
        OutputFormat::Text => {
            println!("Created {} ({})", tx.id, tx.status);
            println!("  {} {} for {}", tx.kind, tx.amount, tx.user_id);
            println!("  key: {}", intent.key());
        }
    }
    Ok(())
}
