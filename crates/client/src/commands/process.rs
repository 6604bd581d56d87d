// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use txsync_core::TransactionId;

use crate::api::{ApiError, HttpApi, TransactionApi};
use crate::config::SyncConfig;
use crate::error::{Error, Result};

pub async fn run(config: &SyncConfig, id: &str) -> Result<()> {
    let api = HttpApi::from_config(config)?;
    let id = TransactionId::new(id);

    let job = match api.process_transaction(&id).await {
        Ok(job) => job,
        Err(ApiError::Status { status: 404, .. }) => {
            return Err(Error::TransactionNotFound(id.to_string()))
        }
        Err(e) => return Err(e.into()),
    };

    println!("Enqueued {} as job {}", id, job.job_id);
    Ok(())
}
