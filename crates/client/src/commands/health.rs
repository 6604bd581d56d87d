// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use crate::api::HttpApi;
use crate::config::SyncConfig;
use crate::error::Result;

pub async fn run(config: &SyncConfig) -> Result<()> {
    let api = HttpApi::from_config(config)?;
    let health = api.health().await?;
    println!("{}: {}", api.base_url(), health.status);
    Ok(())
}
