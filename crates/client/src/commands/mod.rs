// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod create;
pub mod health;
pub mod list;
pub mod logs;
pub mod process;
pub mod watch;

use std::path::Path;

use serde::Serialize;

use crate::config::SyncConfig;
use crate::error::Result;

/// Resolve the configuration for a command.
///
/// A `--base-url` flag wins over both the file and the environment.
pub fn load_config(path: Option<&Path>, base_url: Option<&str>) -> Result<SyncConfig> {
    let mut config = SyncConfig::resolve(path)?;
    if let Some(url) = base_url {
        config.base_url = url.to_string();
        config.validate()?;
    }
    Ok(config)
}

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
