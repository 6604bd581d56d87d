// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access.
//!
//! All runtime environment variables read by the client are named in
//! [`vars`] and read through the typed accessors below.

use std::path::PathBuf;

/// Environment variable names.
pub mod vars {
    pub const TXSYNC_CONFIG: &str = "TXSYNC_CONFIG";
    pub const TXSYNC_BASE_URL: &str = "TXSYNC_BASE_URL";
    pub const TXSYNC_STREAM_URL: &str = "TXSYNC_STREAM_URL";
    pub const TXSYNC_KEEPALIVE_MS: &str = "TXSYNC_KEEPALIVE_MS";
    pub const TXSYNC_RECONNECT_MS: &str = "TXSYNC_RECONNECT_MS";
    pub const XDG_CONFIG_HOME: &str = "XDG_CONFIG_HOME";
}

/// Returns the value of `TXSYNC_CONFIG` if set.
pub fn config_path() -> Option<PathBuf> {
    non_empty(vars::TXSYNC_CONFIG).map(PathBuf::from)
}

/// Returns the value of `TXSYNC_BASE_URL` if set.
pub fn base_url() -> Option<String> {
    non_empty(vars::TXSYNC_BASE_URL)
}

/// Returns the value of `TXSYNC_STREAM_URL` if set.
pub fn stream_url() -> Option<String> {
    non_empty(vars::TXSYNC_STREAM_URL)
}

/// Returns the raw value of `TXSYNC_KEEPALIVE_MS` if set.
pub fn keepalive_ms() -> Option<String> {
    non_empty(vars::TXSYNC_KEEPALIVE_MS)
}

/// Returns the raw value of `TXSYNC_RECONNECT_MS` if set.
pub fn reconnect_ms() -> Option<String> {
    non_empty(vars::TXSYNC_RECONNECT_MS)
}

/// Returns the value of `XDG_CONFIG_HOME` if set.
pub fn xdg_config_home() -> Option<PathBuf> {
    non_empty(vars::XDG_CONFIG_HOME).map(PathBuf::from)
}

fn non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
