// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Client configuration.
//!
//! Configuration is read from `config.toml` at an explicit path, the path in
//! `TXSYNC_CONFIG`, or `$XDG_CONFIG_HOME/txsync/config.toml`. Every field has
//! a default, so an absent default file is not an error. Environment
//! variables override individual fields afterwards.
//!
//! ```toml
//! base_url = "http://localhost:8000"
//! keepalive_interval_ms = 25000
//! reconnect_delay_ms = 3000
//! reconcile_policy = "newer_only"
//!
//! [create_retry]
//! max_attempts = 3
//! delay_ms = 1000
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::env;
use crate::sync::{ConnectionConfig, ReconcilePolicy};

const CONFIG_DIR_NAME: &str = "txsync";
const CONFIG_FILE_NAME: &str = "config.toml";
const STREAM_PATH: &str = "/transactions/stream";

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// How creates are retried after transient failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts including the first. 1 disables retrying.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Fixed wait between attempts (milliseconds).
    #[serde(default = "default_retry_delay_ms")]
    pub delay_ms: u64,
}

impl RetryPolicy {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay_ms: default_retry_delay_ms(),
        }
    }
}

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// REST API root, e.g. `http://localhost:8000`.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Push channel URL. Derived from `base_url` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_url: Option<String>,
    /// Keepalive interval while the push channel is open (milliseconds).
    /// Zero disables keepalive.
    #[serde(default = "default_keepalive_interval_ms")]
    pub keepalive_interval_ms: u64,
    /// Fixed delay before each reconnect attempt (milliseconds).
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
    /// Timeout for a single REST request (seconds).
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Page size for full fetches.
    #[serde(default = "default_list_limit")]
    pub list_limit: usize,
    #[serde(default)]
    pub reconcile_policy: ReconcilePolicy,
    #[serde(default)]
    pub create_retry: RetryPolicy,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_keepalive_interval_ms() -> u64 {
    25_000
}

fn default_reconnect_delay_ms() -> u64 {
    3_000
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_list_limit() -> usize {
    50
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1_000
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            stream_url: None,
            keepalive_interval_ms: default_keepalive_interval_ms(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            list_limit: default_list_limit(),
            reconcile_policy: ReconcilePolicy::default(),
            create_retry: RetryPolicy::default(),
        }
    }
}

/// Field overrides taken from the environment.
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    pub base_url: Option<String>,
    pub stream_url: Option<String>,
    pub keepalive_ms: Option<String>,
    pub reconnect_ms: Option<String>,
}

impl EnvOverrides {
    /// Read the `TXSYNC_*` variables.
    pub fn from_env() -> Self {
        Self {
            base_url: env::base_url(),
            stream_url: env::stream_url(),
            keepalive_ms: env::keepalive_ms(),
            reconnect_ms: env::reconnect_ms(),
        }
    }
}

impl SyncConfig {
    /// Config pointing at a specific server, everything else defaulted.
    pub fn for_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Loads configuration from a TOML file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Resolve, load, override from the environment, and validate.
    ///
    /// An explicit path (argument or `TXSYNC_CONFIG`) must exist. The default
    /// location may be absent, in which case defaults are used.
    pub fn resolve(explicit: Option<&Path>) -> ConfigResult<Self> {
        let explicit = explicit.map(Path::to_path_buf).or_else(env::config_path);
        let mut config = match explicit {
            Some(path) => Self::load(&path)?,
            None => match Self::default_path() {
                Some(path) if path.is_file() => Self::load(&path)?,
                _ => Self::default(),
            },
        };
        config.apply_overrides(EnvOverrides::from_env())?;
        config.validate()?;
        Ok(config)
    }

    /// `$XDG_CONFIG_HOME/txsync/config.toml`, falling back to the platform
    /// config directory.
    pub fn default_path() -> Option<PathBuf> {
        env::xdg_config_home()
            .or_else(dirs::config_dir)
            .map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Apply environment overrides on top of the file values.
    pub fn apply_overrides(&mut self, overrides: EnvOverrides) -> ConfigResult<()> {
        if let Some(url) = overrides.base_url {
            self.base_url = url;
        }
        if let Some(url) = overrides.stream_url {
            self.stream_url = Some(url);
        }
        if let Some(raw) = overrides.keepalive_ms {
            self.keepalive_interval_ms = parse_millis(env::vars::TXSYNC_KEEPALIVE_MS, &raw)?;
        }
        if let Some(raw) = overrides.reconnect_ms {
            self.reconnect_delay_ms = parse_millis(env::vars::TXSYNC_RECONNECT_MS, &raw)?;
        }
        Ok(())
    }

    /// Check that the configuration is usable.
    pub fn validate(&self) -> ConfigResult<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "base_url '{}' must start with http:// or https://",
                self.base_url
            )));
        }
        let stream_url = self.stream_url();
        if !(stream_url.starts_with("ws://") || stream_url.starts_with("wss://")) {
            return Err(ConfigError::Invalid(format!(
                "stream_url '{}' must start with ws:// or wss://",
                stream_url
            )));
        }
        if self.reconnect_delay_ms == 0 {
            return Err(ConfigError::Invalid(
                "reconnect_delay_ms must be greater than zero".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.list_limit == 0 {
            return Err(ConfigError::Invalid(
                "list_limit must be greater than zero".to_string(),
            ));
        }
        if self.create_retry.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "create_retry.max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// The push channel URL, explicit or derived from `base_url`.
    ///
    /// `http://host:8000` becomes `ws://host:8000/transactions/stream`.
    pub fn stream_url(&self) -> String {
        if let Some(url) = &self.stream_url {
            return url.clone();
        }
        let base = self.base_url.trim_end_matches('/');
        let ws_base = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            base.to_string()
        };
        format!("{}{}", ws_base, STREAM_PATH)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connection_config(&self) -> ConnectionConfig {
        ConnectionConfig {
            keepalive_interval: Duration::from_millis(self.keepalive_interval_ms),
            reconnect_delay: Duration::from_millis(self.reconnect_delay_ms),
        }
    }
}

fn parse_millis(name: &str, raw: &str) -> ConfigResult<u64> {
    raw.trim().parse().map_err(|_| {
        ConfigError::Invalid(format!(
            "{} must be a whole number of milliseconds, got '{}'",
            name, raw
        ))
    })
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
