use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::fetch::FetchOptions;

/// Root configuration container.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub clipboard: ClipboardConfig,
}

/// Defaults for the fetch adapter and its HTTP client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Retries after the initial attempt (default: 3).
    #[serde(default = "default_retries")]
    pub retries: u32,
    /// Delay before each retry in milliseconds (default: 1000).
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Total request timeout in seconds (default: 30).
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
    /// Connection timeout in seconds (default: 5).
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u32,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Location of the file-backed store.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Explicit storage file. Falls back to the platform data directory.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipboardConfig {
    /// How long `copied` stays true after a successful copy (default: 1000).
    #[serde(default = "default_reset_after_ms")]
    pub reset_after_ms: u64,
}

fn default_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_timeout() -> u32 {
    30
}

fn default_connect_timeout() -> u32 {
    5
}

fn default_user_agent() -> String {
    format!("usekit/{}", env!("CARGO_PKG_VERSION"))
}

fn default_reset_after_ms() -> u64 {
    1000
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            retries: default_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            timeout_seconds: default_timeout(),
            connect_timeout_seconds: default_connect_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for ClipboardConfig {
    fn default() -> Self {
        Self {
            reset_after_ms: default_reset_after_ms(),
        }
    }
}

impl FetchConfig {
    /// Adapter options carrying this config's retry policy.
    pub fn options(&self) -> FetchOptions {
        FetchOptions::default()
            .with_retries(self.retries)
            .with_retry_delay(Duration::from_millis(self.retry_delay_ms))
    }
}

impl ClipboardConfig {
    pub fn reset_after(&self) -> Duration {
        Duration::from_millis(self.reset_after_ms)
    }
}
