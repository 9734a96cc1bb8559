//! Configuration types and compiled defaults.

use serde::{Deserialize, Serialize};

use oplink_core::RetryConfig;

use crate::errors::ConfigError;

/// Default collector endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.agentops.ai";
/// Default periodic flush interval in milliseconds.
pub const DEFAULT_FLUSH_INTERVAL_MS: u64 = 100;
/// Default buffer size that triggers an early flush.
pub const DEFAULT_MAX_QUEUE_SIZE: usize = 100;
/// Default bound on the forced flush performed when a session ends.
pub const DEFAULT_MAX_WAIT_TIME_MS: u64 = 5_000;

/// Client configuration.
///
/// File keys are camelCase (the config file is shared with non-Rust
/// tooling); every field has a compiled default so a partial file or no
/// file at all is fine.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Collector API key. Required before a client can start sessions.
    pub api_key: String,
    /// Base URL of the collector.
    pub endpoint: String,
    /// Periodic flush interval in ms (default: 100).
    pub flush_interval_ms: u64,
    /// Buffered events that trigger a flush before the timer fires
    /// (default: 100).
    pub max_queue_size: usize,
    /// Maximum time in ms the final forced flush may take when a session
    /// ends (default: 5000).
    pub max_wait_time_ms: u64,
    /// Start a session as part of client initialization.
    pub auto_start_session: bool,
    /// Tags attached to every session this client starts.
    pub default_tags: Vec<String>,
    /// Delivery retry policy.
    pub retry: RetryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            flush_interval_ms: DEFAULT_FLUSH_INTERVAL_MS,
            max_queue_size: DEFAULT_MAX_QUEUE_SIZE,
            max_wait_time_ms: DEFAULT_MAX_WAIT_TIME_MS,
            auto_start_session: false,
            default_tags: Vec::new(),
            retry: RetryConfig::default(),
        }
    }
}

impl Config {
    /// Create a config with just an API key, defaults for everything else.
    #[must_use]
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Check the config is usable for starting sessions.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        if self.endpoint.is_empty() || !self.endpoint.starts_with("http") {
            return Err(ConfigError::InvalidEndpoint(self.endpoint.clone()));
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
