//! Configuration error types.

use thiserror::Error;

/// Result alias for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file contains invalid JSON or mismatched types.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// No API key was provided by any source.
    #[error("no API key configured; set apiKey in the config file or OPLINK_API_KEY")]
    MissingApiKey,

    /// Endpoint URL is empty or unusable.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_api_key_display() {
        let err = ConfigError::MissingApiKey;
        assert!(err.to_string().contains("OPLINK_API_KEY"));
    }

    #[test]
    fn invalid_endpoint_display() {
        let err = ConfigError::InvalidEndpoint("not a url".to_owned());
        assert!(err.to_string().contains("not a url"));
    }

    #[test]
    fn io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = ConfigError::from(io_err);
        assert!(err.to_string().contains("gone"));
    }
}
