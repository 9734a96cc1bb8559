//! Facade error type.

use thiserror::Error;

use oplink_config::ConfigError;
use oplink_core::RoutingError;
use oplink_session::SessionError;

/// Errors surfaced by [`Client`](crate::Client) operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Configuration is unusable.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// Session lifecycle operation failed.
    #[error("{0}")]
    Session(#[from] SessionError),

    /// No unambiguous session to operate on.
    #[error("{0}")]
    Routing(#[from] RoutingError),
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_converts() {
        let err = ClientError::from(ConfigError::MissingApiKey);
        assert!(matches!(err, ClientError::Config(_)));
        assert!(err.to_string().contains("API key"));
    }

    #[test]
    fn routing_error_converts() {
        let err = ClientError::from(RoutingError::NoActiveSession);
        assert!(matches!(err, ClientError::Routing(_)));
    }
}
