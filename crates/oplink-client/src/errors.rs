//! Collector API error types.

use thiserror::Error;

/// Errors returned by collector API calls.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP transport failed (connect, timeout, TLS, ...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body could not be decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Collector answered with a non-success status.
    #[error("collector error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, if any.
        message: String,
        /// Parsed `Retry-After` header, in milliseconds.
        retry_after_ms: Option<u64>,
    },
}

impl ApiError {
    /// HTTP status of the failure, if the collector answered at all.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            Self::Json(_) => None,
        }
    }

    /// Whether retrying the same request may succeed.
    ///
    /// Network-level failures, 429, and 5xx are transient; everything
    /// else is not worth repeating.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => e.status().is_none_or(|s| s.is_server_error()),
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            Self::Json(_) => false,
        }
    }

    /// Whether the session token was rejected (triggers reauthorization).
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Collector-requested retry delay, if one was sent.
    #[must_use]
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            Self::Api { retry_after_ms, .. } => *retry_after_ms,
            Self::Http(_) | Self::Json(_) => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
