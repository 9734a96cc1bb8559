//! Session lifecycle error types.

use thiserror::Error;

use oplink_client::ApiError;

/// Errors from session lifecycle operations.
///
/// Delivery failures never appear here; they are retried by the flush
/// worker and, at worst, reported to the
/// [`ErrorObserver`](crate::ErrorObserver).
#[derive(Debug, Error)]
pub enum SessionError {
    /// The registration handshake with the collector failed, so no
    /// session was started.
    #[error("session registration failed: {0}")]
    Handshake(#[source] ApiError),

    /// The operation requires an `Active` session.
    #[error("session {session_id} is not active")]
    NotActive {
        /// ID of the session the operation targeted.
        session_id: String,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
