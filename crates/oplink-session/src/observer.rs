//! Terminal delivery failure reporting.
//!
//! Delivery failures are invisible to the instrumented call site by
//! design: the call already returned by the time its event is flushed.
//! When the worker exhausts its retries it drops the batch and reports
//! here instead of surfacing anywhere in caller control flow.

use oplink_client::ApiError;
use oplink_core::SessionId;
use tracing::error;

/// Sink for batches the delivery worker gave up on.
pub trait ErrorObserver: Send + Sync {
    /// Called once per dropped batch, after the last retry failed.
    fn on_delivery_failure(&self, session_id: &SessionId, error: &ApiError, dropped_events: usize);
}

/// Default observer: logs the drop at error level.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogObserver;

impl ErrorObserver for LogObserver {
    fn on_delivery_failure(&self, session_id: &SessionId, error: &ApiError, dropped_events: usize) {
        error!(
            session_id = %session_id,
            dropped_events,
            error = %error,
            "event batch dropped after exhausting delivery retries"
        );
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
