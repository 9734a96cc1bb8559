//! Routing error taxonomy.
//!
//! A [`RoutingError`] is raised when a recorded call cannot be attributed to
//! a session. Unlike delivery failures (which are retried and, at worst,
//! reported to the error observer), routing errors surface synchronously to
//! the instrumented caller: silently mis-routing an event across concurrent
//! sessions must never happen.

use thiserror::Error;

/// Failure to resolve the session an event belongs to.
#[derive(Debug, Error)]
pub enum RoutingError {
    /// No session is currently `Active`, so an implicit route has no target.
    #[error("no active session to record against; call start_session first")]
    NoActiveSession,

    /// More than one session is `Active` and the caller did not specify one.
    #[error("{active} sessions are active; pass an explicit session to disambiguate")]
    AmbiguousSession {
        /// Number of sessions that were `Active` at resolution time.
        active: usize,
    },

    /// The target session exists but no longer accepts events.
    #[error("session {session_id} is not active")]
    SessionNotActive {
        /// ID of the session that rejected the event.
        session_id: String,
    },

    /// An explicit session handle does not belong to the registry.
    #[error("session {session_id} is not registered")]
    UnknownSession {
        /// ID carried by the stale handle.
        session_id: String,
    },
}

impl RoutingError {
    /// Machine-readable error code, stable across message rewording.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoActiveSession => "NO_ACTIVE_SESSION",
            Self::AmbiguousSession { .. } => "AMBIGUOUS_SESSION",
            Self::SessionNotActive { .. } => "SESSION_NOT_ACTIVE",
            Self::UnknownSession { .. } => "UNKNOWN_SESSION",
        }
    }

    /// Whether the caller can recover by passing an explicit session.
    #[must_use]
    pub fn needs_explicit_session(&self) -> bool {
        matches!(self, Self::AmbiguousSession { .. })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_active_session_display() {
        let err = RoutingError::NoActiveSession;
        assert!(err.to_string().contains("no active session"));
        assert_eq!(err.code(), "NO_ACTIVE_SESSION");
    }

    #[test]
    fn ambiguous_session_display_carries_count() {
        let err = RoutingError::AmbiguousSession { active: 3 };
        assert!(err.to_string().contains('3'));
        assert_eq!(err.code(), "AMBIGUOUS_SESSION");
        assert!(err.needs_explicit_session());
    }

    #[test]
    fn session_not_active_display() {
        let err = RoutingError::SessionNotActive {
            session_id: "sess-1".to_owned(),
        };
        assert!(err.to_string().contains("sess-1"));
        assert_eq!(err.code(), "SESSION_NOT_ACTIVE");
        assert!(!err.needs_explicit_session());
    }

    #[test]
    fn unknown_session_display() {
        let err = RoutingError::UnknownSession {
            session_id: "sess-9".to_owned(),
        };
        assert!(err.to_string().contains("sess-9"));
        assert_eq!(err.code(), "UNKNOWN_SESSION");
    }

    #[test]
    fn routing_error_is_std_error() {
        let err = RoutingError::NoActiveSession;
        let _: &dyn std::error::Error = &err;
    }
}
