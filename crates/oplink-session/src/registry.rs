//! Process-wide session table and routing policy.
//!
//! The registry is the only structure shared across sessions. It is
//! deliberately an owned, injectable object rather than hidden module
//! state, so tests (and embedders running several clients) can use
//! isolated registries.
//!
//! Resolution policy for implicit routing: exactly one `Active` session →
//! route to it; zero → [`RoutingError::NoActiveSession`]; more than one →
//! [`RoutingError::AmbiguousSession`]. The ambiguity failure is the key
//! correctness property — an event is never silently attributed to the
//! wrong concurrent session.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use oplink_core::{RoutingError, SessionId};

use crate::session::Session;

/// Concurrent table of live sessions, keyed by session ID.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<String, Arc<Session>>,
}

impl SessionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a newly started session.
    pub fn register(&self, session: Arc<Session>) {
        let id = session.id().to_string();
        debug!(session_id = %id, "session registered");
        let _ = self.sessions.insert(id, session);
    }

    /// Remove a session; called when it transitions to `Ended`.
    pub fn unregister(&self, id: &SessionId) -> Option<Arc<Session>> {
        let removed = self.sessions.remove(id.as_str()).map(|(_, s)| s);
        if removed.is_some() {
            debug!(session_id = %id, "session unregistered");
        }
        removed
    }

    /// Look up a session by ID, whatever its state.
    #[must_use]
    pub fn get(&self, id: &SessionId) -> Option<Arc<Session>> {
        self.sessions.get(id.as_str()).map(|e| e.value().clone())
    }

    /// All sessions currently `Active`.
    #[must_use]
    pub fn active_sessions(&self) -> Vec<Arc<Session>> {
        self.sessions
            .iter()
            .filter(|e| e.value().is_active())
            .map(|e| e.value().clone())
            .collect()
    }

    /// Number of sessions currently `Active`.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.sessions.iter().filter(|e| e.value().is_active()).count()
    }

    /// Resolve the session an event belongs to.
    ///
    /// With an explicit handle: the handle must still be registered and
    /// `Active`. Without one: exactly one `Active` session resolves
    /// implicitly; zero or several fail.
    pub fn resolve(&self, explicit: Option<&Arc<Session>>) -> Result<Arc<Session>, RoutingError> {
        if let Some(session) = explicit {
            if !self.sessions.contains_key(session.id().as_str()) {
                return Err(RoutingError::UnknownSession {
                    session_id: session.id().to_string(),
                });
            }
            if !session.is_active() {
                return Err(RoutingError::SessionNotActive {
                    session_id: session.id().to_string(),
                });
            }
            return Ok(session.clone());
        }

        let mut active = self.active_sessions();
        match active.len() {
            1 => Ok(active.remove(0)),
            0 => Err(RoutingError::NoActiveSession),
            n => Err(RoutingError::AmbiguousSession { active: n }),
        }
    }
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("sessions", &self.sessions.len())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
