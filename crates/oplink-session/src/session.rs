//! Session lifecycle.
//!
//! A [`Session`] owns an authenticated channel to the collector (the JWT
//! obtained by the registration handshake), the event buffer, and the
//! background flush worker. Instrumented callers only ever touch
//! [`enqueue`](Session::enqueue), which is a lock-push — never network
//! I/O.
//!
//! State machine: `Active` → `Ending` → `Ended`. Events are accepted only
//! while `Active`. [`end`](Session::end) performs the forced flush
//! (bounded by `max_wait_time_ms`), notifies the collector of the end
//! state, unregisters, and stops the worker.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use oplink_client::ApiClient;
use oplink_config::Config;
use oplink_core::{RoutingError, SessionId};
use oplink_events::ActionEvent;

use crate::errors::SessionError;
use crate::flusher::{self, FlushWorker, WorkerCommand};
use crate::observer::ErrorObserver;
use crate::registry::SessionRegistry;

/// How long a graceful worker shutdown may take after the final drain.
const SHUTDOWN_GRACE_MS: u64 = 1_000;

/// Lifecycle state of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum SessionState {
    /// Accepting events; flush worker running.
    Active = 0,
    /// `end` in progress; no new events accepted.
    Ending = 1,
    /// Fully shut down.
    Ended = 2,
}

impl SessionState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Active,
            1 => Self::Ending,
            _ => Self::Ended,
        }
    }
}

/// One logical tracking session with its own delivery channel.
pub struct Session {
    id: SessionId,
    /// Bearer token; the worker refreshes it on reauthorization.
    jwt: Arc<RwLock<String>>,
    state: AtomicU8,
    buffer: Arc<Mutex<Vec<ActionEvent>>>,
    commands: mpsc::Sender<WorkerCommand>,
    worker: Mutex<Option<tokio::task::JoinHandle<()>>>,
    registry: Weak<SessionRegistry>,
    end_state: Mutex<Option<String>>,
    max_queue_size: usize,
    max_wait_time_ms: u64,
    api: ApiClient,
    init_timestamp: DateTime<Utc>,
}

impl Session {
    /// Perform the registration handshake, spawn the flush worker, and
    /// register the new `Active` session with the registry.
    pub async fn start(
        api: ApiClient,
        config: &Config,
        registry: &Arc<SessionRegistry>,
        tags: Vec<String>,
        observer: Arc<dyn ErrorObserver>,
    ) -> Result<Arc<Self>, SessionError> {
        let id = SessionId::new();
        let init_timestamp = Utc::now();
        let jwt = api
            .create_session(&id, init_timestamp, &tags)
            .await
            .map_err(SessionError::Handshake)?;

        let jwt = Arc::new(RwLock::new(jwt));
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let (commands, rx) = mpsc::channel(16);

        let handle = flusher::spawn(
            FlushWorker {
                session_id: id.clone(),
                buffer: buffer.clone(),
                api: api.clone(),
                jwt: jwt.clone(),
                retry: config.retry.clone(),
                observer,
            },
            config.flush_interval_ms,
            rx,
        );

        let session = Arc::new(Self {
            id,
            jwt,
            state: AtomicU8::new(SessionState::Active as u8),
            buffer,
            commands,
            worker: Mutex::new(Some(handle)),
            registry: Arc::downgrade(registry),
            end_state: Mutex::new(None),
            max_queue_size: config.max_queue_size.max(1),
            max_wait_time_ms: config.max_wait_time_ms,
            api,
            init_timestamp,
        });

        registry.register(session.clone());
        debug!(session_id = %session.id, "session started");
        Ok(session)
    }

    /// Session ID.
    #[must_use]
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Current bearer token (refreshed by the worker on reauthorization).
    #[must_use]
    pub fn jwt(&self) -> String {
        self.jwt.read().clone()
    }

    /// Wall-clock time the session was started.
    #[must_use]
    pub fn init_timestamp(&self) -> DateTime<Utc> {
        self.init_timestamp
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Whether the session currently accepts events.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state() == SessionState::Active
    }

    /// End state recorded by [`end`](Self::end), once ended.
    #[must_use]
    pub fn end_state(&self) -> Option<String> {
        self.end_state.lock().clone()
    }

    /// Number of events buffered and not yet handed to the worker.
    #[must_use]
    pub fn pending_events(&self) -> usize {
        self.buffer.lock().len()
    }

    /// Append an event to the session buffer.
    ///
    /// Fire-and-forget: a lock-push plus, when the buffer crosses the
    /// size threshold, a non-blocking kick of the flush worker. Fails if
    /// the session is no longer `Active`.
    pub fn enqueue(&self, event: ActionEvent) -> Result<(), RoutingError> {
        if !self.is_active() {
            return Err(RoutingError::SessionNotActive {
                session_id: self.id.to_string(),
            });
        }

        let len = {
            let mut buffer = self.buffer.lock();
            buffer.push(event);
            buffer.len()
        };

        if len >= self.max_queue_size {
            // A full command channel already has a flush pending.
            let _ = self.commands.try_send(WorkerCommand::Kick);
        }
        Ok(())
    }

    /// End the session.
    ///
    /// Transitions to `Ending`, forces a final flush of the buffer
    /// (waiting at most `max_wait_time_ms`), notifies the collector of
    /// `end_state`, transitions to `Ended`, unregisters from the
    /// registry, and stops the flush worker. Events still in flight once
    /// the wait bound elapses are dropped.
    pub async fn end(
        &self,
        end_state: &str,
        end_state_reason: Option<&str>,
    ) -> Result<(), SessionError> {
        if self
            .state
            .compare_exchange(
                SessionState::Active as u8,
                SessionState::Ending as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            return Err(SessionError::NotActive {
                session_id: self.id.to_string(),
            });
        }

        // Forced flush, bounded by the wait-time budget.
        let (reply_tx, reply_rx) = oneshot::channel();
        let mut drained = false;
        if self.commands.send(WorkerCommand::Drain(reply_tx)).await.is_ok() {
            drained = matches!(
                tokio::time::timeout(Duration::from_millis(self.max_wait_time_ms), reply_rx).await,
                Ok(Ok(()))
            );
        }
        if !drained {
            warn!(
                session_id = %self.id,
                "forced flush did not complete within the wait budget; remaining events dropped"
            );
        }

        // End notification follows the delivery-failure policy: local only.
        let jwt = self.jwt.read().clone();
        if let Err(e) = self
            .api
            .update_session(&jwt, &self.id, Utc::now(), end_state, end_state_reason)
            .await
        {
            warn!(session_id = %self.id, error = %e, "failed to report session end to collector");
        }

        *self.end_state.lock() = Some(end_state.to_owned());
        self.state
            .store(SessionState::Ended as u8, Ordering::Release);

        if let Some(registry) = self.registry.upgrade() {
            let _ = registry.unregister(&self.id);
        }

        // Graceful worker stop after a clean drain; hard stop otherwise.
        let handle = self.worker.lock().take();
        if let Some(handle) = handle {
            if drained {
                let _ = self.commands.send(WorkerCommand::Shutdown).await;
                if tokio::time::timeout(Duration::from_millis(SHUTDOWN_GRACE_MS), handle)
                    .await
                    .is_err()
                {
                    warn!(session_id = %self.id, "flush worker did not stop in time");
                }
            } else {
                handle.abort();
            }
        }

        debug!(session_id = %self.id, end_state, "session ended");
        Ok(())
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("pending_events", &self.pending_events())
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
