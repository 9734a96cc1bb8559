//! Per-session delivery worker.
//!
//! Each session owns exactly one worker task. The worker loops over two
//! wake sources: a periodic flush timer and a command channel fed by the
//! session (size-threshold kicks, the forced drain at session end, and
//! shutdown). Every trigger swaps the session buffer for an empty one
//! under the lock and delivers the swapped-out batch as a single ordered
//! request.
//!
//! The loop is strictly sequential, which is what guarantees at most one
//! in-flight batch per session: a batch enqueued during network I/O waits
//! in the fresh buffer until the current delivery finishes.
//!
//! Delivery failures are retried with bounded exponential backoff (a
//! collector-sent `Retry-After` wins over the computed delay). A 401
//! triggers one JWT reauthorization for the batch. When retries are
//! exhausted the batch is dropped and reported to the [`ErrorObserver`] —
//! at-most-once delivery, never re-queued.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use rand::Rng;
use tokio::sync::{mpsc, oneshot};
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use oplink_client::{ApiClient, ApiError};
use oplink_core::retry::{RetryConfig, backoff_delay};
use oplink_core::SessionId;
use oplink_events::ActionEvent;

use crate::observer::ErrorObserver;

/// Commands the session sends to its worker.
pub(crate) enum WorkerCommand {
    /// Flush now (buffer crossed the size threshold).
    Kick,
    /// Flush whatever remains and acknowledge; used by the forced flush
    /// at session end.
    Drain(oneshot::Sender<()>),
    /// Exit the loop.
    Shutdown,
}

/// State the worker needs; everything here is owned or shared by `Arc`.
pub(crate) struct FlushWorker {
    pub(crate) session_id: SessionId,
    pub(crate) buffer: Arc<Mutex<Vec<ActionEvent>>>,
    pub(crate) api: ApiClient,
    pub(crate) jwt: Arc<RwLock<String>>,
    pub(crate) retry: RetryConfig,
    pub(crate) observer: Arc<dyn ErrorObserver>,
}

/// Spawn the worker task for a session.
pub(crate) fn spawn(
    worker: FlushWorker,
    flush_interval_ms: u64,
    rx: mpsc::Receiver<WorkerCommand>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(run(worker, flush_interval_ms, rx))
}

async fn run(worker: FlushWorker, flush_interval_ms: u64, mut rx: mpsc::Receiver<WorkerCommand>) {
    let mut ticker = tokio::time::interval(Duration::from_millis(flush_interval_ms.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                worker.flush_pending().await;
            }
            cmd = rx.recv() => match cmd {
                Some(WorkerCommand::Kick) => {
                    worker.flush_pending().await;
                    ticker.reset();
                }
                Some(WorkerCommand::Drain(reply)) => {
                    worker.flush_pending().await;
                    let _ = reply.send(());
                }
                Some(WorkerCommand::Shutdown) | None => break,
            }
        }
    }

    debug!(session_id = %worker.session_id, "flush worker stopped");
}

impl FlushWorker {
    /// Swap the buffer for an empty one and deliver the swapped-out batch.
    ///
    /// Enqueues racing with delivery land in the fresh buffer and are
    /// picked up by the next trigger, so nothing is lost and nothing is
    /// double-sent.
    pub(crate) async fn flush_pending(&self) {
        let batch: Vec<ActionEvent> = std::mem::take(&mut *self.buffer.lock());
        if batch.is_empty() {
            return;
        }
        self.deliver(batch).await;
    }

    async fn deliver(&self, batch: Vec<ActionEvent>) {
        let mut attempt: u32 = 0;
        let mut reauthorized = false;

        loop {
            let jwt = self.jwt.read().clone();
            match self.api.create_events(&jwt, &batch).await {
                Ok(()) => {
                    debug!(
                        session_id = %self.session_id,
                        batch_len = batch.len(),
                        "batch delivered"
                    );
                    return;
                }
                Err(err) if err.is_unauthorized() && !reauthorized => {
                    reauthorized = true;
                    match self.api.reauthorize_jwt(&self.session_id).await {
                        Ok(fresh) => {
                            debug!(session_id = %self.session_id, "reauthorized session token");
                            *self.jwt.write() = fresh;
                        }
                        Err(reauth_err) => {
                            self.give_up(&batch, &reauth_err);
                            return;
                        }
                    }
                }
                Err(err) if err.is_retryable() && attempt < self.retry.max_retries => {
                    let delay_ms = err.retry_after_ms().unwrap_or_else(|| {
                        backoff_delay(attempt, &self.retry, rand::rng().random::<f64>())
                    });
                    warn!(
                        session_id = %self.session_id,
                        attempt = attempt + 1,
                        delay_ms,
                        error = %err,
                        "batch delivery failed, backing off"
                    );
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    attempt += 1;
                }
                Err(err) => {
                    self.give_up(&batch, &err);
                    return;
                }
            }
        }
    }

    fn give_up(&self, batch: &[ActionEvent], err: &ApiError) {
        self.observer
            .on_delivery_failure(&self.session_id, err, batch.len());
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
