//! # oplink-session
//!
//! The session-scoped event pipeline:
//!
//! - [`SessionRegistry`]: process-wide table of live sessions with the
//!   explicit/implicit resolution policy
//! - [`Session`]: an authenticated channel to the collector with its own
//!   event buffer and background flush worker
//! - flusher: the per-session worker that batches, delivers, retries,
//!   and reports terminal failures to an [`ErrorObserver`]
//!
//! Sessions are fully independent of each other; the registry is the only
//! shared structure, and the per-session buffer is the only state shared
//! between callers and the worker.

#![deny(unsafe_code)]

pub mod errors;
mod flusher;
pub mod observer;
pub mod registry;
pub mod session;

pub use errors::SessionError;
pub use observer::{ErrorObserver, LogObserver};
pub use registry::SessionRegistry;
pub use session::{Session, SessionState};
