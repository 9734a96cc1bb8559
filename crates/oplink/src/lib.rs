//! # oplink
//!
//! Session-scoped action-event telemetry: wrap a function once, and every
//! call is recorded (arguments, return value, wall-clock timing) and
//! delivered — batched, ordered, and authenticated — to a collector
//! backend.
//!
//! The facade ties the pieces together:
//!
//! - [`Client`]: owns the [`SessionRegistry`] and the collector
//!   [`ApiClient`](oplink_client::ApiClient); `start_session` /
//!   `end_session` are the public lifecycle entry points
//! - [`Recorder`] / [`Signature`] / [`CallArgs`]: the instrumentation
//!   wrapper surface, re-exported from `oplink-record`
//! - [`Config`] / [`load_config`]: layered configuration
//! - [`init_logging`]: `tracing` subscriber bootstrap
//!
//! Every session keeps its own ordered buffer and background flusher;
//! with several sessions active concurrently, calls must name their
//! session explicitly — ambiguity is an error, never a silent mis-route.

#![deny(unsafe_code)]

pub mod client;
pub mod errors;
pub mod logging;

pub use client::Client;
pub use errors::ClientError;
pub use logging::init_logging;

pub use oplink_client::{ApiClient, ApiError};
pub use oplink_config::{Config, load_config, load_config_from_path};
pub use oplink_core::{EventId, RetryConfig, RoutingError, SessionId};
pub use oplink_events::{ActionEvent, ErrorDetails, Params};
pub use oplink_record::{BindError, CallArgs, RecordError, Recorded, RecordedAsync, Recorder, Signature};
pub use oplink_session::{ErrorObserver, LogObserver, Session, SessionRegistry, SessionState};
