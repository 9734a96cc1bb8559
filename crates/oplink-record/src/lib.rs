//! # oplink-record
//!
//! The instrumentation wrapper: wrap a callable once, then every
//! invocation is recorded as an action event and routed to the right
//! session.
//!
//! Rust has no runtime signature reflection, so the wrapper is built from
//! three explicit pieces:
//!
//! - [`Signature`]: the callable's declared parameter names and defaults,
//!   in declaration order
//! - [`CallArgs`]: the positional/keyword values of one invocation, plus
//!   the typed `session` routing channel
//! - [`Recorder`]: builds [`Recorded`] (sync) and [`RecordedAsync`]
//!   wrappers bound to a session registry
//!
//! Recording is transparent to control flow: the callable's own error is
//! always returned unchanged, and enqueueing never blocks on network I/O.

#![deny(unsafe_code)]

pub mod args;
pub mod errors;
pub mod recorder;
pub mod signature;

pub use args::CallArgs;
pub use errors::{BindError, RecordError};
pub use recorder::{Recorded, RecordedAsync, Recorder};
pub use signature::Signature;
