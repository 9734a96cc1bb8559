//! # oplink-core
//!
//! Foundation types shared by every oplink crate:
//!
//! - **Branded IDs**: `SessionId` and `EventId` newtypes for type safety
//! - **Routing errors**: the `RoutingError` taxonomy surfaced to
//!   instrumented callers when an event cannot be attributed to a session
//! - **Retry math**: `RetryConfig` and the portable backoff calculation
//!   used by the delivery worker

#![deny(unsafe_code)]

pub mod errors;
pub mod ids;
pub mod retry;

pub use errors::RoutingError;
pub use ids::{EventId, SessionId};
pub use retry::RetryConfig;
