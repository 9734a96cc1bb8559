//! # oplink-client
//!
//! Authenticated HTTP client for the collector's v2 API: session
//! handshake, batched event delivery, session end, and JWT
//! reauthorization. Each call is a single request; retry policy lives
//! with the delivery worker in `oplink-session`.

#![deny(unsafe_code)]

pub mod api;
pub mod errors;

pub use api::ApiClient;
pub use errors::ApiError;
