//! # oplink-events
//!
//! The [`ActionEvent`] record type: one observed function call, immutable
//! once built, serialized to the collector's v2 wire format.

#![deny(unsafe_code)]

pub mod action;

pub use action::{ActionEvent, ErrorDetails, Params};
