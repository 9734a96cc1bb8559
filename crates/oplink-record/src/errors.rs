//! Wrapper error types.

use thiserror::Error;

use oplink_core::RoutingError;

/// The reserved routing key; never a real parameter name.
pub const RESERVED_SESSION_KEY: &str = "session";

/// Failure to bind call arguments against a declared signature.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BindError {
    /// A keyword argument does not name a declared parameter.
    #[error("`{callable}` has no parameter `{name}`")]
    UnknownParameter {
        /// Callable the signature belongs to.
        callable: String,
        /// Offending keyword name.
        name: String,
    },

    /// A parameter received both a positional and a keyword value, or two
    /// keyword values.
    #[error("`{callable}` got multiple values for parameter `{name}`")]
    DuplicateValue {
        /// Callable the signature belongs to.
        callable: String,
        /// Parameter that was assigned twice.
        name: String,
    },

    /// A parameter without a default was not given a value.
    #[error("`{callable}` missing required parameter `{name}`")]
    MissingParameter {
        /// Callable the signature belongs to.
        callable: String,
        /// Parameter left unbound.
        name: String,
    },

    /// More positional values than declared parameters.
    #[error("`{callable}` takes {declared} parameters but {given} positional values were given")]
    TooManyPositional {
        /// Callable the signature belongs to.
        callable: String,
        /// Number of declared parameters.
        declared: usize,
        /// Number of positional values supplied.
        given: usize,
    },

    /// `session` was passed as a keyword value; it is the routing channel
    /// and is stripped before the callable runs.
    #[error("`session` is reserved for routing; use CallArgs::session to target one")]
    ReservedName,
}

/// Error surfaced by a recorded call.
///
/// `Callable` is transparent: the wrapped function's own error comes back
/// to the caller exactly as it was raised.
#[derive(Debug, Error)]
pub enum RecordError<E: std::error::Error> {
    /// The wrapped callable itself failed. The event was still recorded.
    #[error(transparent)]
    Callable(E),

    /// The event could not be routed to a session.
    #[error(transparent)]
    Routing(#[from] RoutingError),

    /// The arguments did not bind against the declared signature; the
    /// callable was never invoked.
    #[error(transparent)]
    Bind(#[from] BindError),
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
