//! Action event records.
//!
//! An [`ActionEvent`] describes one observed call of an instrumented
//! function: its logical name, the bound arguments, the outcome (return
//! value or error), and wall-clock timestamps bracketing the call. Events
//! are built at the call boundary and never mutated afterwards; the
//! delivery worker serializes them in enqueue order.
//!
//! Wire shape (one element of the `events` array in `POST /v2/create_events`):
//!
//! ```json
//! {
//!   "id": "0192...",
//!   "event_type": "actions",
//!   "action_type": "add_two",
//!   "params": {"x": 3, "y": 4},
//!   "returns": 7,
//!   "init_timestamp": "2025-01-15T10:00:00.000Z",
//!   "end_timestamp": "2025-01-15T10:00:00.120Z"
//! }
//! ```
//!
//! `params` preserves declaration order (`serde_json` is built with
//! `preserve_order`), so the collector sees arguments in the order the
//! wrapped function declares them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use oplink_core::EventId;

/// Wire discriminator the collector's v2 schema requires on every event.
pub const ACTION_EVENT_TYPE: &str = "actions";

/// Ordered name→value mapping of an instrumented call's bound arguments.
pub type Params = serde_json::Map<String, Value>;

/// Error indicator carried by events whose call returned an error.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// Short classification of the error (typically the error type name).
    pub error_type: String,
    /// Rendered error message, if available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorDetails {
    /// Create an error indicator with just a type name.
    #[must_use]
    pub fn new(error_type: impl Into<String>) -> Self {
        Self {
            error_type: error_type.into(),
            details: None,
        }
    }

    /// Attach the rendered error message.
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// One recorded action: a timed, immutable observation of a function call.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ActionEvent {
    /// Unique per event.
    pub id: EventId,
    /// Always [`ACTION_EVENT_TYPE`] on the wire.
    pub event_type: String,
    /// Logical name of the recorded action.
    pub action_type: String,
    /// Bound arguments, keyed by parameter name in declaration order.
    pub params: Params,
    /// The call's return value; absent if the call failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub returns: Option<Value>,
    /// Error indicator; present only if the call failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetails>,
    /// Wall-clock time immediately before the call.
    pub init_timestamp: DateTime<Utc>,
    /// Wall-clock time immediately after the call returned or failed.
    pub end_timestamp: DateTime<Utc>,
}

impl ActionEvent {
    /// Build an event for a call that returned normally.
    #[must_use]
    pub fn completed(
        action_type: impl Into<String>,
        params: Params,
        returns: Value,
        init_timestamp: DateTime<Utc>,
        end_timestamp: DateTime<Utc>,
    ) -> Self {
        Self::build(
            action_type,
            params,
            Some(returns),
            None,
            init_timestamp,
            end_timestamp,
        )
    }

    /// Build an event for a call that returned an error.
    #[must_use]
    pub fn failed(
        action_type: impl Into<String>,
        params: Params,
        error: ErrorDetails,
        init_timestamp: DateTime<Utc>,
        end_timestamp: DateTime<Utc>,
    ) -> Self {
        Self::build(
            action_type,
            params,
            None,
            Some(error),
            init_timestamp,
            end_timestamp,
        )
    }

    fn build(
        action_type: impl Into<String>,
        params: Params,
        returns: Option<Value>,
        error: Option<ErrorDetails>,
        init_timestamp: DateTime<Utc>,
        end_timestamp: DateTime<Utc>,
    ) -> Self {
        // The wall clock can step backwards between the two reads; the
        // record invariant is end >= init.
        let end_timestamp = end_timestamp.max(init_timestamp);
        Self {
            id: EventId::new(),
            event_type: ACTION_EVENT_TYPE.to_owned(),
            action_type: action_type.into(),
            params,
            returns,
            error,
            init_timestamp,
            end_timestamp,
        }
    }

    /// Elapsed wall time of the recorded call.
    #[must_use]
    pub fn elapsed(&self) -> chrono::TimeDelta {
        self.end_timestamp - self.init_timestamp
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params_xy() -> Params {
        let mut params = Params::new();
        let _ = params.insert("x".to_owned(), json!(3));
        let _ = params.insert("y".to_owned(), json!(4));
        params
    }

    // ── Construction ─────────────────────────────────────────────────

    #[test]
    fn completed_event_fields() {
        let now = Utc::now();
        let event = ActionEvent::completed("add_two", params_xy(), json!(7), now, now);

        assert_eq!(event.event_type, "actions");
        assert_eq!(event.action_type, "add_two");
        assert_eq!(event.returns, Some(json!(7)));
        assert!(event.error.is_none());
        assert!(!event.id.as_str().is_empty());
    }

    #[test]
    fn failed_event_fields() {
        let now = Utc::now();
        let error = ErrorDetails::new("DivisionByZero").with_details("denominator was 0");
        let event = ActionEvent::failed("divide", params_xy(), error, now, now);

        assert!(event.returns.is_none());
        let err = event.error.as_ref().unwrap();
        assert_eq!(err.error_type, "DivisionByZero");
        assert_eq!(err.details.as_deref(), Some("denominator was 0"));
    }

    #[test]
    fn event_ids_are_unique() {
        let now = Utc::now();
        let a = ActionEvent::completed("f", Params::new(), json!(1), now, now);
        let b = ActionEvent::completed("f", Params::new(), json!(1), now, now);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn end_timestamp_never_precedes_init() {
        let init = Utc::now();
        let earlier = init - chrono::TimeDelta::milliseconds(50);
        let event = ActionEvent::completed("f", Params::new(), json!(1), init, earlier);
        assert!(event.end_timestamp >= event.init_timestamp);
        assert_eq!(event.elapsed(), chrono::TimeDelta::zero());
    }

    #[test]
    fn elapsed_reflects_span() {
        let init = Utc::now();
        let end = init + chrono::TimeDelta::milliseconds(120);
        let event = ActionEvent::completed("f", Params::new(), json!(1), init, end);
        assert_eq!(event.elapsed(), chrono::TimeDelta::milliseconds(120));
    }

    // ── Wire format ──────────────────────────────────────────────────

    #[test]
    fn wire_field_names() {
        let now = Utc::now();
        let event = ActionEvent::completed("add_two", params_xy(), json!(7), now, now);
        let val = serde_json::to_value(&event).unwrap();

        assert!(val.get("id").is_some());
        assert_eq!(val["event_type"], "actions");
        assert_eq!(val["action_type"], "add_two");
        assert_eq!(val["params"], json!({"x": 3, "y": 4}));
        assert_eq!(val["returns"], 7);
        assert!(val.get("init_timestamp").is_some());
        assert!(val.get("end_timestamp").is_some());
        assert!(val.get("error").is_none(), "error omitted when absent");
    }

    #[test]
    fn wire_omits_returns_for_failed_calls() {
        let now = Utc::now();
        let event =
            ActionEvent::failed("f", Params::new(), ErrorDetails::new("Oops"), now, now);
        let val = serde_json::to_value(&event).unwrap();

        assert!(val.get("returns").is_none());
        assert_eq!(val["error"]["error_type"], "Oops");
        assert!(val["error"].get("details").is_none());
    }

    #[test]
    fn wire_timestamps_are_iso8601() {
        let now = Utc::now();
        let event = ActionEvent::completed("f", Params::new(), json!(1), now, now);
        let val = serde_json::to_value(&event).unwrap();

        let init = val["init_timestamp"].as_str().unwrap();
        let end = val["end_timestamp"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(init).is_ok(), "got: {init}");
        assert!(DateTime::parse_from_rfc3339(end).is_ok(), "got: {end}");
    }

    #[test]
    fn wire_params_preserve_declaration_order() {
        let mut params = Params::new();
        let _ = params.insert("zeta".to_owned(), json!(1));
        let _ = params.insert("alpha".to_owned(), json!(2));
        let _ = params.insert("mid".to_owned(), json!(3));

        let now = Utc::now();
        let event = ActionEvent::completed("f", params, json!(0), now, now);
        let json = serde_json::to_string(&event).unwrap();

        let zeta = json.find("\"zeta\"").unwrap();
        let alpha = json.find("\"alpha\"").unwrap();
        let mid = json.find("\"mid\"").unwrap();
        assert!(zeta < alpha && alpha < mid, "insertion order lost: {json}");
    }

    #[test]
    fn serde_roundtrip() {
        let now = Utc::now();
        let event = ActionEvent::completed("add_two", params_xy(), json!(7), now, now);
        let json = serde_json::to_string(&event).unwrap();
        let back: ActionEvent = serde_json::from_str(&json).unwrap();

        assert_eq!(back.id, event.id);
        assert_eq!(back.action_type, "add_two");
        assert_eq!(back.params, event.params);
        assert_eq!(back.returns, Some(json!(7)));
    }

    // ── ErrorDetails ─────────────────────────────────────────────────

    #[test]
    fn error_details_builder() {
        let err = ErrorDetails::new("Timeout").with_details("after 30s");
        assert_eq!(err.error_type, "Timeout");
        assert_eq!(err.details.as_deref(), Some("after 30s"));
    }
}
