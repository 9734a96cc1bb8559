//! Per-invocation argument bundles.
//!
//! [`CallArgs`] carries the values for one invocation of a recorded
//! callable: positional values, keyword values, and the optional typed
//! `session` route. The route is the Rust rendering of the reserved
//! `session` keyword — it never reaches the callable's parameters.

use std::sync::Arc;

use serde_json::Value;

use oplink_session::Session;

/// Arguments for one invocation of a recorded callable.
#[derive(Clone, Default)]
pub struct CallArgs {
    positional: Vec<Value>,
    keyword: Vec<(String, Value)>,
    session: Option<Arc<Session>>,
}

impl CallArgs {
    /// Empty argument bundle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional value.
    #[must_use]
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Append a keyword value.
    #[must_use]
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.keyword.push((name.into(), value.into()));
        self
    }

    /// Route the recorded event to an explicit session.
    ///
    /// Required whenever more than one session is active; stripped before
    /// the callable runs.
    #[must_use]
    pub fn session(mut self, session: &Arc<Session>) -> Self {
        self.session = Some(session.clone());
        self
    }

    /// Positional values, in order.
    #[must_use]
    pub fn positional(&self) -> &[Value] {
        &self.positional
    }

    /// Keyword values, in the order given.
    #[must_use]
    pub fn keyword(&self) -> &[(String, Value)] {
        &self.keyword
    }

    /// The explicit session route, if any.
    #[must_use]
    pub fn session_route(&self) -> Option<&Arc<Session>> {
        self.session.as_ref()
    }
}

impl std::fmt::Debug for CallArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallArgs")
            .field("positional", &self.positional)
            .field("keyword", &self.keyword)
            .field("session", &self.session.as_ref().map(|s| s.id().clone()))
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builder_collects_in_order() {
        let args = CallArgs::new().arg(1).arg("two").kwarg("z", json!([3]));
        assert_eq!(args.positional(), &[json!(1), json!("two")]);
        assert_eq!(args.keyword(), &[("z".to_owned(), json!([3]))]);
        assert!(args.session_route().is_none());
    }

    #[test]
    fn empty_args() {
        let args = CallArgs::new();
        assert!(args.positional().is_empty());
        assert!(args.keyword().is_empty());
    }

    #[test]
    fn debug_omits_buffer_internals() {
        let args = CallArgs::new().arg(1);
        let rendered = format!("{args:?}");
        assert!(rendered.contains("positional"));
    }
}
