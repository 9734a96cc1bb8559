//! Recorded callables.
//!
//! [`Recorder::wrap`] and [`Recorder::wrap_async`] turn a callable plus
//! its declared [`Signature`] into a wrapper that, on every invocation:
//!
//! 1. binds the arguments (defaults filled, `session` route stripped)
//! 2. brackets the call with wall-clock timestamps — for async callables
//!    the bracket spans the awaited completion, so suspension counts
//! 3. resolves the target session (explicit route, or the registry's
//!    implicit policy) — after the call, so timestamps are already fixed
//! 4. builds the [`ActionEvent`] and enqueues it, fire-and-forget
//!
//! A routing failure after a successful call discards the computed value
//! and surfaces the error; a routing failure after a failed call is only
//! logged, because the callable's own error always comes back unchanged.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use oplink_events::{ActionEvent, ErrorDetails, Params};
use oplink_session::{Session, SessionRegistry};

use crate::args::CallArgs;
use crate::errors::RecordError;
use crate::signature::Signature;

/// Factory for recorded callables, bound to one session registry.
#[derive(Clone)]
pub struct Recorder {
    registry: Arc<SessionRegistry>,
}

impl Recorder {
    /// Create a recorder routing through the given registry.
    #[must_use]
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }

    /// The registry this recorder resolves sessions against.
    #[must_use]
    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Wrap a synchronous callable.
    ///
    /// The callable receives the bound parameter map and returns
    /// `Result<T, E>`; its `action_type` defaults to the signature's name.
    pub fn wrap<F>(&self, signature: Signature, inner: F) -> Recorded<F> {
        Recorded {
            registry: self.registry.clone(),
            signature,
            action_type: None,
            inner,
        }
    }

    /// Wrap an asynchronous callable.
    pub fn wrap_async<F>(&self, signature: Signature, inner: F) -> RecordedAsync<F> {
        RecordedAsync {
            registry: self.registry.clone(),
            signature,
            action_type: None,
            inner,
        }
    }
}

/// A wrapped synchronous callable.
pub struct Recorded<F> {
    registry: Arc<SessionRegistry>,
    signature: Signature,
    action_type: Option<String>,
    inner: F,
}

impl<F> Recorded<F> {
    /// Override the recorded `action_type` (otherwise the signature name).
    #[must_use]
    pub fn with_action_type(mut self, action_type: impl Into<String>) -> Self {
        self.action_type = Some(action_type.into());
        self
    }

    fn action_type(&self) -> &str {
        self.action_type.as_deref().unwrap_or(self.signature.name())
    }
}

impl<F, T, E> Recorded<F>
where
    F: Fn(&Params) -> Result<T, E>,
    T: Serialize,
    E: std::error::Error,
{
    /// Invoke the wrapped callable, recording the call as an action event.
    pub fn call(&self, args: CallArgs) -> Result<T, RecordError<E>> {
        let explicit = args.session_route().cloned();
        let params = self.signature.bind(&args)?;

        let init = Utc::now();
        let outcome = (self.inner)(&params);
        let end = Utc::now();

        record_outcome(
            &self.registry,
            self.action_type(),
            params,
            outcome,
            init,
            end,
            explicit.as_ref(),
        )
    }
}

/// A wrapped asynchronous callable.
pub struct RecordedAsync<F> {
    registry: Arc<SessionRegistry>,
    signature: Signature,
    action_type: Option<String>,
    inner: F,
}

impl<F> RecordedAsync<F> {
    /// Override the recorded `action_type` (otherwise the signature name).
    #[must_use]
    pub fn with_action_type(mut self, action_type: impl Into<String>) -> Self {
        self.action_type = Some(action_type.into());
        self
    }

    fn action_type(&self) -> &str {
        self.action_type.as_deref().unwrap_or(self.signature.name())
    }
}

impl<F, Fut, T, E> RecordedAsync<F>
where
    F: Fn(Params) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    T: Serialize,
    E: std::error::Error,
{
    /// Invoke the wrapped callable, awaiting its completion and recording
    /// the call as an action event. The timestamps bracket the await, so
    /// elapsed wall time includes any suspension.
    pub async fn call(&self, args: CallArgs) -> Result<T, RecordError<E>> {
        let explicit = args.session_route().cloned();
        let params = self.signature.bind(&args)?;

        let init = Utc::now();
        let outcome = (self.inner)(params.clone()).await;
        let end = Utc::now();

        record_outcome(
            &self.registry,
            self.action_type(),
            params,
            outcome,
            init,
            end,
            explicit.as_ref(),
        )
    }
}

/// Build the event for a finished call, resolve its session, and enqueue.
fn record_outcome<T, E>(
    registry: &SessionRegistry,
    action_type: &str,
    params: Params,
    outcome: Result<T, E>,
    init: DateTime<Utc>,
    end: DateTime<Utc>,
    explicit: Option<&Arc<Session>>,
) -> Result<T, RecordError<E>>
where
    T: Serialize,
    E: std::error::Error,
{
    match outcome {
        Ok(value) => {
            let returns = to_return_value(&value);
            let event = ActionEvent::completed(action_type, params, returns, init, end);
            route_and_enqueue(registry, explicit, event)?;
            Ok(value)
        }
        Err(error) => {
            let details = ErrorDetails::new(short_type_name::<E>()).with_details(error.to_string());
            let event = ActionEvent::failed(action_type, params, details, init, end);
            // The callable's error wins over a routing failure here.
            if let Err(routing) = route_and_enqueue(registry, explicit, event) {
                warn!(
                    action_type,
                    error = %routing,
                    "failure event dropped: could not resolve a session"
                );
            }
            Err(RecordError::Callable(error))
        }
    }
}

fn route_and_enqueue(
    registry: &SessionRegistry,
    explicit: Option<&Arc<Session>>,
    event: ActionEvent,
) -> Result<(), oplink_core::RoutingError> {
    let session = registry.resolve(explicit)?;
    session.enqueue(event)
}

fn to_return_value<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|e| {
        warn!(error = %e, "return value not serializable; recording null");
        Value::Null
    })
}

/// Last path segment of a type name, without generic arguments.
fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let without_generics = full.split('<').next().unwrap_or(full);
    without_generics
        .rsplit("::")
        .next()
        .unwrap_or(without_generics)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(unused_results)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use oplink_client::ApiClient;
    use oplink_config::Config;
    use oplink_core::RoutingError;
    use oplink_session::LogObserver;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug, thiserror::Error)]
    #[error("division by zero")]
    struct DivisionByZero;

    async fn mock_collector() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/create_session"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"jwt": "j"})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        server
    }

    async fn start_session(
        server: &MockServer,
        registry: &Arc<SessionRegistry>,
    ) -> Arc<Session> {
        let config = Config {
            api_key: "k".to_owned(),
            endpoint: server.uri(),
            // Only forced flushes deliver, so tests control batching.
            flush_interval_ms: 60_000,
            ..Config::default()
        };
        let api = ApiClient::new(server.uri(), "k");
        Session::start(api, &config, registry, Vec::new(), Arc::new(LogObserver))
            .await
            .unwrap()
    }

    /// End the session and return every event the collector received.
    async fn delivered_events(server: &MockServer, session: &Arc<Session>) -> Vec<Value> {
        session.end("Success", None).await.unwrap();
        server
            .received_requests()
            .await
            .unwrap()
            .into_iter()
            .filter(|r| r.url.path() == "/v2/create_events")
            .flat_map(|r| {
                let body: Value = serde_json::from_slice(&r.body).unwrap();
                body["events"].as_array().unwrap().clone()
            })
            .collect()
    }

    fn add_two(recorder: &Recorder) -> Recorded<impl Fn(&Params) -> Result<i64, DivisionByZero>> {
        recorder.wrap(
            Signature::new("add_two").param("x").param("y"),
            |params: &Params| {
                Ok::<i64, DivisionByZero>(
                    params["x"].as_i64().unwrap() + params["y"].as_i64().unwrap(),
                )
            },
        )
    }

    // ── Sync recording ───────────────────────────────────────────────

    #[tokio::test]
    async fn records_completed_call() {
        let server = mock_collector().await;
        let registry = Arc::new(SessionRegistry::new());
        let session = start_session(&server, &registry).await;

        let recorder = Recorder::new(registry);
        let add = add_two(&recorder);

        let result = add.call(CallArgs::new().arg(3).arg(4)).unwrap();
        assert_eq!(result, 7);

        let events = delivered_events(&server, &session).await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["action_type"], "add_two");
        assert_eq!(events[0]["params"], json!({"x": 3, "y": 4}));
        assert_eq!(events[0]["returns"], 7);
        assert!(events[0].get("error").is_none());
    }

    #[tokio::test]
    async fn explicit_action_type_wins() {
        let server = mock_collector().await;
        let registry = Arc::new(SessionRegistry::new());
        let session = start_session(&server, &registry).await;

        let recorder = Recorder::new(registry);
        let add = add_two(&recorder).with_action_type("arithmetic");

        add.call(CallArgs::new().arg(1).arg(2)).unwrap();

        let events = delivered_events(&server, &session).await;
        assert_eq!(events[0]["action_type"], "arithmetic");
    }

    #[tokio::test]
    async fn defaulted_parameters_are_recorded() {
        let server = mock_collector().await;
        let registry = Arc::new(SessionRegistry::new());
        let session = start_session(&server, &registry).await;

        let recorder = Recorder::new(registry);
        let add_three = recorder.wrap(
            Signature::new("add_three")
                .param("x")
                .param("y")
                .param_with_default("z", 3),
            |params: &Params| -> Result<i64, DivisionByZero> {
                Ok(params["x"].as_i64().unwrap()
                    + params["y"].as_i64().unwrap()
                    + params["z"].as_i64().unwrap())
            },
        );

        assert_eq!(add_three.call(CallArgs::new().arg(1).arg(2)).unwrap(), 6);
        assert_eq!(
            add_three.call(CallArgs::new().arg(1).arg(2).arg(4)).unwrap(),
            7
        );

        let events = delivered_events(&server, &session).await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0]["params"], json!({"x": 1, "y": 2, "z": 3}));
        assert_eq!(events[0]["returns"], 6);
        assert_eq!(events[1]["params"], json!({"x": 1, "y": 2, "z": 4}));
        assert_eq!(events[1]["returns"], 7);
    }

    #[tokio::test]
    async fn sync_timestamps_bracket_the_call() {
        let server = mock_collector().await;
        let registry = Arc::new(SessionRegistry::new());
        let session = start_session(&server, &registry).await;

        let recorder = Recorder::new(registry);
        let slow = recorder.wrap(
            Signature::new("slow"),
            |_: &Params| -> Result<i64, DivisionByZero> {
                std::thread::sleep(Duration::from_millis(30));
                Ok(1)
            },
        );

        slow.call(CallArgs::new()).unwrap();

        let events = delivered_events(&server, &session).await;
        let init: DateTime<Utc> = events[0]["init_timestamp"]
            .as_str()
            .unwrap()
            .parse()
            .unwrap();
        let end: DateTime<Utc> = events[0]["end_timestamp"]
            .as_str()
            .unwrap()
            .parse()
            .unwrap();
        assert!(end - init >= chrono::TimeDelta::milliseconds(30));
    }

    // ── Error transparency ───────────────────────────────────────────

    #[tokio::test]
    async fn callable_error_is_reraised_and_recorded() {
        let server = mock_collector().await;
        let registry = Arc::new(SessionRegistry::new());
        let session = start_session(&server, &registry).await;

        let recorder = Recorder::new(registry);
        let divide = recorder.wrap(
            Signature::new("divide").param("n").param("d"),
            |params: &Params| -> Result<i64, DivisionByZero> {
                let d = params["d"].as_i64().unwrap();
                if d == 0 {
                    return Err(DivisionByZero);
                }
                Ok(params["n"].as_i64().unwrap() / d)
            },
        );

        let result = divide.call(CallArgs::new().arg(6).arg(0));
        assert_matches!(result, Err(RecordError::Callable(DivisionByZero)));

        let events = delivered_events(&server, &session).await;
        assert_eq!(events.len(), 1, "failed calls are still recorded");
        assert!(events[0].get("returns").is_none());
        assert_eq!(events[0]["error"]["error_type"], "DivisionByZero");
        assert_eq!(events[0]["error"]["details"], "division by zero");
    }

    #[tokio::test]
    async fn callable_error_wins_over_routing_failure() {
        // No session at all: the error path must still return the
        // callable's own error, not a routing error.
        let registry = Arc::new(SessionRegistry::new());
        let recorder = Recorder::new(registry);
        let divide = recorder.wrap(
            Signature::new("divide"),
            |_: &Params| -> Result<i64, DivisionByZero> { Err(DivisionByZero) },
        );

        let result = divide.call(CallArgs::new());
        assert_matches!(result, Err(RecordError::Callable(DivisionByZero)));
    }

    // ── Routing ──────────────────────────────────────────────────────

    #[tokio::test]
    async fn no_active_session_fails_after_execution() {
        let registry = Arc::new(SessionRegistry::new());
        let recorder = Recorder::new(registry);

        let ran = Arc::new(AtomicBool::new(false));
        let ran_flag = ran.clone();
        let noop = recorder.wrap(
            Signature::new("noop"),
            move |_: &Params| -> Result<i64, DivisionByZero> {
                ran_flag.store(true, Ordering::SeqCst);
                Ok(0)
            },
        );

        let result = noop.call(CallArgs::new());
        assert_matches!(
            result,
            Err(RecordError::Routing(RoutingError::NoActiveSession))
        );
        assert!(
            ran.load(Ordering::SeqCst),
            "resolution happens after the call completes"
        );
    }

    #[tokio::test]
    async fn two_sessions_without_route_is_ambiguous_and_enqueues_nothing() {
        let server = mock_collector().await;
        let registry = Arc::new(SessionRegistry::new());
        let s1 = start_session(&server, &registry).await;
        let s2 = start_session(&server, &registry).await;

        let recorder = Recorder::new(registry);
        let add = add_two(&recorder);

        let result = add.call(CallArgs::new().arg(1).arg(2));
        assert_matches!(
            result,
            Err(RecordError::Routing(RoutingError::AmbiguousSession { active: 2 }))
        );
        assert_eq!(s1.pending_events(), 0);
        assert_eq!(s2.pending_events(), 0);

        s1.end("Success", None).await.unwrap();
        s2.end("Success", None).await.unwrap();
    }

    #[tokio::test]
    async fn explicit_route_targets_the_right_session() {
        let server = mock_collector().await;
        let registry = Arc::new(SessionRegistry::new());
        let s1 = start_session(&server, &registry).await;
        let s2 = start_session(&server, &registry).await;

        let recorder = Recorder::new(registry);
        let add = add_two(&recorder);

        add.call(CallArgs::new().arg(1).arg(2).session(&s1)).unwrap();
        assert_eq!(s1.pending_events(), 1);
        assert_eq!(s2.pending_events(), 0);

        add.call(CallArgs::new().arg(3).arg(4).session(&s2)).unwrap();
        assert_eq!(s2.pending_events(), 1);

        s1.end("Success", None).await.unwrap();
        s2.end("Success", None).await.unwrap();
    }

    #[tokio::test]
    async fn single_session_routes_implicitly() {
        let server = mock_collector().await;
        let registry = Arc::new(SessionRegistry::new());
        let session = start_session(&server, &registry).await;

        let recorder = Recorder::new(registry);
        let add = add_two(&recorder);

        add.call(CallArgs::new().arg(1).arg(2)).unwrap();
        assert_eq!(session.pending_events(), 1);

        session.end("Success", None).await.unwrap();
    }

    #[tokio::test]
    async fn bind_error_prevents_invocation() {
        let registry = Arc::new(SessionRegistry::new());
        let recorder = Recorder::new(registry);

        let ran = Arc::new(AtomicBool::new(false));
        let ran_flag = ran.clone();
        let noop = recorder.wrap(
            Signature::new("noop").param("x"),
            move |_: &Params| -> Result<i64, DivisionByZero> {
                ran_flag.store(true, Ordering::SeqCst);
                Ok(0)
            },
        );

        let result = noop.call(CallArgs::new().kwarg("wrong", 1));
        assert_matches!(result, Err(RecordError::Bind(_)));
        assert!(!ran.load(Ordering::SeqCst), "callable must not run");
    }

    // ── Async recording ──────────────────────────────────────────────

    #[tokio::test]
    async fn async_call_records_and_times_suspension() {
        let server = mock_collector().await;
        let registry = Arc::new(SessionRegistry::new());
        let session = start_session(&server, &registry).await;

        let recorder = Recorder::new(registry);
        let async_add = recorder.wrap_async(
            Signature::new("async_add").param("x").param("y"),
            |params: Params| async move {
                tokio::time::sleep(Duration::from_millis(40)).await;
                Ok::<_, DivisionByZero>(
                    params["x"].as_i64().unwrap() + params["y"].as_i64().unwrap(),
                )
            },
        );

        let result = async_add.call(CallArgs::new().arg(3).arg(4)).await.unwrap();
        assert_eq!(result, 7);

        let events = delivered_events(&server, &session).await;
        assert_eq!(events[0]["action_type"], "async_add");
        assert_eq!(events[0]["params"], json!({"x": 3, "y": 4}));
        assert_eq!(events[0]["returns"], 7);

        let init: DateTime<Utc> = events[0]["init_timestamp"]
            .as_str()
            .unwrap()
            .parse()
            .unwrap();
        let end: DateTime<Utc> = events[0]["end_timestamp"]
            .as_str()
            .unwrap()
            .parse()
            .unwrap();
        assert!(
            end - init >= chrono::TimeDelta::milliseconds(40),
            "suspension while awaiting must count"
        );
    }

    #[tokio::test]
    async fn async_explicit_route() {
        let server = mock_collector().await;
        let registry = Arc::new(SessionRegistry::new());
        let s1 = start_session(&server, &registry).await;
        let s2 = start_session(&server, &registry).await;

        let recorder = Recorder::new(registry);
        let ping = recorder.wrap_async(Signature::new("ping"), |_: Params| async move {
            Ok::<_, DivisionByZero>("pong")
        });

        ping.call(CallArgs::new().session(&s2)).await.unwrap();
        assert_eq!(s1.pending_events(), 0);
        assert_eq!(s2.pending_events(), 1);

        s1.end("Success", None).await.unwrap();
        s2.end("Success", None).await.unwrap();
    }

    #[tokio::test]
    async fn async_error_is_transparent() {
        let registry = Arc::new(SessionRegistry::new());
        let recorder = Recorder::new(registry);
        let boom = recorder.wrap_async(Signature::new("boom"), |_: Params| async move {
            Err::<i64, _>(DivisionByZero)
        });

        let result = boom.call(CallArgs::new()).await;
        assert_matches!(result, Err(RecordError::Callable(DivisionByZero)));
    }

    // ── Return value serialization ───────────────────────────────────

    #[tokio::test]
    async fn structured_return_values_serialize() {
        let server = mock_collector().await;
        let registry = Arc::new(SessionRegistry::new());
        let session = start_session(&server, &registry).await;

        #[derive(Serialize)]
        struct Outcome {
            total: i64,
            notes: Vec<String>,
        }

        let recorder = Recorder::new(registry);
        let summarize = recorder.wrap(
            Signature::new("summarize"),
            |_: &Params| -> Result<Outcome, DivisionByZero> {
                Ok(Outcome {
                    total: 5,
                    notes: vec!["ok".to_owned()],
                })
            },
        );

        summarize.call(CallArgs::new()).unwrap();

        let events = delivered_events(&server, &session).await;
        assert_eq!(events[0]["returns"], json!({"total": 5, "notes": ["ok"]}));
    }

    // ── short_type_name ──────────────────────────────────────────────

    #[test]
    fn short_type_name_strips_path_and_generics() {
        assert_eq!(short_type_name::<DivisionByZero>(), "DivisionByZero");
        assert_eq!(short_type_name::<std::io::Error>(), "Error");
        assert_eq!(short_type_name::<Vec<u8>>(), "Vec");
    }
}
