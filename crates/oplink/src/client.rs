//! Client facade.
//!
//! A [`Client`] is the process-level entry point: it validates the
//! configuration, owns the collector [`ApiClient`] and the
//! [`SessionRegistry`], and hands out [`Recorder`]s bound to that
//! registry. The registry is an owned object rather than hidden global
//! state, so several clients (and tests) can coexist with fully isolated
//! sessions.

use std::sync::Arc;

use tracing::{debug, instrument};

use oplink_client::ApiClient;
use oplink_config::Config;
use oplink_record::Recorder;
use oplink_session::{ErrorObserver, LogObserver, Session, SessionRegistry};

use crate::errors::ClientError;

/// Process-level telemetry client.
pub struct Client {
    config: Config,
    api: ApiClient,
    registry: Arc<SessionRegistry>,
    observer: Arc<dyn ErrorObserver>,
}

impl Client {
    /// Initialize a client, honoring `auto_start_session`.
    ///
    /// Terminal delivery failures are logged via the default
    /// [`LogObserver`]; use [`init_with_observer`](Self::init_with_observer)
    /// to capture them instead.
    pub async fn init(config: Config) -> Result<Self, ClientError> {
        Self::init_with_observer(config, Arc::new(LogObserver)).await
    }

    /// Initialize a client with a custom delivery failure observer.
    #[instrument(skip_all, fields(endpoint = %config.endpoint))]
    pub async fn init_with_observer(
        config: Config,
        observer: Arc<dyn ErrorObserver>,
    ) -> Result<Self, ClientError> {
        config.validate()?;

        let api = ApiClient::new(config.endpoint.clone(), config.api_key.clone());
        let client = Self {
            api,
            registry: Arc::new(SessionRegistry::new()),
            observer,
            config,
        };

        if client.config.auto_start_session {
            let _ = client.start_session(Vec::new()).await?;
        }

        debug!("client initialized");
        Ok(client)
    }

    /// The session registry this client routes through.
    #[must_use]
    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// The configuration this client was initialized with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// A recorder bound to this client's registry.
    #[must_use]
    pub fn recorder(&self) -> Recorder {
        Recorder::new(self.registry.clone())
    }

    /// Start a new tracking session.
    ///
    /// `tags` are appended to the configured `default_tags` and sent with
    /// the registration handshake.
    pub async fn start_session(&self, tags: Vec<String>) -> Result<Arc<Session>, ClientError> {
        let mut all_tags = self.config.default_tags.clone();
        all_tags.extend(tags);

        let session = Session::start(
            self.api.clone(),
            &self.config,
            &self.registry,
            all_tags,
            self.observer.clone(),
        )
        .await?;
        Ok(session)
    }

    /// End the sole active session.
    ///
    /// Fails with a routing error when zero or several sessions are
    /// active — with several, end the session handles directly.
    pub async fn end_session(
        &self,
        end_state: &str,
        end_state_reason: Option<&str>,
    ) -> Result<(), ClientError> {
        let session = self.registry.resolve(None)?;
        session.end(end_state, end_state_reason).await?;
        Ok(())
    }

    /// End every active session with the same end state.
    pub async fn end_all_sessions(&self, end_state: &str) -> Result<(), ClientError> {
        for session in self.registry.active_sessions() {
            // A session ended concurrently is fine; skip it.
            if let Err(e) = session.end(end_state, None).await {
                debug!(session_id = %session.id(), error = %e, "session already ending");
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("endpoint", &self.config.endpoint)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
