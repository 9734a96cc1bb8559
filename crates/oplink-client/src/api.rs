//! Collector v2 API client.
//!
//! One [`ApiClient`] is shared by every session of a client process. All
//! requests carry the `X-Agentops-Api-Key` header; event delivery and
//! session end additionally carry the session's bearer token obtained
//! from the [`create_session`](ApiClient::create_session) handshake.

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{debug, instrument};

use oplink_core::SessionId;
use oplink_core::retry::parse_retry_after;
use oplink_events::ActionEvent;

use crate::errors::ApiError;

/// API key header name expected by the collector.
pub const API_KEY_HEADER: &str = "X-Agentops-Api-Key";

/// Session registration response.
#[derive(serde::Deserialize)]
struct JwtResponse {
    jwt: String,
}

/// HTTP client for the collector's v2 API.
///
/// Cheap to clone; the underlying `reqwest::Client` pools connections.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl ApiClient {
    /// Create a client for the given collector endpoint and API key.
    #[must_use]
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        let mut endpoint = endpoint.into();
        while endpoint.ends_with('/') {
            let _ = endpoint.pop();
        }
        Self {
            http: reqwest::Client::new(),
            endpoint,
            api_key: api_key.into(),
        }
    }

    /// Collector endpoint this client talks to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Register a session and obtain its bearer token.
    #[instrument(skip_all, fields(session_id = %session_id))]
    pub async fn create_session(
        &self,
        session_id: &SessionId,
        init_timestamp: DateTime<Utc>,
        tags: &[String],
    ) -> Result<String, ApiError> {
        let body = json!({
            "session": {
                "session_id": session_id,
                "init_timestamp": init_timestamp,
                "tags": tags,
            }
        });

        let resp = self
            .http
            .post(format!("{}/v2/create_session", self.endpoint))
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await?;

        let resp = check(resp).await?;
        let data: JwtResponse = resp.json().await?;
        debug!("session registered");
        Ok(data.jwt)
    }

    /// Obtain a fresh bearer token for an already-registered session.
    #[instrument(skip_all, fields(session_id = %session_id))]
    pub async fn reauthorize_jwt(&self, session_id: &SessionId) -> Result<String, ApiError> {
        let body = json!({ "session_id": session_id });

        let resp = self
            .http
            .post(format!("{}/v2/reauthorize_jwt", self.endpoint))
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await?;

        let resp = check(resp).await?;
        let data: JwtResponse = resp.json().await?;
        debug!("session token refreshed");
        Ok(data.jwt)
    }

    /// Deliver one ordered batch of events for a session.
    #[instrument(skip_all, fields(batch_len = events.len()))]
    pub async fn create_events(&self, jwt: &str, events: &[ActionEvent]) -> Result<(), ApiError> {
        let body = json!({ "events": events });

        let resp = self
            .http
            .post(format!("{}/v2/create_events", self.endpoint))
            .header(API_KEY_HEADER, &self.api_key)
            .bearer_auth(jwt)
            .json(&body)
            .send()
            .await?;

        let _ = check(resp).await?;
        Ok(())
    }

    /// Notify the collector that a session ended.
    #[instrument(skip_all, fields(session_id = %session_id, end_state))]
    pub async fn update_session(
        &self,
        jwt: &str,
        session_id: &SessionId,
        end_timestamp: DateTime<Utc>,
        end_state: &str,
        end_state_reason: Option<&str>,
    ) -> Result<(), ApiError> {
        let body = json!({
            "session": {
                "session_id": session_id,
                "end_timestamp": end_timestamp,
                "end_state": end_state,
                "end_state_reason": end_state_reason,
            }
        });

        let resp = self
            .http
            .post(format!("{}/v2/update_session", self.endpoint))
            .header(API_KEY_HEADER, &self.api_key)
            .bearer_auth(jwt)
            .json(&body)
            .send()
            .await?;

        let _ = check(resp).await?;
        Ok(())
    }
}

/// Map a non-success response to [`ApiError::Api`], capturing any
/// `Retry-After` hint before consuming the body.
async fn check(resp: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let retry_after_ms = resp
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_retry_after);
    let message = resp.text().await.unwrap_or_default();

    Err(ApiError::Api {
        status: status.as_u16(),
        message,
        retry_after_ms,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
