//! # Authenticated API Client
//!
//! Single entry point for every call to the REST backend.
//!
//! - Attaches `Authorization: Bearer <token>` from the [`SessionStore`]
//! - Without a token, nothing is sent: the client emits
//!   [`AuthEvent::ReauthenticationRequired`] and returns
//!   [`ApiError::Unauthenticated`]
//! - A 401 clears the stored session, whatever the endpoint, then behaves like
//!   the missing-token case
//! - Any other non-2xx becomes [`ApiError::Application`] with the server's
//!   message (`error`, then `details`, then `message`)
//! - Failures below HTTP become [`ApiError::Transport`]
//!
//! There are no retries.

use crate::error::ApiError;
use crate::session_store::SessionStore;
use bridge_traits::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use core_runtime::config::CoreConfig;
use core_runtime::events::{AuthEvent, CoreEvent, EventBus};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Clone)]
pub struct ApiClient {
    http: Arc<dyn HttpClient>,
    sessions: SessionStore,
    event_bus: EventBus,
    base_url: String,
    timeout: Option<Duration>,
}

impl ApiClient {
    pub fn new(
        http: Arc<dyn HttpClient>,
        sessions: SessionStore,
        event_bus: EventBus,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            http,
            sessions,
            event_bus,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: None,
        }
    }

    /// Client wired from a validated configuration.
    pub fn from_config(config: &CoreConfig, event_bus: EventBus) -> Self {
        Self::new(
            Arc::clone(&config.http_client),
            SessionStore::new(Arc::clone(&config.secure_store)),
            event_bus,
            config.api_base_url.clone(),
        )
        .with_timeout(config.request_timeout)
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    fn build(&self, method: HttpMethod, path: &str, body: Option<&Value>) -> ApiResult<HttpRequest> {
        let mut request =
            HttpRequest::new(method, self.url(path)).header("Accept", "application/json");

        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        match body {
            Some(body) => request
                .json(body)
                .map_err(|e| ApiError::Decode(format!("request body: {}", e))),
            None => Ok(request),
        }
    }

    /// Authenticated request. Returns the response only when it is 2xx.
    pub async fn request(
        &self,
        path: &str,
        method: HttpMethod,
        body: Option<Value>,
    ) -> ApiResult<HttpResponse> {
        let token = match self.sessions.token().await {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Session storage unreadable, treating as signed out");
                None
            }
        };

        let Some(token) = token else {
            debug!(%method, path, "No token stored, request not sent");
            self.signal_reauthentication("missing token");
            return Err(ApiError::Unauthenticated);
        };

        let request = self
            .build(method, path, body.as_ref())?
            .bearer_token(token.as_str());

        let response = self.execute(request).await?;

        if response.is_unauthorized() {
            let message = error_message(&response);
            warn!(%method, path, "Token rejected by server, clearing session");
            if let Err(e) = self.sessions.clear().await {
                warn!(error = %e, "Failed to clear rejected session");
            }
            self.signal_reauthentication(&message);
            return Err(ApiError::Unauthenticated);
        }

        check_status(response)
    }

    /// Request that never carries a token (`/login`, `/signup`). A 401 here is
    /// an application error such as bad credentials.
    pub async fn request_public(
        &self,
        path: &str,
        method: HttpMethod,
        body: Option<Value>,
    ) -> ApiResult<HttpResponse> {
        let request = self.build(method, path, body.as_ref())?;
        let response = self.execute(request).await?;
        check_status(response)
    }

    /// `GET` a JSON document.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let response = self.request(path, HttpMethod::Get, None).await?;
        decode(&response)
    }

    /// Send a serializable body with an authenticated request.
    pub async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        path: &str,
        body: &B,
    ) -> ApiResult<HttpResponse> {
        let body = to_value(body)?;
        self.request(path, method, Some(body)).await
    }

    /// Send a serializable body without a token and decode the answer.
    pub async fn send_public<B, T>(&self, method: HttpMethod, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = to_value(body)?;
        let response = self.request_public(path, method, Some(body)).await?;
        decode(&response)
    }

    async fn execute(&self, request: HttpRequest) -> ApiResult<HttpResponse> {
        let method = request.method;
        let url = request.url.clone();

        self.http.execute(request).await.map_err(|e| {
            warn!(%method, url = %url, error = %e, "Request failed before a response arrived");
            ApiError::Transport(e.to_string())
        })
    }

    fn signal_reauthentication(&self, reason: &str) {
        self.event_bus
            .emit(CoreEvent::Auth(AuthEvent::ReauthenticationRequired {
                reason: reason.to_string(),
            }))
            .ok();
    }
}

fn to_value<B: Serialize + ?Sized>(body: &B) -> ApiResult<Value> {
    serde_json::to_value(body).map_err(|e| ApiError::Decode(format!("request body: {}", e)))
}

/// Decode a 2xx body.
pub fn decode<T: DeserializeOwned>(response: &HttpResponse) -> ApiResult<T> {
    serde_json::from_slice(&response.body).map_err(|e| ApiError::Decode(e.to_string()))
}

fn check_status(response: HttpResponse) -> ApiResult<HttpResponse> {
    if response.is_success() {
        return Ok(response);
    }

    let message = error_message(&response);
    debug!(status = response.status, reason = %message, "Server returned an error");
    Err(ApiError::Application {
        status: response.status,
        message,
    })
}

/// Message carried by an error payload, or a generic one naming the status.
pub fn error_message(response: &HttpResponse) -> String {
    serde_json::from_slice::<Value>(&response.body)
        .ok()
        .and_then(|payload| {
            ["error", "details", "message"].iter().find_map(|field| {
                payload
                    .get(field)
                    .and_then(Value::as_str)
                    .filter(|s| !s.trim().is_empty())
                    .map(str::to_string)
            })
        })
        .unwrap_or_else(|| format!("Request failed with status {}", response.status))
}

/// The `message` field of a 2xx acknowledgement, if present.
pub fn ack_message(response: &HttpResponse) -> Option<String> {
    serde_json::from_slice::<Value>(&response.body)
        .ok()?
        .get("message")?
        .as_str()
        .map(str::to_string)
}
