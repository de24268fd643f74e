//! # Core Configuration Module
//!
//! Provides configuration management for the library dashboard core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance that holds all necessary dependencies and settings for the core.
//! It enforces fail-fast validation so a misconfigured client never issues a
//! request.
//!
//! ## Dependencies
//!
//! - `HttpClient` - Required for talking to the backend (desktop default: reqwest)
//! - `SecureStore` - Required for the session token (desktop default: keyring
//!   with the `secure-store` feature, process memory otherwise)
//!
//! When the `desktop-shims` feature is enabled, desktop-ready defaults are
//! injected automatically if not provided.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::time::Duration;
//!
//! let config = CoreConfig::builder()
//!     .api_base_url("http://127.0.0.1:5000")
//!     .request_timeout(Duration::from_secs(15))
//!     .build()?;
//! ```
//!
//! ## Environment
//!
//! [`CoreConfigBuilder::from_env`] seeds the builder from `LIBDASH_API_URL`
//! and `LIBDASH_TIMEOUT_SECS`.

use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;
use bridge_traits::{HttpClient, SecureStore};
use std::sync::Arc;
use std::time::Duration;

/// Backend address used when nothing else is configured.
pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:5000";

/// Environment variable overriding the backend address.
pub const ENV_API_URL: &str = "LIBDASH_API_URL";

/// Environment variable setting the per-request timeout in seconds.
pub const ENV_TIMEOUT_SECS: &str = "LIBDASH_TIMEOUT_SECS";

/// Core configuration for the dashboard client.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Backend base URL without a trailing slash
    pub api_base_url: String,

    /// Per-request timeout. `None` lets a request wait indefinitely.
    pub request_timeout: Option<Duration>,

    /// Capacity of the event bus channel
    pub event_buffer_size: usize,

    /// HTTP client for making API requests
    pub http_client: Arc<dyn HttpClient>,

    /// Session token and profile storage
    pub secure_store: Arc<dyn SecureStore>,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("api_base_url", &self.api_base_url)
            .field("request_timeout", &self.request_timeout)
            .field("event_buffer_size", &self.event_buffer_size)
            .field("http_client", &"HttpClient { ... }")
            .field("secure_store", &"SecureStore { ... }")
            .finish()
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - The base URL is an `http://` or `https://` URL
    /// - The timeout, when set, is non-zero and at most ten minutes
    /// - The event buffer can hold at least one event
    pub fn validate(&self) -> Result<()> {
        validate_base_url(&self.api_base_url)?;

        if let Some(timeout) = self.request_timeout {
            if timeout.is_zero() {
                return Err(Error::Config(
                    "Request timeout must be greater than zero".to_string(),
                ));
            }
            if timeout > Duration::from_secs(600) {
                return Err(Error::Config(
                    "Request timeout exceeds maximum of 600 seconds".to_string(),
                ));
            }
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Joins an API path (`/books/search`) onto the base URL.
    pub fn endpoint(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.api_base_url, path)
        } else {
            format!("{}/{}", self.api_base_url, path)
        }
    }
}

fn validate_base_url(url: &str) -> Result<()> {
    if url.trim().is_empty() {
        return Err(Error::Config("API base URL cannot be empty".to_string()));
    }

    let rest = url
        .strip_prefix("http://")
        .or_else(|| url.strip_prefix("https://"))
        .ok_or_else(|| {
            Error::Config(format!(
                "API base URL must start with http:// or https://, got '{}'",
                url
            ))
        })?;

    if rest.is_empty() || rest.starts_with('/') {
        return Err(Error::Config(format!(
            "API base URL '{}' is missing a host",
            url
        )));
    }

    Ok(())
}

#[cfg(not(feature = "desktop-shims"))]
fn http_client_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: "No HTTP client implementation provided. \
                 Desktop: ensure the 'desktop-shims' feature is enabled to use ReqwestHttpClient. \
                 Web: inject a fetch-based client."
            .to_string(),
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn secure_store_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "SecureStore".to_string(),
        message: "SecureStore implementation is required for the session token. \
                 Desktop: ensure the 'desktop-shims' feature is enabled. \
                 Web: inject sessionStorage-backed storage."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client(timeout: Option<Duration>) -> Result<Arc<dyn HttpClient>> {
    use bridge_desktop::ReqwestHttpClient;

    let client = ReqwestHttpClient::try_new(timeout).map_err(|e| Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: e.to_string(),
    })?;
    Ok(Arc::new(client))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client(_timeout: Option<Duration>) -> Result<Arc<dyn HttpClient>> {
    Err(http_client_missing_error())
}

#[cfg(feature = "secure-store")]
fn provide_default_secure_store() -> Result<Arc<dyn SecureStore>> {
    use bridge_desktop::KeyringSecureStore;

    let store = KeyringSecureStore::new().with_tracked_keys(SESSION_KEYS.iter().copied());
    Ok(Arc::new(store))
}

#[cfg(all(feature = "desktop-shims", not(feature = "secure-store")))]
fn provide_default_secure_store() -> Result<Arc<dyn SecureStore>> {
    Ok(Arc::new(bridge_desktop::MemorySecureStore::new()))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_secure_store() -> Result<Arc<dyn SecureStore>> {
    Err(secure_store_missing_error())
}

/// Keys the session layer writes. Keyring-backed stores track them so that
/// `clear_all` reaches entries written by earlier processes.
pub const SESSION_KEYS: &[&str] = &["auth_token", "auth_user"];

/// Builder for constructing [`CoreConfig`] instances.
#[derive(Default)]
pub struct CoreConfigBuilder {
    api_base_url: Option<String>,
    request_timeout: Option<Duration>,
    event_buffer_size: Option<usize>,
    http_client: Option<Arc<dyn HttpClient>>,
    secure_store: Option<Arc<dyn SecureStore>>,
}

impl CoreConfigBuilder {
    /// Seeds a builder from `LIBDASH_API_URL` and `LIBDASH_TIMEOUT_SECS`.
    ///
    /// Unset variables leave the defaults in place. A timeout that is not a
    /// whole number of seconds is a configuration error.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Self::default();

        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            builder = builder.api_base_url(url);
        }

        if let Some(raw) = lookup(ENV_TIMEOUT_SECS).filter(|v| !v.trim().is_empty()) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                Error::Config(format!(
                    "{} must be a whole number of seconds, got '{}'",
                    ENV_TIMEOUT_SECS, raw
                ))
            })?;
            builder = builder.request_timeout(Duration::from_secs(secs));
        }

        Ok(builder)
    }

    /// Sets the backend base URL. A trailing slash is removed.
    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.api_base_url = Some(url.trim().trim_end_matches('/').to_string());
        self
    }

    /// Bounds every request by `timeout`.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Sets the event bus capacity.
    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    /// Sets the HTTP client implementation.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Sets the session storage implementation.
    pub fn secure_store(mut self, store: Arc<dyn SecureStore>) -> Self {
        self.secure_store = Some(store);
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A required bridge is missing and no desktop default is available
    /// - Configuration values are invalid
    pub fn build(self) -> Result<CoreConfig> {
        let request_timeout = self.request_timeout;

        let http_client = match self.http_client {
            Some(client) => client,
            None => provide_default_http_client(request_timeout)?,
        };

        let secure_store = match self.secure_store {
            Some(store) => store,
            None => provide_default_secure_store()?,
        };

        let config = CoreConfig {
            api_base_url: self
                .api_base_url
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            request_timeout,
            event_buffer_size: self.event_buffer_size.unwrap_or(DEFAULT_EVENT_BUFFER_SIZE),
            http_client,
            secure_store,
        };

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::{HttpRequest, HttpResponse};
    use std::collections::HashMap;

    struct NullHttp;

    #[async_trait]
    impl HttpClient for NullHttp {
        async fn execute(&self, _request: HttpRequest) -> BridgeResult<HttpResponse> {
            Ok(HttpResponse::new(200, "[]"))
        }
    }

    struct NullStore;

    #[async_trait]
    impl SecureStore for NullStore {
        async fn set_secret(&self, _key: &str, _value: &[u8]) -> BridgeResult<()> {
            Ok(())
        }
        async fn get_secret(&self, _key: &str) -> BridgeResult<Option<Vec<u8>>> {
            Ok(None)
        }
        async fn delete_secret(&self, _key: &str) -> BridgeResult<()> {
            Ok(())
        }
        async fn list_keys(&self) -> BridgeResult<Vec<String>> {
            Ok(Vec::new())
        }
        async fn clear_all(&self) -> BridgeResult<()> {
            Ok(())
        }
    }

    fn builder() -> CoreConfigBuilder {
        CoreConfig::builder()
            .http_client(Arc::new(NullHttp))
            .secure_store(Arc::new(NullStore))
    }

    #[test]
    fn test_defaults() {
        let config = builder().build().unwrap();
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.request_timeout, None);
        assert_eq!(config.event_buffer_size, DEFAULT_EVENT_BUFFER_SIZE);
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let config = builder()
            .api_base_url("https://library.example.com/api/")
            .build()
            .unwrap();
        assert_eq!(config.api_base_url, "https://library.example.com/api");
        assert_eq!(
            config.endpoint("/books/search"),
            "https://library.example.com/api/books/search"
        );
        assert_eq!(
            config.endpoint("authors"),
            "https://library.example.com/api/authors"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let err = builder().api_base_url("ftp://x").build().unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = builder().api_base_url("http://").build().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let err = builder()
            .request_timeout(Duration::ZERO)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("greater than zero"));
    }

    #[test]
    fn test_zero_event_buffer_rejected() {
        assert!(builder().event_buffer_size(0).build().is_err());
    }

    #[test]
    fn test_from_lookup() {
        let env: HashMap<&str, &str> = [
            (ENV_API_URL, "http://books.internal:8080/"),
            (ENV_TIMEOUT_SECS, "15"),
        ]
        .into_iter()
        .collect();

        let config = CoreConfigBuilder::from_lookup(|k| env.get(k).map(|v| v.to_string()))
            .unwrap()
            .http_client(Arc::new(NullHttp))
            .secure_store(Arc::new(NullStore))
            .build()
            .unwrap();

        assert_eq!(config.api_base_url, "http://books.internal:8080");
        assert_eq!(config.request_timeout, Some(Duration::from_secs(15)));
    }

    #[test]
    fn test_from_lookup_bad_timeout() {
        let result = CoreConfigBuilder::from_lookup(|k| {
            (k == ENV_TIMEOUT_SECS).then(|| "soon".to_string())
        });
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_missing_http_client_is_reported() {
        let err = CoreConfig::builder()
            .secure_store(Arc::new(NullStore))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::CapabilityMissing { ref capability, .. } if capability == "HttpClient"));
    }
}
