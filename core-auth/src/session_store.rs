//! Session Persistence
//!
//! Keeps the bearer token and the signed-in profile in the platform
//! [`SecureStore`] under two fixed keys:
//!
//! | Key          | Value                         |
//! |--------------|-------------------------------|
//! | `auth_token` | raw token bytes (UTF-8)       |
//! | `auth_user`  | JSON-encoded [`UserProfile`]  |
//!
//! Token values are never logged.

use crate::error::{AuthError, Result};
use crate::types::{AuthToken, Session, UserProfile};
use bridge_traits::storage::SecureStore;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const TOKEN_KEY: &str = "auth_token";
pub const USER_KEY: &str = "auth_user";

/// Token and profile storage on top of a [`SecureStore`].
#[derive(Clone)]
pub struct SessionStore {
    secure_store: Arc<dyn SecureStore>,
}

impl SessionStore {
    pub fn new(secure_store: Arc<dyn SecureStore>) -> Self {
        Self { secure_store }
    }

    /// Persist a freshly issued token and its profile, replacing any previous
    /// session.
    pub async fn save(&self, session: &Session) -> Result<()> {
        let user_json =
            serde_json::to_vec(&session.user).map_err(|e| AuthError::SerializationFailed {
                context: "user profile".to_string(),
                source: e,
            })?;

        self.secure_store
            .set_secret(TOKEN_KEY, session.token.as_str().as_bytes())
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to store token in secure storage");
                AuthError::SecureStorageUnavailable(e.to_string())
            })?;

        self.secure_store
            .set_secret(USER_KEY, &user_json)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to store user profile in secure storage");
                AuthError::SecureStorageUnavailable(e.to_string())
            })?;

        info!(user_id = session.user.id, "Session stored");
        Ok(())
    }

    /// The stored token, if any. An empty or non-UTF-8 value counts as absent.
    pub async fn token(&self) -> Result<Option<AuthToken>> {
        let data = self.secure_store.get_secret(TOKEN_KEY).await.map_err(|e| {
            warn!(error = %e, "Failed to read token from secure storage");
            AuthError::SecureStorageUnavailable(e.to_string())
        })?;

        let token = data
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .filter(|token| !token.trim().is_empty())
            .map(AuthToken::new);

        if token.is_none() {
            debug!("No token in session storage");
        }

        Ok(token)
    }

    /// The stored profile. Corrupted entries are deleted and reported as absent.
    pub async fn user(&self) -> Result<Option<UserProfile>> {
        let data = self.secure_store.get_secret(USER_KEY).await.map_err(|e| {
            warn!(error = %e, "Failed to read user profile from secure storage");
            AuthError::SecureStorageUnavailable(e.to_string())
        })?;

        let Some(data) = data else {
            return Ok(None);
        };

        match serde_json::from_slice::<UserProfile>(&data) {
            Ok(user) => Ok(Some(user)),
            Err(e) => {
                warn!(error = %e, "Stored user profile is corrupted, removing it");
                if let Err(delete_err) = self.secure_store.delete_secret(USER_KEY).await {
                    warn!(error = %delete_err, "Failed to delete corrupted user profile");
                }
                Ok(None)
            }
        }
    }

    /// Token and profile together; `None` unless both are present.
    pub async fn session(&self) -> Result<Option<Session>> {
        let Some(token) = self.token().await? else {
            return Ok(None);
        };
        Ok(self.user().await?.map(|user| Session { token, user }))
    }

    /// Remove token and profile. Idempotent.
    pub async fn clear(&self) -> Result<()> {
        for key in [TOKEN_KEY, USER_KEY] {
            self.secure_store.delete_secret(key).await.map_err(|e| {
                warn!(key, error = %e, "Failed to delete session entry");
                AuthError::SecureStorageUnavailable(e.to_string())
            })?;
        }

        info!("Session cleared");
        Ok(())
    }
}
