//! # Authentication Manager
//!
//! Login, signup and logout against the backend, with the resulting session
//! kept in the [`SessionStore`] and reported on the event bus.
//!
//! ```no_run
//! use core_auth::{AuthManager, Credentials};
//! # async fn example(manager: AuthManager) -> core_auth::Result<()> {
//! let user = manager
//!     .login(Credentials::new("ada@example.com", "secret1"))
//!     .await?;
//! println!("Signed in as {}", user.name);
//! # Ok(())
//! # }
//! ```

use crate::api_client::{ack_message, ApiClient};
use crate::error::{AuthError, Result};
use crate::session_store::SessionStore;
use crate::types::{AuthToken, Credentials, LoginResponse, Session, SignupRequest, UserProfile};
use crate::validation::{validate_credentials, validate_signup};
use bridge_traits::HttpMethod;
use core_runtime::events::{AuthEvent, CoreEvent};
use core_runtime::logging::redact_if_sensitive;
use tracing::{info, instrument, warn};

const LOGIN_PATH: &str = "/login";
const SIGNUP_PATH: &str = "/signup";

/// Session lifecycle on top of an [`ApiClient`].
#[derive(Clone)]
pub struct AuthManager {
    api: ApiClient,
}

impl AuthManager {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    fn sessions(&self) -> &SessionStore {
        self.api.sessions()
    }

    /// Validate, post `/login`, then persist the returned token and profile.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Validation`](crate::AuthError::Validation) before any request
    /// - [`AuthError::Api`](crate::AuthError::Api) with the server's message
    ///   for rejected credentials
    #[instrument(skip(self, credentials), fields(email = %redact_if_sensitive("email", &credentials.email)))]
    pub async fn login(&self, credentials: Credentials) -> Result<UserProfile> {
        validate_credentials(&credentials)?;

        let response: LoginResponse = self
            .api
            .send_public(HttpMethod::Post, LOGIN_PATH, &credentials)
            .await?;

        let session = Session {
            token: AuthToken::new(response.token),
            user: response.user,
        };
        self.sessions().save(&session).await?;

        info!(user_id = session.user.id, role = %session.user.role, "Signed in");

        self.api
            .event_bus()
            .emit(CoreEvent::Auth(AuthEvent::SignedIn {
                user_id: session.user.id,
                email: session.user.email.clone(),
                role: session.user.role.to_string(),
            }))
            .ok();

        Ok(session.user)
    }

    /// Validate and post `/signup`. Does not sign in.
    ///
    /// Returns the server's acknowledgement message.
    #[instrument(skip(self, request), fields(role = %request.role))]
    pub async fn signup(&self, request: SignupRequest) -> Result<String> {
        validate_signup(&request)?;

        let body =
            serde_json::to_value(&request).map_err(|e| AuthError::SerializationFailed {
                context: "signup request".to_string(),
                source: e,
            })?;

        let response = self
            .api
            .request_public(SIGNUP_PATH, HttpMethod::Post, Some(body))
            .await?;

        info!("Account created");
        Ok(ack_message(&response).unwrap_or_else(|| "Account created successfully".to_string()))
    }

    /// Clear the stored session. Succeeds when nobody is signed in.
    pub async fn logout(&self) -> Result<()> {
        let was_signed_in = self.sessions().token().await?.is_some();
        self.sessions().clear().await?;

        if was_signed_in {
            info!("Signed out");
        } else {
            warn!("Logout requested without an active session");
        }

        self.api
            .event_bus()
            .emit(CoreEvent::Auth(AuthEvent::SignedOut))
            .ok();
        Ok(())
    }

    /// The stored profile, if a session exists.
    pub async fn current_user(&self) -> Result<Option<UserProfile>> {
        Ok(self.sessions().session().await?.map(|session| session.user))
    }

    pub async fn is_signed_in(&self) -> Result<bool> {
        Ok(self.sessions().token().await?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::session_store::TOKEN_KEY;
    use crate::test_support::{signed_in_store, InMemorySecureStore, MockHttpClient};
    use crate::types::Role;
    use bridge_traits::HttpResponse;
    use core_runtime::events::EventBus;
    use std::sync::Arc;

    fn manager(
        http: MockHttpClient,
        secure: Arc<InMemorySecureStore>,
        bus: EventBus,
    ) -> AuthManager {
        AuthManager::new(ApiClient::new(
            Arc::new(http),
            SessionStore::new(secure),
            bus,
            "http://127.0.0.1:5000",
        ))
    }

    #[tokio::test]
    async fn test_login_stores_token_and_emits_event() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .withf(|req| {
                req.url == "http://127.0.0.1:5000/login"
                    && !req.has_authorization()
                    && serde_json::from_slice::<serde_json::Value>(req.body.as_deref().unwrap_or_default())
                        .map(|v| v["email"] == "ada@example.com")
                        .unwrap_or(false)
            })
            .times(1)
            .returning(|_| {
                Ok(HttpResponse::new(
                    200,
                    r#"{"message":"Login successful","token":"jwt-1",
                        "user":{"id":7,"name":"Ada","email":"ada@example.com","role":"admin"}}"#,
                ))
            });

        let secure = Arc::new(InMemorySecureStore::default());
        let bus = EventBus::new(8);
        let mut events = bus.subscribe();
        let auth = manager(http, secure.clone(), bus);

        let user = auth
            .login(Credentials::new("ada@example.com", "secret1"))
            .await
            .unwrap();

        assert_eq!(user.id, 7);
        assert_eq!(user.role, Role::Admin);
        assert_eq!(secure.raw(TOKEN_KEY).await, Some(b"jwt-1".to_vec()));
        assert_eq!(auth.current_user().await.unwrap(), Some(user));

        match events.recv().await.unwrap() {
            CoreEvent::Auth(AuthEvent::SignedIn { user_id, role, .. }) => {
                assert_eq!(user_id, 7);
                assert_eq!(role, "admin");
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_short_password_never_reaches_server() {
        let mut http = MockHttpClient::new();
        http.expect_execute().times(0);

        let auth = manager(
            http,
            Arc::new(InMemorySecureStore::default()),
            EventBus::new(8),
        );
        let err = auth
            .login(Credentials::new("ada@example.com", "12345"))
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::Validation { field: "password", .. }));
    }

    #[tokio::test]
    async fn test_rejected_login_surfaces_server_message() {
        let mut http = MockHttpClient::new();
        http.expect_execute().returning(|_| {
            Ok(HttpResponse::new(
                401,
                r#"{"error":"Invalid email or password"}"#,
            ))
        });

        let secure = Arc::new(InMemorySecureStore::default());
        let auth = manager(http, secure.clone(), EventBus::new(8));
        let err = auth
            .login(Credentials::new("ada@example.com", "wrongpw"))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Invalid email or password");
        assert!(matches!(
            err,
            AuthError::Api(ApiError::Application { status: 401, .. })
        ));
        assert!(!auth.is_signed_in().await.unwrap());
    }

    #[tokio::test]
    async fn test_signup_does_not_sign_in() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .withf(|req| req.url.ends_with("/signup"))
            .returning(|_| {
                Ok(HttpResponse::new(
                    201,
                    r#"{"message":"User created successfully"}"#,
                ))
            });

        let secure = Arc::new(InMemorySecureStore::default());
        let auth = manager(http, secure.clone(), EventBus::new(8));
        let message = auth
            .signup(SignupRequest::new(
                "Ada",
                "ada@example.com",
                "secret1",
                Role::User,
            ))
            .await
            .unwrap();

        assert_eq!(message, "User created successfully");
        assert!(secure.raw(TOKEN_KEY).await.is_none());
    }

    #[tokio::test]
    async fn test_logout_clears_session() {
        let http = MockHttpClient::new();
        let secure = signed_in_store().await;
        let bus = EventBus::new(8);
        let mut events = bus.subscribe();
        let auth = manager(http, secure.clone(), bus);

        assert!(auth.is_signed_in().await.unwrap());
        auth.logout().await.unwrap();

        assert!(!auth.is_signed_in().await.unwrap());
        assert!(auth.current_user().await.unwrap().is_none());
        assert_eq!(
            events.recv().await.unwrap(),
            CoreEvent::Auth(AuthEvent::SignedOut)
        );
    }
}
