//! # Authentication Module
//!
//! Session handling for the library dashboard.
//!
//! ## Overview
//!
//! - [`ApiClient`]: every backend call goes through it. It attaches the bearer
//!   token and turns a missing or rejected token into
//!   [`ApiError::Unauthenticated`] plus a re-authentication event.
//! - [`AuthManager`]: login, signup, logout and the current user.
//! - [`SessionStore`]: token and profile persisted in the platform secure store.
//! - [`validation`]: the checks the login and signup forms run before
//!   anything is sent.

pub mod api_client;
pub mod error;
pub mod manager;
pub mod session_store;
pub mod types;
pub mod validation;

#[cfg(test)]
pub(crate) mod test_support;

pub use api_client::{ApiClient, ApiResult};
pub use error::{ApiError, AuthError, Result};
pub use manager::AuthManager;
pub use session_store::SessionStore;
pub use types::{AuthToken, Credentials, LoginResponse, Role, Session, SignupRequest, UserProfile};
