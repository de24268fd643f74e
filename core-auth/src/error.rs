use thiserror::Error;

/// Outcome of a backend call that did not produce a usable 2xx response.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// No token was stored, or the server rejected it with 401.
    #[error("Not authenticated: please log in")]
    Unauthenticated,

    /// The request never produced an HTTP response.
    #[error("Network error: {0}")]
    Transport(String),

    /// The server answered with a non-2xx status. `message` is shown verbatim.
    #[error("{message}")]
    Application { status: u16, message: String },

    /// A 2xx body that does not match the expected shape.
    #[error("Unexpected response from server: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Application { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, ApiError::Unauthenticated)
    }
}

#[derive(Error, Debug)]
pub enum AuthError {
    /// Local input check failed before anything was sent.
    #[error("{message}")]
    Validation { field: &'static str, message: String },

    #[error("Secure storage unavailable: {0}")]
    SecureStorageUnavailable(String),

    #[error("Failed to serialize {context}: {source}")]
    SerializationFailed {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl AuthError {
    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        AuthError::Validation {
            field,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;
