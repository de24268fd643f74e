use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Core initialization failed: {0}")]
    InitializationFailed(#[from] core_runtime::Error),

    #[error(transparent)]
    Auth(#[from] core_auth::AuthError),

    #[error(transparent)]
    Sync(#[from] core_sync::SyncError),

    #[error(transparent)]
    Library(#[from] core_library::LibraryError),
}

impl CoreError {
    /// The session is missing or was rejected; the user has to log in.
    pub fn is_unauthenticated(&self) -> bool {
        match self {
            CoreError::Auth(core_auth::AuthError::Api(e)) => e.is_unauthenticated(),
            CoreError::Sync(e) => e.is_unauthenticated(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
