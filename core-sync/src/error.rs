use core_auth::ApiError;
use core_library::LibraryError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Rejected locally before any request was sent.
    #[error(transparent)]
    InvalidInput(#[from] LibraryError),
}

impl SyncError {
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, SyncError::Api(e) if e.is_unauthenticated())
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
