//! Session errors.

use thiserror::Error;

use crate::api::ApiError;

/// Errors from the session service.
#[derive(Debug, Error)]
pub enum SessionError {
    /// No credentials are held.
    #[error("no authenticated session")]
    NotAuthenticated,

    /// The backend rejected the supplied credentials.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The session could not be renewed; the client has been logged out.
    #[error("session expired")]
    Expired,

    /// Underlying API failure.
    #[error(transparent)]
    Api(#[from] ApiError),
}
