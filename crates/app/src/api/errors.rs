//! API errors.

use thiserror::Error;

use crate::api::models::StockAdjustment;

/// Errors from backend calls.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No session token is available for an authorized call.
    #[error("no authenticated session")]
    NotAuthenticated,

    /// The backend rejected the call as unauthorized (one refresh-and-retry
    /// is attempted before this becomes terminal).
    #[error("request rejected as unauthorized")]
    Unauthorized,

    /// The session could not be refreshed; the client has been logged out.
    #[error("session expired")]
    SessionExpired,

    /// The backend reported insufficient stock for some submitted lines.
    #[error("insufficient stock for {} line(s)", .0.len())]
    StockConflict(Vec<StockAdjustment>),

    /// HTTP transport or deserialization failure.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend returned a non-2xx response or an unusable body.
    #[error("unexpected response from backend: {0}")]
    UnexpectedResponse(String),
}
