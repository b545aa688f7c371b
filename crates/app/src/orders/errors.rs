//! Orders service errors.

use thiserror::Error;

use crate::{api::ApiError, orders::models::LineConflict};

/// Errors from checkout and status operations.
#[derive(Debug, Error)]
pub enum OrdersServiceError {
    /// Checkout was attempted with no submittable lines.
    #[error("cart has no submittable lines")]
    EmptyCart,

    /// Some lines exceed availability. Recoverable: the user adjusts down to
    /// the reported quantities (or removes the lines) and resubmits.
    #[error("insufficient stock for {} line(s)", .0.len())]
    StockConflict(Vec<LineConflict>),

    /// Receipt confirmation was requested outside its stage window.
    #[error("receipt confirmation is not available at the current stage")]
    ConfirmNotAvailable,

    /// Underlying API failure.
    #[error(transparent)]
    Api(#[from] ApiError),
}
