//! Cart store errors.

use thiserror::Error;

/// Errors from the cart store.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartStoreError {
    /// A mutation was attempted before the one-time load for the current
    /// user. Writing first would clobber durable storage with an empty
    /// in-memory cart.
    #[error("cart not loaded for a user")]
    NotLoaded,
}
