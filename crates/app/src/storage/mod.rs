//! Durable client storage.
//!
//! The storefront keeps its session and cart state in a small key-value
//! store so it survives restarts. Keys follow the layout the backend's web
//! client established: `accessToken`, `refreshToken`, `user`, and one
//! `cart_<userId>` entry per user.

use mockall::automock;
use thiserror::Error;

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

/// Key holding the current bearer token.
pub const ACCESS_TOKEN_KEY: &str = "accessToken";

/// Key holding the current refresh token.
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

/// Key holding the serialized user profile.
pub const USER_KEY: &str = "user";

/// Storage key for a user's cart.
#[must_use]
pub fn cart_key(user_id: &str) -> String {
    format!("cart_{user_id}")
}

/// Errors from the durable store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying filesystem failure.
    #[error("storage i/o error")]
    Io(#[from] std::io::Error),

    /// The store rejected the operation.
    #[error("storage unavailable")]
    Unavailable,
}

/// A durable string key-value store.
///
/// Implementations are synchronous; values are small serialized records and
/// callers treat write failures as best-effort (log and keep the in-memory
/// state).
#[automock]
pub trait Storage: Send + Sync {
    /// Reads the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error when the store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error when the value cannot be persisted.
    fn put(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Deletes the value under `key`. Removing an absent key is not an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns an error when the store cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}
