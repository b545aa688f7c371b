//! Profile service.

use std::sync::Arc;

use thiserror::Error;

use crate::api::{ApiError, AuthGateway, models::UserProfile};

/// Errors from profile lookups.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// Underlying API failure.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Read access to the signed-in user's profile record.
#[derive(Debug, Clone)]
pub struct ProfileService {
    gateway: Arc<AuthGateway>,
}

impl ProfileService {
    /// Creates the service.
    #[must_use]
    pub fn new(gateway: Arc<AuthGateway>) -> Self {
        Self { gateway }
    }

    /// The current user's profile, when the backend has one.
    ///
    /// # Errors
    ///
    /// Returns the underlying API failure.
    pub async fn current(&self) -> Result<Option<UserProfile>, ProfileError> {
        self.gateway
            .run(|backend, token| async move { backend.profile(&token).await })
            .await
            .map_err(ProfileError::from)
    }
}
