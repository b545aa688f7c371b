//! Authorized call gateway.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::{
    api::{ApiError, Backend},
    session::SessionService,
};

/// Runs authorized backend calls under the refresh-and-retry-once contract:
/// a call rejected as unauthorized triggers exactly one token refresh and
/// one replay; a second rejection is terminal and forces logout. The bound
/// keeps a permanently invalid refresh token from looping.
#[derive(Clone)]
pub struct AuthGateway {
    backend: Arc<dyn Backend>,
    session: Arc<SessionService>,
}

impl AuthGateway {
    /// Creates the gateway over a backend and the session holding its
    /// credentials.
    #[must_use]
    pub fn new(backend: Arc<dyn Backend>, session: Arc<SessionService>) -> Self {
        Self { backend, session }
    }

    /// The session this gateway authorizes with.
    #[must_use]
    pub fn session(&self) -> &Arc<SessionService> {
        &self.session
    }

    /// Runs one authorized call. The closure receives the backend and the
    /// current access token and is invoked at most twice (original call plus
    /// the single post-refresh replay).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotAuthenticated`] without a session,
    /// [`ApiError::SessionExpired`] when refresh (or the replay) fails
    /// terminally, and the call's own error otherwise.
    pub async fn run<T, F, Fut>(&self, call: F) -> Result<T, ApiError>
    where
        F: Fn(Arc<dyn Backend>, String) -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let token = self
            .session
            .access_token()
            .ok_or(ApiError::NotAuthenticated)?;

        match call(Arc::clone(&self.backend), token).await {
            Err(ApiError::Unauthorized) => {}
            first => return first,
        }

        debug!("authorized call rejected; refreshing access token");

        // Refresh failure already logged the session out.
        let token = self
            .session
            .refresh_access_token()
            .await
            .map_err(|_| ApiError::SessionExpired)?;

        let second = call(Arc::clone(&self.backend), token).await;

        if matches!(second, Err(ApiError::Unauthorized)) {
            warn!("replayed call rejected again; forcing logout");
            self.session.logout();

            return Err(ApiError::SessionExpired);
        }

        second
    }
}

impl std::fmt::Debug for AuthGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthGateway").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{
        api::{ApiError, MockBackend, models::RefreshedSession},
        session::SessionService,
        storage::MemoryStorage,
        test::helpers::authenticated_session,
    };

    use super::*;

    #[tokio::test]
    async fn passes_through_a_successful_call() {
        let mut backend = MockBackend::new();

        backend
            .expect_list_categories()
            .times(1)
            .returning(|_| Ok(Vec::new()));

        let backend: Arc<dyn Backend> = Arc::new(backend);
        let session = authenticated_session(Arc::clone(&backend));
        let gateway = AuthGateway::new(backend, session);

        let result = gateway
            .run(|backend, token| async move { backend.list_categories(&token).await })
            .await;

        assert!(result.is_ok(), "expected pass-through, got {result:?}");
    }

    #[tokio::test]
    async fn retries_once_with_a_refreshed_token() {
        let mut backend = MockBackend::new();

        backend
            .expect_list_categories()
            .withf(|token| token == "stale-token")
            .times(1)
            .returning(|_| Err(ApiError::Unauthorized));

        backend
            .expect_refresh_session()
            .withf(|refresh| refresh == "refresh-1")
            .times(1)
            .returning(|_| {
                Ok(RefreshedSession {
                    access_token: "fresh-token".to_string(),
                    refresh_token: None,
                })
            });

        backend
            .expect_list_categories()
            .withf(|token| token == "fresh-token")
            .times(1)
            .returning(|_| Ok(Vec::new()));

        let backend: Arc<dyn Backend> = Arc::new(backend);
        let session = authenticated_session(Arc::clone(&backend));
        let gateway = AuthGateway::new(backend, session.clone());

        let result = gateway
            .run(|backend, token| async move { backend.list_categories(&token).await })
            .await;

        assert!(result.is_ok(), "expected a recovered call, got {result:?}");
        assert_eq!(session.access_token().as_deref(), Some("fresh-token"));
    }

    #[tokio::test]
    async fn second_rejection_forces_logout_after_one_refresh() {
        let mut backend = MockBackend::new();

        backend
            .expect_list_categories()
            .times(2)
            .returning(|_| Err(ApiError::Unauthorized));

        // Exactly one refresh attempt: a second rejection must not loop.
        backend
            .expect_refresh_session()
            .times(1)
            .returning(|_| {
                Ok(RefreshedSession {
                    access_token: "fresh-token".to_string(),
                    refresh_token: None,
                })
            });

        let backend: Arc<dyn Backend> = Arc::new(backend);
        let session = authenticated_session(Arc::clone(&backend));
        let gateway = AuthGateway::new(backend, session.clone());

        let result = gateway
            .run(|backend, token| async move { backend.list_categories(&token).await })
            .await;

        assert!(
            matches!(result, Err(ApiError::SessionExpired)),
            "expected SessionExpired, got {result:?}"
        );
        assert!(
            !session.is_authenticated(),
            "a terminal rejection must force logout"
        );
    }

    #[tokio::test]
    async fn failed_refresh_is_terminal() {
        let mut backend = MockBackend::new();

        backend
            .expect_list_categories()
            .times(1)
            .returning(|_| Err(ApiError::Unauthorized));

        backend
            .expect_refresh_session()
            .times(1)
            .returning(|_| Err(ApiError::Unauthorized));

        let backend: Arc<dyn Backend> = Arc::new(backend);
        let session = authenticated_session(Arc::clone(&backend));
        let gateway = AuthGateway::new(backend, session.clone());

        let result = gateway
            .run(|backend, token| async move { backend.list_categories(&token).await })
            .await;

        assert!(
            matches!(result, Err(ApiError::SessionExpired)),
            "expected SessionExpired, got {result:?}"
        );
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn unauthenticated_calls_never_reach_the_backend() {
        let backend: Arc<dyn Backend> = Arc::new(MockBackend::new());
        let storage = Arc::new(MemoryStorage::new());
        let session = Arc::new(SessionService::new(Arc::clone(&backend), storage));
        let gateway = AuthGateway::new(backend, session);

        let result = gateway
            .run(|backend, token| async move { backend.list_categories(&token).await })
            .await;

        assert!(
            matches!(result, Err(ApiError::NotAuthenticated)),
            "expected NotAuthenticated, got {result:?}"
        );
    }
}
