//! Session service.
//!
//! Holds the bearer credential and user identity, persists them across
//! restarts, and renews the access token when the backend rejects it. There
//! is exactly one session per client; it is the sole source of the user id
//! that scopes the persistent cart.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, warn};
use zeroize::Zeroize;

use crate::{
    api::{ApiError, Backend, models::UserProfile},
    session::SessionError,
    storage::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, Storage, USER_KEY},
};

/// The stored refresh token. Redacted in debug output and zeroized on drop,
/// since it is the longest-lived credential the client holds.
struct RefreshToken(String);

impl RefreshToken {
    fn new(value: String) -> Self {
        Self(value)
    }

    fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for RefreshToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("RefreshToken(**redacted**)")
    }
}

impl Drop for RefreshToken {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

#[derive(Debug, Default)]
struct SessionState {
    access_token: Option<String>,
    refresh_token: Option<RefreshToken>,
    user: Option<UserProfile>,
    hydrated: bool,
}

/// Session/auth holder.
pub struct SessionService {
    backend: Arc<dyn Backend>,
    storage: Arc<dyn Storage>,
    state: Mutex<SessionState>,

    // Single-flight: concurrent 401s coalesce on one refresh instead of
    // racing the backend with several.
    refresh_lock: tokio::sync::Mutex<()>,
}

impl SessionService {
    /// Creates an empty (logged-out, not yet hydrated) session.
    #[must_use]
    pub fn new(backend: Arc<dyn Backend>, storage: Arc<dyn Storage>) -> Self {
        Self {
            backend,
            storage,
            state: Mutex::new(SessionState::default()),
            refresh_lock: tokio::sync::Mutex::new(()),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// One-time startup read of persisted credentials. Unreadable values are
    /// treated as absent; a corrupted user record is removed rather than
    /// carried forward.
    pub fn hydrate(&self) {
        let mut state = self.state();

        if state.hydrated {
            return;
        }

        state.access_token = self.read_key(ACCESS_TOKEN_KEY);
        state.refresh_token = self.read_key(REFRESH_TOKEN_KEY).map(RefreshToken::new);

        state.user = match self.read_key(USER_KEY) {
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(user) => Some(user),
                Err(error) => {
                    warn!("discarding unreadable persisted user record: {error}");

                    if let Err(error) = self.storage.remove(USER_KEY) {
                        warn!("failed to remove unreadable user record: {error}");
                    }

                    None
                }
            },
            None => None,
        };

        state.hydrated = true;
    }

    fn read_key(&self, key: &str) -> Option<String> {
        match self.storage.get(key) {
            Ok(value) => value,
            Err(error) => {
                warn!(key, "failed to read persisted session value: {error}");

                None
            }
        }
    }

    fn persist(&self, key: &str, value: &str) {
        if let Err(error) = self.storage.put(key, value) {
            warn!(key, "failed to persist session value: {error}");
        }
    }

    fn discard(&self, key: &str) {
        if let Err(error) = self.storage.remove(key) {
            warn!(key, "failed to remove persisted session value: {error}");
        }
    }

    /// Whether a bearer token is held.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state().access_token.is_some()
    }

    /// The current bearer token.
    #[must_use]
    pub fn access_token(&self) -> Option<String> {
        self.state().access_token.clone()
    }

    /// The signed-in user.
    #[must_use]
    pub fn user(&self) -> Option<UserProfile> {
        self.state().user.clone()
    }

    /// The signed-in user's id — the cart storage scope.
    #[must_use]
    pub fn user_id(&self) -> Option<String> {
        self.state().user.as_ref().and_then(|user| user.id.clone())
    }

    /// Exchanges credentials for a session and stores it.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidCredentials`] on rejection, or the
    /// underlying API failure.
    pub async fn sign_in(
        &self,
        login: &str,
        password: &str,
    ) -> Result<UserProfile, SessionError> {
        let signed_in = self
            .backend
            .sign_in(login, password)
            .await
            .map_err(|error| match error {
                ApiError::Unauthorized => SessionError::InvalidCredentials,
                other => SessionError::Api(other),
            })?;

        self.login(
            signed_in.user.clone(),
            signed_in.access_token,
            signed_in.refresh_token,
        );

        Ok(signed_in.user)
    }

    /// Stores a session in memory and in durable storage. Persistence is
    /// best-effort: a write failure is logged and the in-memory session
    /// stands for the rest of the run.
    pub fn login(&self, user: UserProfile, access_token: String, refresh_token: Option<String>) {
        self.persist(ACCESS_TOKEN_KEY, &access_token);

        match serde_json::to_string(&user) {
            Ok(serialized) => self.persist(USER_KEY, &serialized),
            Err(error) => warn!("failed to serialize user record: {error}"),
        }

        if let Some(refresh) = &refresh_token {
            self.persist(REFRESH_TOKEN_KEY, refresh);
        }

        let mut state = self.state();
        state.access_token = Some(access_token);
        state.refresh_token = refresh_token.map(RefreshToken::new);
        state.user = Some(user);
        state.hydrated = true;
    }

    /// Clears the session from memory and durable storage.
    pub fn logout(&self) {
        debug!("clearing session");

        {
            let mut state = self.state();
            state.access_token = None;
            state.refresh_token = None;
            state.user = None;
        }

        self.discard(ACCESS_TOKEN_KEY);
        self.discard(REFRESH_TOKEN_KEY);
        self.discard(USER_KEY);
    }

    /// Mints a replacement access token from the stored refresh token.
    /// Returns the token now in effect.
    ///
    /// Refresh is single-flight: callers that queued behind an in-flight
    /// refresh adopt its result instead of refreshing again. Failure is
    /// terminal — the session is logged out.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotAuthenticated`] without a refresh token
    /// and [`SessionError::Expired`] when the backend rejects the refresh.
    pub async fn refresh_access_token(&self) -> Result<String, SessionError> {
        let stale = self.access_token();

        let _guard = self.refresh_lock.lock().await;

        // Someone else completed a refresh while we waited for the lock.
        let current = self.access_token();
        if let Some(token) = current
            && Some(&token) != stale.as_ref()
        {
            return Ok(token);
        }

        let refresh_token = {
            let state = self.state();

            state
                .refresh_token
                .as_ref()
                .map(|token| token.expose().to_string())
        };

        let Some(refresh_token) = refresh_token else {
            self.logout();

            return Err(SessionError::NotAuthenticated);
        };

        match self.backend.refresh_session(&refresh_token).await {
            Ok(refreshed) => {
                self.persist(ACCESS_TOKEN_KEY, &refreshed.access_token);

                if let Some(rotated) = &refreshed.refresh_token {
                    self.persist(REFRESH_TOKEN_KEY, rotated);
                }

                let mut state = self.state();
                state.access_token = Some(refreshed.access_token.clone());

                if let Some(rotated) = refreshed.refresh_token {
                    state.refresh_token = Some(RefreshToken::new(rotated));
                }

                Ok(refreshed.access_token)
            }
            Err(error) => {
                warn!("token refresh failed, logging out: {error}");
                self.logout();

                Err(SessionError::Expired)
            }
        }
    }

    /// Starts the forgot-password flow for the given login.
    ///
    /// # Errors
    ///
    /// Returns the underlying API failure.
    pub async fn request_password_reset(&self, login: &str) -> Result<(), SessionError> {
        self.backend
            .request_password_reset(login)
            .await
            .map_err(SessionError::from)
    }

    /// Completes the reset flow: sets the new password and stores the
    /// session the backend returns.
    ///
    /// # Errors
    ///
    /// Returns the underlying API failure.
    pub async fn set_password(
        &self,
        login: &str,
        password: &str,
    ) -> Result<UserProfile, SessionError> {
        let signed_in = self.backend.set_password(login, password).await?;

        self.login(
            signed_in.user.clone(),
            signed_in.access_token,
            signed_in.refresh_token,
        );

        Ok(signed_in.user)
    }
}

impl std::fmt::Debug for SessionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionService")
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}
