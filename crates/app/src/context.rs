//! App Context

use std::{path::PathBuf, sync::Arc, time::Duration};

use thiserror::Error;

use crate::{
    api::{ApiConfig, ApiError, AuthGateway, Backend, HttpBackend},
    cart::CartStore,
    catalog::CatalogService,
    orders::OrdersService,
    profile::ProfileService,
    session::SessionService,
    storage::{FileStorage, Storage, StorageError},
};

/// Errors building the application context.
#[derive(Debug, Error)]
pub enum AppInitError {
    /// The durable client store could not be prepared.
    #[error("failed to initialize client storage")]
    Storage(#[source] StorageError),

    /// The HTTP client could not be built.
    #[error("failed to initialize http client")]
    Http(#[source] ApiError),
}

/// Application settings.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Backend connection settings.
    pub api: ApiConfig,

    /// Directory holding the durable client state.
    pub data_dir: PathBuf,

    /// Interval between status poll ticks.
    pub poll_interval: Duration,
}

/// The wired application: every service constructed once, explicitly, with
/// its dependencies injected — no module-level globals, so tests assemble
/// isolated instances at will.
#[derive(Clone)]
pub struct AppContext {
    /// Session/auth holder.
    pub session: Arc<SessionService>,

    /// Persistent per-user cart.
    pub cart: Arc<CartStore>,

    /// Catalog browsing.
    pub catalog: Arc<CatalogService>,

    /// Checkout, history, status.
    pub orders: Arc<OrdersService>,

    /// Profile reads.
    pub profile: Arc<ProfileService>,

    /// Interval between status poll ticks.
    pub poll_interval: Duration,
}

impl AppContext {
    /// Builds the context from configuration: file-backed storage, the HTTP
    /// backend, and a hydrated session.
    ///
    /// # Errors
    ///
    /// Returns an error when storage or the HTTP client cannot be prepared.
    pub fn init(config: AppConfig) -> Result<Self, AppInitError> {
        let storage: Arc<dyn Storage> =
            Arc::new(FileStorage::new(config.data_dir).map_err(AppInitError::Storage)?);
        let backend: Arc<dyn Backend> =
            Arc::new(HttpBackend::new(config.api).map_err(AppInitError::Http)?);

        Ok(Self::assemble(backend, storage, config.poll_interval))
    }

    /// Wires the services over explicit backend and storage instances. This
    /// is the seam tests (and alternative frontends) construct through.
    #[must_use]
    pub fn assemble(
        backend: Arc<dyn Backend>,
        storage: Arc<dyn Storage>,
        poll_interval: Duration,
    ) -> Self {
        let session = Arc::new(SessionService::new(
            Arc::clone(&backend),
            Arc::clone(&storage),
        ));
        session.hydrate();

        let gateway = Arc::new(AuthGateway::new(backend, Arc::clone(&session)));

        Self {
            cart: Arc::new(CartStore::new(storage)),
            catalog: Arc::new(CatalogService::new(Arc::clone(&gateway))),
            orders: Arc::new(OrdersService::new(Arc::clone(&gateway))),
            profile: Arc::new(ProfileService::new(gateway)),
            session,
            poll_interval,
        }
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("session", &self.session)
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}
