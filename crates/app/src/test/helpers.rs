//! Test fixtures for service-level tests.

use std::sync::Arc;

use apotheca::status::{OrderStage, StageFlags};

use crate::{
    api::{Backend, models::UserProfile},
    session::SessionService,
    storage::MemoryStorage,
};

/// A profile with just enough identity to scope a cart.
pub(crate) fn test_user(id: &str) -> UserProfile {
    UserProfile {
        id: Some(id.to_string()),
        ..UserProfile::default()
    }
}

/// A logged-in session over in-memory storage: access token `stale-token`,
/// refresh token `refresh-1`, user `U1`.
pub(crate) fn authenticated_session(backend: Arc<dyn Backend>) -> Arc<SessionService> {
    let session = Arc::new(SessionService::new(backend, Arc::new(MemoryStorage::new())));

    session.login(
        test_user("U1"),
        "stale-token".to_string(),
        Some("refresh-1".to_string()),
    );

    session
}

/// Flags with every stage up to and including `last` reached.
pub(crate) fn reached_through(last: OrderStage) -> StageFlags {
    let mut flags = StageFlags::default();

    for stage in OrderStage::ALL {
        if stage.index() <= last.index() {
            flags.set(stage, true, None);
        }
    }

    flags
}
