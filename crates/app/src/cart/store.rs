//! Cart store.
//!
//! Single source of truth for the active cart: scoped to the signed-in
//! user, durable across restarts under `cart_<userId>`, and loaded at most
//! once per user so stale storage never clobbers in-memory state. Every
//! mutation persists best-effort — a failed write is logged and the
//! in-memory cart remains usable for the rest of the run.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use apotheca::{
    basket::{Basket, BasketLine},
    products::{Product, ProductKey},
};
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::{
    api::models::StockAdjustment,
    cart::CartStoreError,
    storage::{Storage, cart_key},
};

#[derive(Debug, Default)]
struct CartState {
    user_id: Option<String>,
    basket: Basket,
    loaded: bool,
}

/// Persistent per-user cart store.
pub struct CartStore {
    storage: Arc<dyn Storage>,
    state: Mutex<CartState>,
}

impl CartStore {
    /// Creates an unloaded store over the given storage.
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            state: Mutex::new(CartState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, CartState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Associates the store with a user and hydrates their cart from
    /// durable storage. Runs at most once per user; calling again for the
    /// same user is a no-op, and switching users replaces the in-memory
    /// cart entirely (carts never leak across users).
    ///
    /// Read and parse failures reset the cart to empty rather than blocking;
    /// persisted entries without a resolvable identity are dropped silently.
    pub fn load(&self, user_id: &str) {
        let mut state = self.state();

        if state.loaded && state.user_id.as_deref() == Some(user_id) {
            return;
        }

        let basket = match self.storage.get(&cart_key(user_id)) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<serde_json::Value>>(&raw) {
                Ok(entries) => {
                    let total = entries.len();
                    let lines: Vec<BasketLine> = entries
                        .into_iter()
                        .filter_map(|entry| serde_json::from_value(entry).ok())
                        .collect();

                    if lines.len() < total {
                        debug!(
                            dropped = total - lines.len(),
                            user_id, "dropped malformed persisted cart entries"
                        );
                    }

                    Basket::from_lines(lines)
                }
                Err(error) => {
                    warn!(user_id, "failed to parse persisted cart, resetting: {error}");

                    Basket::new()
                }
            },
            Ok(None) => Basket::new(),
            Err(error) => {
                warn!(user_id, "failed to read persisted cart, resetting: {error}");

                Basket::new()
            }
        };

        state.user_id = Some(user_id.to_string());
        state.basket = basket;
        state.loaded = true;
    }

    /// Runs one mutation against the basket and schedules a best-effort
    /// persist. Basket-level rejections (unknown line, bad quantity, missing
    /// identity) are logged and swallowed — the caller has no recovery path
    /// for them.
    fn mutate<R>(
        &self,
        op: impl FnOnce(&mut Basket) -> Result<R, apotheca::basket::BasketError>,
    ) -> Result<(), CartStoreError> {
        let mut state = self.state();

        if !state.loaded || state.user_id.is_none() {
            return Err(CartStoreError::NotLoaded);
        }

        match op(&mut state.basket) {
            Ok(_) => self.persist(&state),
            Err(error) => debug!("cart mutation ignored: {error}"),
        }

        Ok(())
    }

    fn persist(&self, state: &CartState) {
        let Some(user_id) = state.user_id.as_deref() else {
            return;
        };

        match serde_json::to_string(state.basket.lines()) {
            Ok(serialized) => {
                if let Err(error) = self.storage.put(&cart_key(user_id), &serialized) {
                    warn!(user_id, "failed to persist cart, keeping in-memory state: {error}");
                }
            }
            Err(error) => warn!(user_id, "failed to serialize cart: {error}"),
        }
    }

    /// Adds a product, merging into an existing line for the same key.
    /// A product without a resolvable identity is logged and ignored.
    ///
    /// # Errors
    ///
    /// Returns [`CartStoreError::NotLoaded`] before the one-time load.
    pub fn add_to_cart(&self, product: Product, quantity: u32) -> Result<(), CartStoreError> {
        self.mutate(|basket| basket.add(product, quantity).map(|_| ()))
    }

    /// Increments a line's quantity by one.
    ///
    /// # Errors
    ///
    /// Returns [`CartStoreError::NotLoaded`] before the one-time load.
    pub fn increase_quantity(&self, key: &ProductKey) -> Result<(), CartStoreError> {
        self.mutate(|basket| basket.increase(key).map(|_| ()))
    }

    /// Decrements a line's quantity by one, floored at 1.
    ///
    /// # Errors
    ///
    /// Returns [`CartStoreError::NotLoaded`] before the one-time load.
    pub fn decrease_quantity(&self, key: &ProductKey) -> Result<(), CartStoreError> {
        self.mutate(|basket| basket.decrease(key).map(|_| ()))
    }

    /// Sets a line's quantity directly; values below 1 are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`CartStoreError::NotLoaded`] before the one-time load.
    pub fn update_quantity(&self, key: &ProductKey, quantity: u32) -> Result<(), CartStoreError> {
        self.mutate(|basket| basket.set_quantity(key, quantity).map(|_| ()))
    }

    /// Changes which batch a line's price/stock figures come from.
    ///
    /// # Errors
    ///
    /// Returns [`CartStoreError::NotLoaded`] before the one-time load.
    pub fn update_batch_index(&self, key: &ProductKey, index: usize) -> Result<(), CartStoreError> {
        self.mutate(|basket| basket.select_batch(key, index))
    }

    /// Removes a line unconditionally.
    ///
    /// # Errors
    ///
    /// Returns [`CartStoreError::NotLoaded`] before the one-time load.
    pub fn remove_from_cart(&self, key: &ProductKey) -> Result<(), CartStoreError> {
        self.mutate(|basket| basket.remove(key).map(|_| ()))
    }

    /// Empties the cart.
    ///
    /// # Errors
    ///
    /// Returns [`CartStoreError::NotLoaded`] before the one-time load.
    pub fn clear_cart(&self) -> Result<(), CartStoreError> {
        self.mutate(|basket| {
            basket.clear();

            Ok(())
        })
    }

    /// Applies server-reported availability to conflicted lines: a line with
    /// zero availability is removed, any other is reconciled down to the
    /// reported figure. The adjust half of the adjust-and-resubmit loop.
    ///
    /// # Errors
    ///
    /// Returns [`CartStoreError::NotLoaded`] before the one-time load.
    pub fn apply_stock_adjustments(
        &self,
        adjustments: &[StockAdjustment],
    ) -> Result<(), CartStoreError> {
        for adjustment in adjustments {
            let Some(key) = ProductKey::new(adjustment.product_code.clone()) else {
                continue;
            };

            if adjustment.available == 0 {
                self.remove_from_cart(&key)?;
            } else {
                self.mutate(|basket| {
                    basket.reconcile_stock(&key, adjustment.available).map(|_| ())
                })?;
            }
        }

        Ok(())
    }

    /// A snapshot of the current lines.
    #[must_use]
    pub fn lines(&self) -> Vec<BasketLine> {
        self.state().basket.lines().to_vec()
    }

    /// Sum of all line quantities — the badge figure.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.state().basket.count()
    }

    /// Sum of all line totals.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.state().basket.total()
    }

    /// Whether the cart holds no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state().basket.is_empty()
    }
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();

        f.debug_struct("CartStore")
            .field("user_id", &state.user_id)
            .field("lines", &state.basket.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use apotheca::products::Batch;
    use rust_decimal::Decimal;
    use testresult::TestResult;

    use crate::storage::MemoryStorage;

    use super::*;

    fn product(id: &str, price: i64) -> Product {
        Product {
            id: Some(id.to_string()),
            name: format!("Product {id}"),
            batches: vec![Batch {
                expiry: None,
                price: Decimal::from(price),
                stock: None,
            }],
            ..Product::default()
        }
    }

    fn key(value: &str) -> ProductKey {
        ProductKey::new(value).expect("test key should be non-empty")
    }

    #[test]
    fn mutations_before_load_are_rejected() {
        let store = CartStore::new(Arc::new(MemoryStorage::new()));

        assert_eq!(
            store.add_to_cart(product("P1", 10), 1),
            Err(CartStoreError::NotLoaded),
            "a write before hydration would clobber durable storage"
        );
    }

    #[test]
    fn mutations_persist_under_the_users_key() {
        let storage = Arc::new(MemoryStorage::new());
        let store = CartStore::new(storage.clone());

        store.load("A");
        store
            .add_to_cart(product("P1", 10), 3)
            .expect("add should succeed");

        let raw = storage
            .get("cart_A")
            .expect("get should succeed")
            .expect("cart should be persisted");

        assert!(raw.contains("P1"), "persisted cart should carry the line");
        assert_eq!(store.count(), 3);
        assert_eq!(store.total(), Decimal::from(30));
    }

    #[test]
    fn carts_are_isolated_per_user() {
        let storage = Arc::new(MemoryStorage::new());

        let store = CartStore::new(storage.clone());
        store.load("A");
        store
            .add_to_cart(product("P1", 10), 2)
            .expect("add should succeed");

        // Same device, different user: B must not see A's lines.
        store.load("B");

        assert!(store.is_empty(), "user B must start from their own cart");

        store
            .add_to_cart(product("P2", 5), 1)
            .expect("add should succeed");

        let cart_a = storage
            .get("cart_A")
            .expect("get should succeed")
            .expect("cart A should persist");
        let cart_b = storage
            .get("cart_B")
            .expect("get should succeed")
            .expect("cart B should persist");

        assert!(cart_a.contains("P1") && !cart_a.contains("P2"));
        assert!(cart_b.contains("P2") && !cart_b.contains("P1"));

        // Switching back re-hydrates A's cart untouched.
        store.load("A");

        assert_eq!(store.count(), 2);
        assert!(store.lines().iter().any(|line| line.key() == &key("P1")));
    }

    #[test]
    fn load_runs_once_per_user() {
        let storage = Arc::new(MemoryStorage::new());
        let store = CartStore::new(storage.clone());

        store.load("A");
        store
            .add_to_cart(product("P1", 10), 1)
            .expect("add should succeed");

        // Storage changing underneath must not clobber in-memory state on a
        // repeated load for the same user.
        storage.put("cart_A", "[]").expect("put should succeed");

        store.load("A");

        assert_eq!(store.count(), 1, "repeated load must not re-hydrate");
    }

    #[test]
    fn load_drops_malformed_persisted_entries() {
        let storage = Arc::new(MemoryStorage::new());

        let valid = serde_json::json!({
            "key": "P1",
            "name": "Product P1",
            "manufacturer": null,
            "category": null,
            "quantity": 2,
            "batches": [{ "expiry": null, "price": "10", "stock": null }],
            "selected_batch": 0
        });
        let malformed = serde_json::json!({ "quantity": 3 });

        storage
            .put(
                "cart_A",
                &serde_json::json!([valid, malformed]).to_string(),
            )
            .expect("put should succeed");

        let store = CartStore::new(storage);
        store.load("A");

        assert_eq!(
            store.lines().len(),
            1,
            "entries without a resolvable identity must be dropped"
        );
        assert_eq!(store.count(), 2);
    }

    #[test]
    fn unparseable_persisted_cart_resets_to_empty() {
        let storage = Arc::new(MemoryStorage::new());

        storage.put("cart_A", "{not json").expect("put should succeed");

        let store = CartStore::new(storage);
        store.load("A");

        assert!(store.is_empty(), "a broken cart must reset, not block");
    }

    #[test]
    fn failed_writes_keep_the_in_memory_mutation() {
        let storage = Arc::new(MemoryStorage::new());
        let store = CartStore::new(storage.clone());

        store.load("A");
        storage.set_fail_writes(true);

        store
            .add_to_cart(product("P1", 10), 2)
            .expect("add should succeed despite the failed write");

        assert_eq!(
            store.count(),
            2,
            "the cart must stay usable when persistence fails"
        );
    }

    #[test]
    fn invalid_mutations_are_swallowed() {
        let store = CartStore::new(Arc::new(MemoryStorage::new()));

        store.load("A");

        // No identity: logged and ignored, never an error to the caller.
        store
            .add_to_cart(Product::default(), 1)
            .expect("identityless add should no-op");

        // Unknown line: same contract.
        store
            .increase_quantity(&key("missing"))
            .expect("unknown-line increment should no-op");

        assert!(store.is_empty());
    }

    #[test]
    fn stock_adjustments_reconcile_and_remove() -> TestResult {
        let storage = Arc::new(MemoryStorage::new());
        let store = CartStore::new(storage);

        store.load("A");
        store.add_to_cart(product("P1", 10), 5)?;
        store.add_to_cart(product("P2", 5), 2)?;

        store.apply_stock_adjustments(&[
            StockAdjustment {
                product_code: "P1".to_string(),
                available: 2,
            },
            StockAdjustment {
                product_code: "P2".to_string(),
                available: 0,
            },
        ])?;

        let lines = store.lines();

        assert_eq!(lines.len(), 1, "an out-of-stock line must be removed");

        let line = lines.first().expect("line should exist");

        assert_eq!(line.key(), &key("P1"));
        assert_eq!(line.quantity(), 2, "quantity must drop to availability");
        assert_eq!(line.stock(), Some(2), "the stock figure must reconcile");

        Ok(())
    }
}
