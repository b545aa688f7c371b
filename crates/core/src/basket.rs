//! Basket
//!
//! The client-side cart model: at most one line per [`ProductKey`], with
//! merge-on-add, a quantity floor of 1, and batch-aware price/stock
//! resolution. All mutations keep the basket consistent; callers that mirror
//! the storefront screens treat errors as log-and-ignore conditions.

use jiff::Timestamp;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::products::{Batch, Product, ProductKey, sort_batches};

/// Errors from basket mutations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BasketError {
    /// The product record carries no resolvable identity.
    #[error("product has no resolvable identity")]
    MissingIdentity,

    /// No line with the given key exists.
    #[error("no basket line for `{0}`")]
    UnknownLine(ProductKey),

    /// A direct quantity set below the floor of 1.
    #[error("quantity must be at least 1")]
    InvalidQuantity,

    /// Batch index outside the line's batch list.
    #[error("batch index {index} out of range for `{key}`")]
    BatchOutOfRange {
        /// Line the selection was attempted on.
        key: ProductKey,
        /// Rejected index.
        index: usize,
    },
}

/// One basket line: a product identity, its display fields, the chosen
/// quantity, and the batch the price/stock figures come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasketLine {
    key: ProductKey,

    /// Display name.
    pub name: String,

    /// Manufacturer display field.
    pub manufacturer: Option<String>,

    /// Category key.
    pub category: Option<String>,

    quantity: u32,
    batches: Vec<Batch>,
    selected_batch: usize,
}

impl BasketLine {
    fn from_product(product: Product, quantity: u32) -> Result<Self, BasketError> {
        let key = product.key().ok_or(BasketError::MissingIdentity)?;

        let mut batches = product.batches;
        sort_batches(&mut batches);

        let mut line = Self {
            key,
            name: product.name,
            manufacturer: product.manufacturer,
            category: product.category,
            quantity: 1,
            batches,
            selected_batch: 0,
        };
        line.quantity = line.clamped(quantity);

        Ok(line)
    }

    /// The line's stable identity.
    #[must_use]
    pub fn key(&self) -> &ProductKey {
        &self.key
    }

    /// Chosen quantity, always ≥ 1.
    #[must_use]
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// All batches of the line, in FEFO order.
    #[must_use]
    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }

    /// Index of the currently selected batch.
    #[must_use]
    pub fn selected_batch_index(&self) -> usize {
        self.selected_batch
    }

    /// The currently selected batch, if the line has any batches at all.
    #[must_use]
    pub fn selected_batch(&self) -> Option<&Batch> {
        self.batches.get(self.selected_batch)
    }

    /// Unit price of the selected batch; zero when the line has no batches.
    #[must_use]
    pub fn unit_price(&self) -> Decimal {
        self.selected_batch()
            .map_or(Decimal::ZERO, |batch| batch.price)
    }

    /// Expiry of the selected batch.
    #[must_use]
    pub fn expiry(&self) -> Option<Timestamp> {
        self.selected_batch().and_then(|batch| batch.expiry)
    }

    /// Last-known stock of the selected batch.
    #[must_use]
    pub fn stock(&self) -> Option<u32> {
        self.selected_batch().and_then(|batch| batch.stock)
    }

    /// Quantity × unit price.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price() * Decimal::from(self.quantity)
    }

    /// Reconciles the selected batch's stock with a server-reported figure,
    /// pulling the quantity down when it now exceeds availability.
    pub fn reconcile_stock(&mut self, stock: u32) {
        if let Some(batch) = self.batches.get_mut(self.selected_batch) {
            batch.stock = Some(stock);
        }

        self.quantity = self.clamped(self.quantity);
    }

    /// Clamp a requested quantity to the selected batch's known stock,
    /// flooring at 1. Unknown stock passes the request through.
    fn clamped(&self, quantity: u32) -> u32 {
        match self.selected_batch().and_then(|batch| batch.stock) {
            Some(stock) => quantity.min(stock).max(1),
            None => quantity.max(1),
        }
    }

    /// Repairs a line restored from persisted state, dropping it when its
    /// identity is unresolvable.
    fn sanitized(mut self) -> Option<Self> {
        if self.key.as_str().trim().is_empty() {
            return None;
        }

        if self.selected_batch >= self.batches.len() {
            self.selected_batch = 0;
        }

        self.quantity = self.clamped(self.quantity);

        Some(self)
    }
}

/// The basket: an ordered set of lines, exactly one per product key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Basket {
    lines: Vec<BasketLine>,
}

impl Basket {
    /// Creates an empty basket.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a basket from persisted lines, silently dropping entries
    /// without a resolvable identity and repairing out-of-range state.
    #[must_use]
    pub fn from_lines(lines: Vec<BasketLine>) -> Self {
        Self {
            lines: lines
                .into_iter()
                .filter_map(BasketLine::sanitized)
                .collect(),
        }
    }

    /// All lines, in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[BasketLine] {
        &self.lines
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the basket holds no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Looks up a line by key.
    #[must_use]
    pub fn get(&self, key: &ProductKey) -> Option<&BasketLine> {
        self.lines.iter().find(|line| line.key == *key)
    }

    fn get_mut(&mut self, key: &ProductKey) -> Result<&mut BasketLine, BasketError> {
        self.lines
            .iter_mut()
            .find(|line| line.key == *key)
            .ok_or_else(|| BasketError::UnknownLine(key.clone()))
    }

    /// Adds a product: merges into the existing line for the same key by
    /// incrementing its quantity, or appends a new line with the earliest
    /// expiring batch selected.
    ///
    /// # Errors
    ///
    /// Returns [`BasketError::MissingIdentity`] when the product has no
    /// resolvable key.
    pub fn add(&mut self, product: Product, quantity: u32) -> Result<&BasketLine, BasketError> {
        let key = product.key().ok_or(BasketError::MissingIdentity)?;

        if let Some(position) = self.lines.iter().position(|line| line.key == key) {
            let line = self
                .lines
                .get_mut(position)
                .ok_or_else(|| BasketError::UnknownLine(key.clone()))?;

            line.quantity = line.clamped(line.quantity.saturating_add(quantity.max(1)));

            return self
                .lines
                .get(position)
                .ok_or(BasketError::UnknownLine(key));
        }

        self.lines.push(BasketLine::from_product(product, quantity)?);

        self.lines.last().ok_or(BasketError::UnknownLine(key))
    }

    /// Increments a line's quantity by one.
    ///
    /// # Errors
    ///
    /// Returns [`BasketError::UnknownLine`] when no line matches.
    pub fn increase(&mut self, key: &ProductKey) -> Result<u32, BasketError> {
        let line = self.get_mut(key)?;
        line.quantity = line.clamped(line.quantity.saturating_add(1));

        Ok(line.quantity)
    }

    /// Decrements a line's quantity by one, floored at 1. A line is never
    /// removed by decrementing; removal is always explicit.
    ///
    /// # Errors
    ///
    /// Returns [`BasketError::UnknownLine`] when no line matches.
    pub fn decrease(&mut self, key: &ProductKey) -> Result<u32, BasketError> {
        let line = self.get_mut(key)?;
        line.quantity = line.quantity.saturating_sub(1).max(1);

        Ok(line.quantity)
    }

    /// Sets a line's quantity directly.
    ///
    /// # Errors
    ///
    /// Returns [`BasketError::InvalidQuantity`] for values below 1 and
    /// [`BasketError::UnknownLine`] when no line matches.
    pub fn set_quantity(&mut self, key: &ProductKey, quantity: u32) -> Result<u32, BasketError> {
        if quantity < 1 {
            return Err(BasketError::InvalidQuantity);
        }

        let line = self.get_mut(key)?;
        line.quantity = line.clamped(quantity);

        Ok(line.quantity)
    }

    /// Selects which batch a line's price/stock figures come from, clamping
    /// the quantity to the new batch's stock.
    ///
    /// # Errors
    ///
    /// Returns [`BasketError::BatchOutOfRange`] for an index outside the
    /// line's batch list and [`BasketError::UnknownLine`] when no line
    /// matches.
    pub fn select_batch(&mut self, key: &ProductKey, index: usize) -> Result<(), BasketError> {
        let line = self.get_mut(key)?;

        if index >= line.batches.len() {
            return Err(BasketError::BatchOutOfRange {
                key: key.clone(),
                index,
            });
        }

        line.selected_batch = index;
        line.quantity = line.clamped(line.quantity);

        Ok(())
    }

    /// Reconciles a line's selected batch with a server-reported stock
    /// figure, pulling the quantity down when it now exceeds availability.
    /// Returns the resulting quantity.
    ///
    /// # Errors
    ///
    /// Returns [`BasketError::UnknownLine`] when no line matches.
    pub fn reconcile_stock(&mut self, key: &ProductKey, stock: u32) -> Result<u32, BasketError> {
        let line = self.get_mut(key)?;
        line.reconcile_stock(stock);

        Ok(line.quantity())
    }

    /// Removes a line unconditionally.
    ///
    /// # Errors
    ///
    /// Returns [`BasketError::UnknownLine`] when no line matches.
    pub fn remove(&mut self, key: &ProductKey) -> Result<BasketLine, BasketError> {
        let position = self
            .lines
            .iter()
            .position(|line| line.key == *key)
            .ok_or_else(|| BasketError::UnknownLine(key.clone()))?;

        Ok(self.lines.remove(position))
    }

    /// Empties the basket.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Sum of all line quantities — the badge figure.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.lines
            .iter()
            .fold(0, |sum, line| sum.saturating_add(line.quantity))
    }

    /// Sum of all line totals.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.lines.iter().map(BasketLine::line_total).sum()
    }
}
