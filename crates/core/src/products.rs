//! Products

use jiff::Timestamp;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Stable identity of a product within a basket.
///
/// Resolved once at the API boundary and persisted with the basket line, so
/// that the same product record always merges into the same line across
/// sessions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductKey(pub(crate) String);

impl ProductKey {
    /// Creates a key from a non-empty identity string.
    ///
    /// Returns `None` for empty or whitespace-only input; such a value can
    /// never serve as a merge key.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();

        if value.trim().is_empty() {
            None
        } else {
            Some(Self(value))
        }
    }

    /// The underlying identity string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProductKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A stock batch of a product: one lot with its own expiry, price, and
/// stock-on-hand figure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    /// Expiry of the lot; `None` when the backend reported no expiry (or the
    /// epoch-zero sentinel).
    pub expiry: Option<Timestamp>,

    /// Unit price when this batch is selected.
    pub price: Decimal,

    /// Stock-on-hand; `None` when the backend did not report a figure.
    pub stock: Option<u32>,
}

/// Sorts batches ascending by expiry, earliest first, with batches lacking an
/// expiry last (FEFO order: the default selection is index 0).
pub fn sort_batches(batches: &mut [Batch]) {
    batches.sort_by_key(|batch| (batch.expiry.is_none(), batch.expiry));
}

/// A normalized product record.
///
/// The backend exposes several identity fields; the first present one (in
/// `id` → `code` → `article` order) becomes the [`ProductKey`]. Display
/// fields pass through untyped backend records unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Canonical backend identifier, when present.
    pub id: Option<String>,

    /// Primary code field, used when `id` is absent.
    pub code: Option<String>,

    /// Secondary (article) code field, the last identity fallback.
    pub article: Option<String>,

    /// Display name.
    pub name: String,

    /// Manufacturer display field.
    pub manufacturer: Option<String>,

    /// Category key the product belongs to.
    pub category: Option<String>,

    /// Stock batches, in FEFO order.
    pub batches: Vec<Batch>,
}

impl Product {
    /// Resolves the stable basket identity for this product.
    ///
    /// Falls back through `id` → `code` → `article`; empty strings are
    /// treated as absent. Returns `None` when no identity can be resolved —
    /// such a product cannot participate in a basket.
    #[must_use]
    pub fn key(&self) -> Option<ProductKey> {
        [&self.id, &self.code, &self.article]
            .into_iter()
            .flatten()
            .find_map(|value| ProductKey::new(value.clone()))
    }

    /// The batch a fresh basket line would select: the earliest expiring one.
    ///
    /// Assumes `batches` is already in FEFO order, as produced by
    /// normalization.
    #[must_use]
    pub fn lead_batch(&self) -> Option<&Batch> {
        self.batches.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(expiry: Option<&str>, price: i64) -> Batch {
        Batch {
            expiry: expiry.map(|raw| raw.parse().expect("test expiry should parse")),
            price: Decimal::from(price),
            stock: None,
        }
    }

    #[test]
    fn key_prefers_canonical_id() {
        let product = Product {
            id: Some("P1".to_string()),
            code: Some("C1".to_string()),
            article: Some("A1".to_string()),
            ..Product::default()
        };

        assert_eq!(product.key().map(|k| k.to_string()), Some("P1".to_string()));
    }

    #[test]
    fn key_falls_back_to_code_then_article() {
        let product = Product {
            code: Some("C1".to_string()),
            article: Some("A1".to_string()),
            ..Product::default()
        };

        assert_eq!(product.key().map(|k| k.to_string()), Some("C1".to_string()));

        let product = Product {
            article: Some("A1".to_string()),
            ..Product::default()
        };

        assert_eq!(product.key().map(|k| k.to_string()), Some("A1".to_string()));
    }

    #[test]
    fn key_resolution_is_deterministic() {
        let product = Product {
            code: Some("C-42".to_string()),
            ..Product::default()
        };

        let first = product.key();
        let second = product.key();

        assert_eq!(first, second, "repeated resolution must yield the same key");
    }

    #[test]
    fn key_skips_empty_identity_fields() {
        let product = Product {
            id: Some(String::new()),
            code: Some("  ".to_string()),
            article: Some("A9".to_string()),
            ..Product::default()
        };

        assert_eq!(product.key().map(|k| k.to_string()), Some("A9".to_string()));
    }

    #[test]
    fn key_is_none_without_any_identity() {
        assert_eq!(Product::default().key(), None);
    }

    #[test]
    fn batches_sort_earliest_expiry_first_missing_last() {
        let mut batches = vec![
            batch(None, 30),
            batch(Some("2026-06-01T00:00:00Z"), 20),
            batch(Some("2025-11-01T00:00:00Z"), 10),
        ];

        sort_batches(&mut batches);

        let prices: Vec<_> = batches.iter().map(|b| b.price).collect();

        assert_eq!(
            prices,
            vec![Decimal::from(10), Decimal::from(20), Decimal::from(30)],
            "earliest expiry must come first, no-expiry batches last"
        );
    }
}
