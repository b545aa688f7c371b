//! Catalog service.
//!
//! Pagination is server-side; name/category/price filtering happens on the
//! fetched page, mirroring the storefront's search screen.

use std::sync::Arc;

use apotheca::products::Product;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::api::{
    ApiError, AuthGateway,
    models::{Banner, Category, ProductPage},
};

/// Errors from catalog lookups.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Underlying API failure.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Client-side listing filter.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Case-insensitive name substring.
    pub name: Option<String>,

    /// Category key the product must belong to.
    pub category: Option<String>,

    /// Inclusive lower price bound.
    pub min_price: Option<Decimal>,

    /// Inclusive upper price bound.
    pub max_price: Option<Decimal>,
}

impl ProductFilter {
    /// Whether a product passes the filter. Prices are judged on the lead
    /// (earliest expiring) batch, the one a fresh basket line would select.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(needle) = &self.name {
            let name = product.name.to_lowercase();

            if !name.contains(&needle.to_lowercase()) {
                return false;
            }
        }

        if let Some(category) = &self.category
            && product.category.as_deref() != Some(category.as_str())
        {
            return false;
        }

        let price = product
            .lead_batch()
            .map_or(Decimal::ZERO, |batch| batch.price);

        if let Some(min) = self.min_price
            && price < min
        {
            return false;
        }

        if let Some(max) = self.max_price
            && price > max
        {
            return false;
        }

        true
    }
}

/// Product and category browsing over the authorized gateway.
#[derive(Debug, Clone)]
pub struct CatalogService {
    gateway: Arc<AuthGateway>,
}

impl CatalogService {
    /// Creates the service.
    #[must_use]
    pub fn new(gateway: Arc<AuthGateway>) -> Self {
        Self { gateway }
    }

    /// One page of the raw product listing.
    ///
    /// # Errors
    ///
    /// Returns the underlying API failure.
    pub async fn products_page(&self, page: u32, limit: u32) -> Result<ProductPage, CatalogError> {
        self.gateway
            .run(|backend, token| async move { backend.list_products(&token, page, limit).await })
            .await
            .map_err(CatalogError::from)
    }

    /// One page of the listing with the filter applied to it.
    ///
    /// # Errors
    ///
    /// Returns the underlying API failure.
    pub async fn search(
        &self,
        filter: &ProductFilter,
        page: u32,
        limit: u32,
    ) -> Result<ProductPage, CatalogError> {
        let mut listing = self.products_page(page, limit).await?;

        listing.products.retain(|product| filter.matches(product));

        Ok(listing)
    }

    /// All product categories.
    ///
    /// # Errors
    ///
    /// Returns the underlying API failure.
    pub async fn categories(&self) -> Result<Vec<Category>, CatalogError> {
        self.gateway
            .run(|backend, token| async move { backend.list_categories(&token).await })
            .await
            .map_err(CatalogError::from)
    }

    /// Storefront banners.
    ///
    /// # Errors
    ///
    /// Returns the underlying API failure.
    pub async fn banners(&self) -> Result<Vec<Banner>, CatalogError> {
        self.gateway
            .run(|backend, token| async move { backend.list_banners(&token).await })
            .await
            .map_err(CatalogError::from)
    }
}
