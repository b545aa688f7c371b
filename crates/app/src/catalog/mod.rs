//! Catalog browsing.

pub mod service;

pub use service::{CatalogError, CatalogService, ProductFilter};
