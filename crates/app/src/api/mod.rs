//! Backend API boundary.
//!
//! [`Backend`] is the typed surface of the remote storefront REST API;
//! [`HttpBackend`] implements it over HTTP, and [`AuthGateway`] layers the
//! refresh-and-retry-once authorization contract on top.

use async_trait::async_trait;
use jiff::civil::Date;
use mockall::automock;

pub mod errors;
pub mod models;

mod gateway;
mod http;

pub use errors::ApiError;
pub use gateway::AuthGateway;
pub use http::{ApiConfig, HttpBackend};

use crate::api::models::{
    Banner, Category, DeliveryReceipt, NewOrder, OrderAccepted, OrderPage, OrderStatus,
    ProductPage, RefreshedSession, ReportFormat, SignedIn, UserProfile,
};

/// The remote storefront backend.
///
/// Methods taking a `token` perform authorized calls; callers normally go
/// through [`AuthGateway`] rather than passing tokens directly.
#[automock]
#[async_trait]
pub trait Backend: Send + Sync {
    /// Exchanges credentials for a session.
    async fn sign_in(&self, login: &str, password: &str) -> Result<SignedIn, ApiError>;

    /// Mints a replacement access token from a refresh token.
    async fn refresh_session(&self, refresh_token: &str) -> Result<RefreshedSession, ApiError>;

    /// Starts the forgot-password flow (the backend sends an OTP).
    async fn request_password_reset(&self, login: &str) -> Result<(), ApiError>;

    /// Sets a new password and signs the user in.
    async fn set_password(&self, login: &str, password: &str) -> Result<SignedIn, ApiError>;

    /// One page of the product listing.
    async fn list_products(
        &self,
        token: &str,
        page: u32,
        limit: u32,
    ) -> Result<ProductPage, ApiError>;

    /// All product categories.
    async fn list_categories(&self, token: &str) -> Result<Vec<Category>, ApiError>;

    /// Storefront banners.
    async fn list_banners(&self, token: &str) -> Result<Vec<Banner>, ApiError>;

    /// One page of the customer's order history.
    async fn customer_orders(
        &self,
        token: &str,
        page: u32,
        limit: u32,
    ) -> Result<OrderPage, ApiError>;

    /// The per-stage status record of one order.
    async fn order_status(&self, token: &str, order_id: &str) -> Result<OrderStatus, ApiError>;

    /// Submits an order. Insufficient stock surfaces as
    /// [`ApiError::StockConflict`].
    async fn submit_order(&self, token: &str, order: &NewOrder) -> Result<OrderAccepted, ApiError>;

    /// Confirms receipt of a delivered order.
    async fn confirm_delivery(
        &self,
        token: &str,
        order_id: &str,
    ) -> Result<DeliveryReceipt, ApiError>;

    /// Aggregated sales report over a date range.
    async fn sales_report(
        &self,
        token: &str,
        from: Date,
        to: Date,
    ) -> Result<serde_json::Value, ApiError>;

    /// Per-order report export (PDF or XLSX bytes).
    async fn order_report(
        &self,
        token: &str,
        order_code: &str,
        format: ReportFormat,
    ) -> Result<Vec<u8>, ApiError>;

    /// The current user's profile record.
    async fn profile(&self, token: &str) -> Result<Option<UserProfile>, ApiError>;
}
