//! Orders: checkout, history, status tracking.

pub mod errors;
pub mod models;
pub mod service;
pub mod tracker;
pub mod view;

pub use errors::OrdersServiceError;
pub use models::{LineConflict, OrderHistoryFilter};
pub use service::OrdersService;
pub use tracker::{OrderSnapshot, OrderTracker};
pub use view::{ConfirmationState, DeliveryProgress};
