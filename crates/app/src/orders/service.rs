//! Orders service.

use std::sync::Arc;

use apotheca::basket::BasketLine;
use jiff::civil::Date;
use tracing::{debug, info};

use crate::{
    api::{
        ApiError, AuthGateway,
        models::{
            DeliveryReceipt, NewOrder, NewOrderItem, OrderAccepted, OrderPage, OrderStatus,
            ReportFormat,
        },
    },
    orders::{OrdersServiceError, models::LineConflict},
};

/// Checkout, history, and status over the authorized gateway.
#[derive(Debug, Clone)]
pub struct OrdersService {
    gateway: Arc<AuthGateway>,
}

impl OrdersService {
    /// Creates the service.
    #[must_use]
    pub fn new(gateway: Arc<AuthGateway>) -> Self {
        Self { gateway }
    }

    /// Submits the given basket lines as an order.
    ///
    /// Quantities are validated against last-known batch stock before the
    /// backend is contacted; both the local check and the backend's own
    /// rejection surface as [`OrdersServiceError::StockConflict`] so the
    /// caller runs one adjust-and-resubmit loop for either.
    ///
    /// # Errors
    ///
    /// Returns [`OrdersServiceError::EmptyCart`] without submittable lines,
    /// [`OrdersServiceError::StockConflict`] on insufficient stock, or the
    /// underlying API failure.
    pub async fn submit_order(
        &self,
        lines: &[BasketLine],
    ) -> Result<OrderAccepted, OrdersServiceError> {
        let submittable: Vec<&BasketLine> = lines
            .iter()
            .filter(|line| !line.name.trim().is_empty())
            .collect();

        if submittable.is_empty() {
            return Err(OrdersServiceError::EmptyCart);
        }

        let local_conflicts: Vec<LineConflict> = submittable
            .iter()
            .filter_map(|line| {
                let stock = line.stock()?;

                (line.quantity() > stock).then(|| LineConflict {
                    product_code: line.key().to_string(),
                    name: Some(line.name.clone()),
                    requested: line.quantity(),
                    available: stock,
                })
            })
            .collect();

        if !local_conflicts.is_empty() {
            debug!(
                lines = local_conflicts.len(),
                "blocking submission on last-known stock"
            );

            return Err(OrdersServiceError::StockConflict(local_conflicts));
        }

        let order = NewOrder {
            items: submittable
                .iter()
                .map(|line| NewOrderItem {
                    name: line.name.clone(),
                    price: line.unit_price(),
                    product_code: line.key().to_string(),
                    quantity: line.quantity(),
                    expiry: line.expiry(),
                })
                .collect(),
        };

        let result = self
            .gateway
            .run(move |backend, token| {
                let order = order.clone();

                async move { backend.submit_order(&token, &order).await }
            })
            .await;

        match result {
            Ok(accepted) => {
                info!(code = accepted.code.as_deref(), "order accepted");

                Ok(accepted)
            }
            Err(ApiError::StockConflict(adjustments)) => {
                let conflicts = adjustments
                    .into_iter()
                    .map(|adjustment| {
                        let line = submittable
                            .iter()
                            .find(|line| line.key().as_str() == adjustment.product_code);

                        LineConflict {
                            name: line.map(|line| line.name.clone()),
                            requested: line.map_or(0, |line| line.quantity()),
                            product_code: adjustment.product_code,
                            available: adjustment.available,
                        }
                    })
                    .collect();

                Err(OrdersServiceError::StockConflict(conflicts))
            }
            Err(error) => Err(error.into()),
        }
    }

    /// One page of the customer's order history.
    ///
    /// # Errors
    ///
    /// Returns the underlying API failure.
    pub async fn history(&self, page: u32, limit: u32) -> Result<OrderPage, OrdersServiceError> {
        self.gateway
            .run(|backend, token| async move { backend.customer_orders(&token, page, limit).await })
            .await
            .map_err(OrdersServiceError::from)
    }

    /// The per-stage status record of one order.
    ///
    /// # Errors
    ///
    /// Returns the underlying API failure.
    pub async fn order_status(&self, order_id: &str) -> Result<OrderStatus, OrdersServiceError> {
        let order_id = order_id.to_string();

        self.gateway
            .run(move |backend, token| {
                let order_id = order_id.clone();

                async move { backend.order_status(&token, &order_id).await }
            })
            .await
            .map_err(OrdersServiceError::from)
    }

    /// Confirms receipt of an order.
    ///
    /// # Errors
    ///
    /// Returns the underlying API failure.
    pub async fn confirm_receipt(
        &self,
        order_id: &str,
    ) -> Result<DeliveryReceipt, OrdersServiceError> {
        let order_id = order_id.to_string();

        self.gateway
            .run(move |backend, token| {
                let order_id = order_id.clone();

                async move { backend.confirm_delivery(&token, &order_id).await }
            })
            .await
            .map_err(OrdersServiceError::from)
    }

    /// Aggregated sales report over a date range.
    ///
    /// # Errors
    ///
    /// Returns the underlying API failure.
    pub async fn sales_report(
        &self,
        from: Date,
        to: Date,
    ) -> Result<serde_json::Value, OrdersServiceError> {
        self.gateway
            .run(move |backend, token| async move { backend.sales_report(&token, from, to).await })
            .await
            .map_err(OrdersServiceError::from)
    }

    /// Per-order report export (PDF or XLSX bytes).
    ///
    /// # Errors
    ///
    /// Returns the underlying API failure.
    pub async fn export_report(
        &self,
        order_code: &str,
        format: ReportFormat,
    ) -> Result<Vec<u8>, OrdersServiceError> {
        let order_code = order_code.to_string();

        self.gateway
            .run(move |backend, token| {
                let order_code = order_code.clone();

                async move { backend.order_report(&token, &order_code, format).await }
            })
            .await
            .map_err(OrdersServiceError::from)
    }
}

#[cfg(test)]
mod tests {
    use apotheca::{
        basket::Basket,
        products::{Batch, Product},
    };
    use rust_decimal::Decimal;

    use crate::{
        api::{
            Backend, MockBackend,
            models::{OrderAccepted, StockAdjustment},
        },
        test::helpers::authenticated_session,
    };

    use super::*;

    fn service_over(backend: MockBackend) -> OrdersService {
        let backend: Arc<dyn Backend> = Arc::new(backend);
        let session = authenticated_session(Arc::clone(&backend));

        OrdersService::new(Arc::new(AuthGateway::new(backend, session)))
    }

    fn lines_with(id: &str, quantity: u32, stock: Option<u32>) -> Vec<BasketLine> {
        let mut basket = Basket::new();

        basket
            .add(
                Product {
                    id: Some(id.to_string()),
                    name: format!("Product {id}"),
                    batches: vec![Batch {
                        expiry: None,
                        price: Decimal::from(10),
                        stock,
                    }],
                    ..Product::default()
                },
                quantity,
            )
            .expect("add should succeed");

        basket.lines().to_vec()
    }

    #[tokio::test]
    async fn empty_cart_is_rejected_before_the_backend() {
        let service = service_over(MockBackend::new());

        let result = service.submit_order(&[]).await;

        assert!(
            matches!(result, Err(OrdersServiceError::EmptyCart)),
            "expected EmptyCart, got {result:?}"
        );
    }

    #[tokio::test]
    async fn local_stock_check_blocks_oversubmission() {
        // Stock 2 against requested 5: no expectations are registered, so
        // any backend call would fail the test.
        let service = service_over(MockBackend::new());

        // A line whose quantity predates the stock figure — restored from an
        // older persisted cart, bypassing the live clamping paths.
        let stale: BasketLine = serde_json::from_value(serde_json::json!({
            "key": "P1",
            "name": "Product P1",
            "manufacturer": null,
            "category": null,
            "quantity": 5,
            "batches": [{ "expiry": null, "price": "10", "stock": 2 }],
            "selected_batch": 0
        }))
        .expect("line should deserialize");

        let conflicts = match service.submit_order(&[stale]).await {
            Err(OrdersServiceError::StockConflict(conflicts)) => conflicts,
            other => panic!("expected StockConflict, got {other:?}"),
        };

        assert_eq!(
            conflicts,
            vec![LineConflict {
                product_code: "P1".to_string(),
                name: Some("Product P1".to_string()),
                requested: 5,
                available: 2,
            }]
        );
    }

    #[tokio::test]
    async fn server_conflict_maps_onto_local_lines() {
        let mut backend = MockBackend::new();

        backend.expect_submit_order().times(1).returning(|_, _| {
            Err(crate::api::ApiError::StockConflict(vec![StockAdjustment {
                product_code: "P1".to_string(),
                available: 2,
            }]))
        });

        let service = service_over(backend);
        let lines = lines_with("P1", 5, None);

        let conflicts = match service.submit_order(&lines).await {
            Err(OrdersServiceError::StockConflict(conflicts)) => conflicts,
            other => panic!("expected StockConflict, got {other:?}"),
        };

        assert_eq!(
            conflicts,
            vec![LineConflict {
                product_code: "P1".to_string(),
                name: Some("Product P1".to_string()),
                requested: 5,
                available: 2,
            }]
        );
    }

    #[tokio::test]
    async fn successful_submission_passes_the_payload_through() {
        let mut backend = MockBackend::new();

        backend
            .expect_submit_order()
            .withf(|_, order| {
                order.items.len() == 1
                    && order.items.first().is_some_and(|item| {
                        item.product_code == "P1" && item.quantity == 3 && item.name == "Product P1"
                    })
            })
            .times(1)
            .returning(|_, _| {
                Ok(OrderAccepted {
                    id: Some("42".to_string()),
                    code: Some("Z-1042".to_string()),
                })
            });

        let service = service_over(backend);
        let lines = lines_with("P1", 3, None);

        let accepted = service
            .submit_order(&lines)
            .await
            .expect("submission should succeed");

        assert_eq!(accepted.code.as_deref(), Some("Z-1042"));
    }

    #[tokio::test]
    async fn nameless_lines_are_not_submitted() {
        let service = service_over(MockBackend::new());

        let mut basket = Basket::new();
        basket
            .add(
                Product {
                    id: Some("P1".to_string()),
                    name: String::new(),
                    ..Product::default()
                },
                1,
            )
            .expect("add should succeed");

        let result = service.submit_order(basket.lines()).await;

        assert!(
            matches!(result, Err(OrdersServiceError::EmptyCart)),
            "lines without a display name are filtered, got {result:?}"
        );
    }
}
