//! Order status tracker.
//!
//! A cancellable polling task tied to one "viewing this order" scope: it
//! re-fetches the status record on a fixed interval, publishes snapshots
//! over a watch channel, and stops on its own when the order reaches the
//! terminal stage — or when the scope ends via [`OrderTracker::stop`].

use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use apotheca::status::StageFlags;
use jiff::Zoned;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::orders::{
    OrdersService, OrdersServiceError,
    view::{ConfirmationState, DeliveryProgress},
};

/// One published view of a tracked order.
#[derive(Debug, Clone)]
pub struct OrderSnapshot {
    /// Tracked order.
    pub order_id: String,

    /// Effective stage record (server truth plus any optimistic overlay).
    pub flags: StageFlags,

    /// State of the receipt confirmation.
    pub confirmation: ConfirmationState,
}

/// Handle to a running status poll for one order.
pub struct OrderTracker {
    orders: Arc<OrdersService>,
    order_id: String,
    progress: Arc<Mutex<DeliveryProgress>>,
    snapshots: Arc<watch::Sender<OrderSnapshot>>,
    stop: watch::Sender<bool>,
    task: tokio::task::JoinHandle<()>,
}

impl OrderTracker {
    /// Starts polling `order_id` every `interval`. The first fetch happens
    /// immediately.
    #[must_use]
    pub fn spawn(orders: Arc<OrdersService>, order_id: String, interval: Duration) -> Self {
        let progress = Arc::new(Mutex::new(DeliveryProgress::default()));
        let (snapshots, _) = watch::channel(OrderSnapshot {
            order_id: order_id.clone(),
            flags: StageFlags::default(),
            confirmation: ConfirmationState::Idle,
        });
        let snapshots = Arc::new(snapshots);
        let (stop, stop_rx) = watch::channel(false);

        let task = tokio::spawn(poll_loop(
            Arc::clone(&orders),
            order_id.clone(),
            Arc::clone(&progress),
            Arc::clone(&snapshots),
            stop_rx,
            interval,
        ));

        Self {
            orders,
            order_id,
            progress,
            snapshots,
            stop,
            task,
        }
    }

    /// Subscribes to published snapshots.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<OrderSnapshot> {
        self.snapshots.subscribe()
    }

    /// The most recently published snapshot.
    #[must_use]
    pub fn latest(&self) -> OrderSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Confirms receipt: flips the terminal flag optimistically, issues the
    /// confirmation, and reconciles — adopting the server-echoed timestamp
    /// on success, reverting to the last server snapshot on failure. An
    /// in-flight poll tick may interleave; both sides are last-write-wins
    /// and converge on the server's answer.
    ///
    /// # Errors
    ///
    /// Returns [`OrdersServiceError::ConfirmNotAvailable`] outside the
    /// confirmation window, or the underlying API failure.
    pub async fn confirm_receipt(&self) -> Result<(), OrdersServiceError> {
        {
            let mut progress = lock(&self.progress);

            progress.begin_confirm(Zoned::now().datetime())?;
            publish(&self.snapshots, &self.order_id, &progress);
        }

        match self.orders.confirm_receipt(&self.order_id).await {
            Ok(receipt) => {
                let mut progress = lock(&self.progress);

                progress.confirm_succeeded(receipt.delivered_at);
                publish(&self.snapshots, &self.order_id, &progress);

                Ok(())
            }
            Err(error) => {
                warn!(order_id = %self.order_id, "receipt confirmation failed: {error}");

                let mut progress = lock(&self.progress);

                progress.confirm_failed();
                publish(&self.snapshots, &self.order_id, &progress);

                Err(error)
            }
        }
    }

    /// Whether the polling task has ended (terminal stage or stop).
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Ends the polling scope and waits for the task to wind down.
    pub async fn stop(self) {
        let _ = self.stop.send(true);
        let _ = self.task.await;
    }
}

impl std::fmt::Debug for OrderTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderTracker")
            .field("order_id", &self.order_id)
            .field("finished", &self.is_finished())
            .finish_non_exhaustive()
    }
}

fn lock(progress: &Mutex<DeliveryProgress>) -> std::sync::MutexGuard<'_, DeliveryProgress> {
    progress.lock().unwrap_or_else(PoisonError::into_inner)
}

fn publish(
    snapshots: &watch::Sender<OrderSnapshot>,
    order_id: &str,
    progress: &DeliveryProgress,
) {
    // Receivers may all be gone; the tracker keeps its own state regardless.
    snapshots.send_replace(OrderSnapshot {
        order_id: order_id.to_string(),
        flags: progress.effective(),
        confirmation: progress.confirmation(),
    });
}

async fn poll_loop(
    orders: Arc<OrdersService>,
    order_id: String,
    progress: Arc<Mutex<DeliveryProgress>>,
    snapshots: Arc<watch::Sender<OrderSnapshot>>,
    mut stop_rx: watch::Receiver<bool>,
    interval: Duration,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            changed = stop_rx.changed() => {
                if changed.is_err() || *stop_rx.borrow() {
                    debug!(%order_id, "status polling stopped");

                    break;
                }
            }
            _ = ticker.tick() => {
                match orders.order_status(&order_id).await {
                    Ok(status) => {
                        let delivered = {
                            let mut progress = lock(&progress);

                            progress.apply_server(status.flags);
                            publish(&snapshots, &order_id, &progress);

                            progress.effective().is_delivered()
                        };

                        if delivered {
                            debug!(%order_id, "order delivered, polling complete");

                            break;
                        }
                    }
                    // Poll failures are transient by assumption; the next
                    // tick retries.
                    Err(error) => warn!(%order_id, "status poll failed: {error}"),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use apotheca::status::OrderStage;
    use mockall::Sequence;

    use crate::{
        api::{
            ApiError, AuthGateway, Backend, MockBackend,
            models::{DeliveryReceipt, OrderStatus},
        },
        test::helpers::{authenticated_session, reached_through},
    };

    use super::*;

    fn orders_over(backend: MockBackend) -> Arc<OrdersService> {
        let backend: Arc<dyn Backend> = Arc::new(backend);
        let session = authenticated_session(Arc::clone(&backend));

        Arc::new(OrdersService::new(Arc::new(AuthGateway::new(
            backend, session,
        ))))
    }

    #[tokio::test(start_paused = true)]
    async fn polling_publishes_progress_and_stops_at_terminal() {
        let mut backend = MockBackend::new();
        let mut sequence = Sequence::new();

        backend
            .expect_order_status()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_, order_id| {
                Ok(OrderStatus {
                    order_id: order_id.to_string(),
                    flags: reached_through(OrderStage::InTransit),
                })
            });

        backend
            .expect_order_status()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_, order_id| {
                Ok(OrderStatus {
                    order_id: order_id.to_string(),
                    flags: reached_through(OrderStage::Delivered),
                })
            });

        let tracker = OrderTracker::spawn(
            orders_over(backend),
            "42".to_string(),
            Duration::from_secs(10),
        );
        let mut snapshots = tracker.subscribe();

        snapshots.changed().await.expect("first tick should publish");

        assert_eq!(
            snapshots.borrow_and_update().flags.current_stage(),
            OrderStage::InTransit
        );

        snapshots
            .changed()
            .await
            .expect("second tick should publish");

        assert!(snapshots.borrow_and_update().flags.is_delivered());

        // Terminal stage ends the poll on its own; with paused time this
        // completes without waiting out further intervals.
        tracker.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn poll_errors_are_transient() {
        let mut backend = MockBackend::new();
        let mut sequence = Sequence::new();

        backend
            .expect_order_status()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_, _| {
                Err(ApiError::UnexpectedResponse("backend hiccup".to_string()))
            });

        backend
            .expect_order_status()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_, order_id| {
                Ok(OrderStatus {
                    order_id: order_id.to_string(),
                    flags: reached_through(OrderStage::Delivered),
                })
            });

        let tracker = OrderTracker::spawn(
            orders_over(backend),
            "42".to_string(),
            Duration::from_secs(10),
        );
        let mut snapshots = tracker.subscribe();

        snapshots
            .changed()
            .await
            .expect("the tick after a failure should publish");

        assert!(snapshots.borrow_and_update().flags.is_delivered());

        tracker.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn failed_confirmation_reverts_the_snapshot() {
        let mut backend = MockBackend::new();

        backend.expect_order_status().returning(|_, order_id| {
            Ok(OrderStatus {
                order_id: order_id.to_string(),
                flags: reached_through(OrderStage::InTransit),
            })
        });

        backend
            .expect_confirm_delivery()
            .times(1)
            .returning(|_, _| {
                Err(ApiError::UnexpectedResponse("rejected".to_string()))
            });

        let tracker = OrderTracker::spawn(
            orders_over(backend),
            "42".to_string(),
            Duration::from_secs(10),
        );
        let mut snapshots = tracker.subscribe();

        snapshots.changed().await.expect("first tick should publish");

        let result = tracker.confirm_receipt().await;

        assert!(result.is_err(), "the backend rejected the confirmation");

        let latest = tracker.latest();

        assert_eq!(latest.confirmation, ConfirmationState::Failed);
        assert!(
            !latest.flags.is_delivered(),
            "a failed confirmation must revert to the server snapshot"
        );

        tracker.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn successful_confirmation_adopts_the_server_receipt() {
        let mut backend = MockBackend::new();

        backend.expect_order_status().returning(|_, order_id| {
            Ok(OrderStatus {
                order_id: order_id.to_string(),
                flags: reached_through(OrderStage::InTransit),
            })
        });

        backend
            .expect_confirm_delivery()
            .times(1)
            .returning(|_, _| {
                Ok(DeliveryReceipt {
                    delivered_at: Some(
                        "2025-05-13T15:00:00".parse().expect("stamp should parse"),
                    ),
                })
            });

        let tracker = OrderTracker::spawn(
            orders_over(backend),
            "42".to_string(),
            Duration::from_secs(10),
        );
        let mut snapshots = tracker.subscribe();

        snapshots.changed().await.expect("first tick should publish");

        tracker
            .confirm_receipt()
            .await
            .expect("confirmation should succeed");

        let latest = tracker.latest();

        assert_eq!(latest.confirmation, ConfirmationState::Confirmed);
        assert!(latest.flags.is_delivered());

        tracker.stop().await;
    }
}
