//! Local delivery-progress reconciliation.
//!
//! Receipt confirmation is optimistic: the terminal flag flips locally
//! before the backend answers. Each optimistic mutation moves through an
//! explicit pending/confirmed/failed tri-state, and a failed confirmation
//! reverts to the last server-confirmed snapshot instead of leaving an
//! unreconciled local flag behind. Poll ticks and confirmations interleave
//! last-write-wins; both converge on the server's truth at the next fetch.

use apotheca::status::StageFlags;
use jiff::civil::DateTime;

use crate::orders::OrdersServiceError;

/// State of the optimistic receipt confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfirmationState {
    /// No confirmation attempted.
    #[default]
    Idle,

    /// Flipped locally, awaiting the backend's answer.
    Pending,

    /// Acknowledged by the backend (or observed directly in a poll).
    Confirmed,

    /// Rejected by the backend; local state has been reverted.
    Failed,
}

/// Reconciles the server's per-stage record with the local optimistic
/// confirmation for one order.
#[derive(Debug, Clone, Default)]
pub struct DeliveryProgress {
    server: StageFlags,
    confirmation: ConfirmationState,
    optimistic_at: Option<DateTime>,
}

impl DeliveryProgress {
    /// Starts from a server snapshot.
    #[must_use]
    pub fn new(server: StageFlags) -> Self {
        Self {
            server,
            confirmation: ConfirmationState::default(),
            optimistic_at: None,
        }
    }

    /// Applies a fresh server snapshot (a poll tick). Last write wins; a
    /// pending confirmation that the server now reflects resolves to
    /// confirmed.
    pub fn apply_server(&mut self, flags: StageFlags) {
        self.server = flags;

        if self.server.is_delivered() {
            self.confirmation = ConfirmationState::Confirmed;
            self.optimistic_at = None;
        }
    }

    /// Flips the terminal flag locally ahead of the backend call.
    ///
    /// # Errors
    ///
    /// Returns [`OrdersServiceError::ConfirmNotAvailable`] outside the
    /// ready-for-delivery/in-transit window.
    pub fn begin_confirm(&mut self, at: DateTime) -> Result<(), OrdersServiceError> {
        if !self.effective().can_confirm_receipt() {
            return Err(OrdersServiceError::ConfirmNotAvailable);
        }

        self.confirmation = ConfirmationState::Pending;
        self.optimistic_at = Some(at);

        Ok(())
    }

    /// Resolves a pending confirmation with the server's answer; the echoed
    /// timestamp replaces the optimistic one.
    pub fn confirm_succeeded(&mut self, delivered_at: Option<DateTime>) {
        let at = delivered_at.or(self.optimistic_at);

        self.server.mark_delivered(at);
        self.confirmation = ConfirmationState::Confirmed;
        self.optimistic_at = None;
    }

    /// Rejects a pending confirmation: the optimistic flag is dropped and
    /// the view falls back to the last server-confirmed snapshot.
    pub fn confirm_failed(&mut self) {
        self.confirmation = ConfirmationState::Failed;
        self.optimistic_at = None;
    }

    /// The stage record to render: the server snapshot, with the terminal
    /// flag overlaid while a confirmation is pending.
    #[must_use]
    pub fn effective(&self) -> StageFlags {
        match self.confirmation {
            ConfirmationState::Pending => {
                let mut flags = self.server;
                flags.mark_delivered(self.optimistic_at);

                flags
            }
            ConfirmationState::Idle | ConfirmationState::Confirmed | ConfirmationState::Failed => {
                self.server
            }
        }
    }

    /// Current confirmation state.
    #[must_use]
    pub fn confirmation(&self) -> ConfirmationState {
        self.confirmation
    }
}
