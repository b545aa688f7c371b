//! Order status projection
//!
//! The backend reports an order's progress as one flag (plus an optional
//! timestamp) per delivery stage rather than a single status value. This
//! module derives the current stage from that record and classifies every
//! stage for rendering. Stages are monotonic by backend contract — reaching
//! stage N implies all earlier stages — which is trusted, not enforced.

use jiff::civil::DateTime;
use serde::{Deserialize, Serialize};

/// The canonical delivery pipeline, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OrderStage {
    /// Order received by the backend.
    Issued,

    /// Order is being processed.
    Processing,

    /// Order is being assembled.
    Assembling,

    /// Assembled and ready for handover to a courier.
    ReadyForDelivery,

    /// With the courier.
    InTransit,

    /// Received by the customer — terminal.
    Delivered,
}

impl OrderStage {
    /// All stages in pipeline order.
    pub const ALL: [Self; 6] = [
        Self::Issued,
        Self::Processing,
        Self::Assembling,
        Self::ReadyForDelivery,
        Self::InTransit,
        Self::Delivered,
    ];

    /// Position of the stage within the pipeline.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Issued => 0,
            Self::Processing => 1,
            Self::Assembling => 2,
            Self::ReadyForDelivery => 3,
            Self::InTransit => 4,
            Self::Delivered => 5,
        }
    }

    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Issued => "Issued",
            Self::Processing => "Processing",
            Self::Assembling => "Assembling",
            Self::ReadyForDelivery => "Ready for delivery",
            Self::InTransit => "In transit",
            Self::Delivered => "Delivered",
        }
    }

    /// Whether the stage ends the pipeline.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered)
    }
}

impl std::fmt::Display for OrderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// How a stage should render relative to the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageState {
    /// Before the current stage — active color.
    Reached,

    /// The current stage — emphasized.
    Current,

    /// After the current stage — neutral color.
    Pending,
}

/// One stage's slot in the raw status record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StageEntry {
    /// Whether the backend marked the stage as reached.
    pub reached: bool,

    /// Timestamp the backend stamped for the stage, when present.
    pub at: Option<DateTime>,
}

/// The normalized per-stage flag record for one order.
///
/// Server flags outside the known stage set are dropped during
/// normalization; an empty record projects to [`OrderStage::Issued`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StageFlags {
    /// Issued slot.
    pub issued: StageEntry,

    /// Processing slot.
    pub processing: StageEntry,

    /// Assembling slot.
    pub assembling: StageEntry,

    /// Ready-for-delivery slot.
    pub ready_for_delivery: StageEntry,

    /// In-transit slot.
    pub in_transit: StageEntry,

    /// Delivered slot.
    pub delivered: StageEntry,
}

impl StageFlags {
    /// The slot for a stage.
    #[must_use]
    pub fn entry(&self, stage: OrderStage) -> &StageEntry {
        match stage {
            OrderStage::Issued => &self.issued,
            OrderStage::Processing => &self.processing,
            OrderStage::Assembling => &self.assembling,
            OrderStage::ReadyForDelivery => &self.ready_for_delivery,
            OrderStage::InTransit => &self.in_transit,
            OrderStage::Delivered => &self.delivered,
        }
    }

    /// Mutable slot access.
    pub fn entry_mut(&mut self, stage: OrderStage) -> &mut StageEntry {
        match stage {
            OrderStage::Issued => &mut self.issued,
            OrderStage::Processing => &mut self.processing,
            OrderStage::Assembling => &mut self.assembling,
            OrderStage::ReadyForDelivery => &mut self.ready_for_delivery,
            OrderStage::InTransit => &mut self.in_transit,
            OrderStage::Delivered => &mut self.delivered,
        }
    }

    /// Sets a stage's flag and timestamp.
    pub fn set(&mut self, stage: OrderStage, reached: bool, at: Option<DateTime>) {
        *self.entry_mut(stage) = StageEntry { reached, at };
    }

    /// The last stage (in pipeline order) whose flag is set; an empty or
    /// unrecognized record defaults to [`OrderStage::Issued`].
    #[must_use]
    pub fn current_stage(&self) -> OrderStage {
        OrderStage::ALL
            .into_iter()
            .rev()
            .find(|stage| self.entry(*stage).reached)
            .unwrap_or(OrderStage::Issued)
    }

    /// Index of [`Self::current_stage`] within the pipeline.
    #[must_use]
    pub fn current_stage_index(&self) -> usize {
        self.current_stage().index()
    }

    /// Render classification for a stage: reached, current, or pending.
    #[must_use]
    pub fn state_of(&self, stage: OrderStage) -> StageState {
        let current = self.current_stage_index();

        match stage.index() {
            index if index < current => StageState::Reached,
            index if index == current => StageState::Current,
            _ => StageState::Pending,
        }
    }

    /// Whether the order reached the terminal stage.
    #[must_use]
    pub fn is_delivered(&self) -> bool {
        self.delivered.reached
    }

    /// Whether the receipt-confirmation action is offered: the order must be
    /// ready for delivery or in transit, and not yet delivered.
    #[must_use]
    pub fn can_confirm_receipt(&self) -> bool {
        matches!(
            self.current_stage(),
            OrderStage::ReadyForDelivery | OrderStage::InTransit
        )
    }

    /// Flips the terminal flag, stamping the given timestamp. Used for the
    /// optimistic local half of receipt confirmation.
    pub fn mark_delivered(&mut self, at: Option<DateTime>) {
        self.delivered = StageEntry { reached: true, at };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reached_through(last: OrderStage) -> StageFlags {
        let mut flags = StageFlags::default();

        for stage in OrderStage::ALL {
            if stage.index() <= last.index() {
                flags.set(stage, true, None);
            }
        }

        flags
    }

    #[test]
    fn current_stage_is_last_set_flag() {
        let flags = reached_through(OrderStage::Processing);

        assert_eq!(flags.current_stage(), OrderStage::Processing);
        assert_eq!(flags.current_stage_index(), 1);
    }

    #[test]
    fn stage_states_render_monotonically() {
        let flags = reached_through(OrderStage::Processing);

        assert_eq!(flags.state_of(OrderStage::Issued), StageState::Reached);
        assert_eq!(flags.state_of(OrderStage::Processing), StageState::Current);
        assert_eq!(flags.state_of(OrderStage::Assembling), StageState::Pending);
        assert_eq!(flags.state_of(OrderStage::Delivered), StageState::Pending);
    }

    #[test]
    fn empty_record_defaults_to_issued() {
        let flags = StageFlags::default();

        assert_eq!(flags.current_stage(), OrderStage::Issued);
        assert_eq!(flags.state_of(OrderStage::Issued), StageState::Current);
    }

    #[test]
    fn confirm_window_opens_at_ready_and_closes_at_delivered() {
        assert!(!reached_through(OrderStage::Assembling).can_confirm_receipt());
        assert!(reached_through(OrderStage::ReadyForDelivery).can_confirm_receipt());
        assert!(reached_through(OrderStage::InTransit).can_confirm_receipt());
        assert!(!reached_through(OrderStage::Delivered).can_confirm_receipt());
    }

    #[test]
    fn mark_delivered_sets_the_terminal_flag() {
        let mut flags = reached_through(OrderStage::InTransit);
        let stamp: DateTime = "2025-05-13T14:30:00"
            .parse()
            .expect("timestamp should parse");

        flags.mark_delivered(Some(stamp));

        assert!(flags.is_delivered());
        assert_eq!(flags.current_stage(), OrderStage::Delivered);
        assert_eq!(flags.delivered.at, Some(stamp));
    }
}
