//! Pure computation engine for deterministic position P&L.

use thiserror::Error;

use crate::domain::Decimal;

pub mod compute;
pub mod position_tracker;

pub use compute::{compute, ComputeRequest, ComputedPosition};
pub use position_tracker::{PositionState, PositionTracker, TrackerOutput};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComputeError {
    #[error("At least one trade is required")]
    EmptyTradeSet,
    #[error("Risk amount must be greater than zero")]
    InvalidRiskAmount,
    #[error("Trade {index}: quantity must be greater than zero")]
    InvalidQuantity { index: usize },
    #[error("Trade {index}: price must not be negative")]
    InvalidPrice { index: usize },
    #[error("Charges must not be negative")]
    InvalidCharges,
    #[error("Trade {index}: quantity exceeds open quantity {open_quantity}")]
    QuantityExceedsOpen {
        index: usize,
        open_quantity: Decimal,
    },
    #[error("Trade {index}: position is already closed")]
    TradeAfterClose { index: usize },
    #[error("Arithmetic overflow")]
    Overflow,
}
