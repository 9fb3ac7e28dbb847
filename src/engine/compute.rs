//! Derives a position's outcome from its trades, risk amount and charges.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::ordering::sorted_trades;
use crate::domain::{Decimal, Direction, PositionStatus, Trade};

use super::position_tracker::checked;
use super::{ComputeError, PositionTracker, TrackerOutput};

/// Decimal places kept for ratios (R-factor and percentages).
pub const RATIO_DP: u32 = 4;

/// Input of a position computation, as sent over the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeRequest {
    pub trades: Vec<Trade>,
    pub risk_amount: Decimal,
    /// Position-level charges, added to the per-trade charges.
    #[serde(default)]
    pub charges_amount: Decimal,
    /// Broker auto-charges are computed by an external service; the flag is carried only.
    #[serde(default)]
    pub enable_auto_charges: bool,
    /// Last traded price, used for unrealized P&L of an open position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mark_price: Option<Decimal>,
}

impl ComputeRequest {
    pub fn new(trades: Vec<Trade>, risk_amount: Decimal, charges_amount: Decimal) -> Self {
        Self {
            trades,
            risk_amount,
            charges_amount,
            enable_auto_charges: false,
            mark_price: None,
        }
    }

    pub fn with_mark_price(mut self, mark_price: Decimal) -> Self {
        self.mark_price = Some(mark_price);
        self
    }

    pub fn compute(&self) -> Result<ComputedPosition, ComputeError> {
        if self.enable_auto_charges {
            debug!("auto charges requested; using supplied charges only");
        }
        compute_with_mark(
            &self.trades,
            self.risk_amount,
            self.charges_amount,
            self.mark_price,
        )
    }
}

/// A position derived from its trades. Recomputed wholesale, never patched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputedPosition {
    pub direction: Direction,
    pub status: PositionStatus,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub gross_pnl_amount: Decimal,
    /// Total charges: position-level plus per-trade.
    pub charges_amount: Decimal,
    pub net_pnl_amount: Decimal,
    /// Net P&L as a multiple of the risk amount.
    pub r_factor: Decimal,
    /// Net P&L as a percentage of the entry cost basis.
    pub net_return_percentage: Decimal,
    /// Total charges as a percentage of gross P&L (gross of zero divides by one).
    pub charges_as_percentage_of_net_pnl: Decimal,
    pub open_quantity: Decimal,
    pub open_average_price_amount: Decimal,
    /// Sum of `price * quantity` over entry trades.
    pub cost_basis_amount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unrealized_pnl_amount: Option<Decimal>,
}

impl ComputedPosition {
    pub fn is_closed(&self) -> bool {
        self.status.is_closed()
    }
}

/// Compute a position from trades, a risk amount and position-level charges.
///
/// Trades are ordered by time before processing. The first trade fixes the direction.
///
/// # Errors
/// - `InvalidRiskAmount` when `risk_amount <= 0`
/// - `EmptyTradeSet` when `trades` is empty
/// - any trade-level error raised by [`PositionTracker::process_trade`]
pub fn compute(
    trades: &[Trade],
    risk_amount: Decimal,
    charges_amount: Decimal,
) -> Result<ComputedPosition, ComputeError> {
    compute_with_mark(trades, risk_amount, charges_amount, None)
}

fn compute_with_mark(
    trades: &[Trade],
    risk_amount: Decimal,
    charges_amount: Decimal,
    mark_price: Option<Decimal>,
) -> Result<ComputedPosition, ComputeError> {
    if !risk_amount.is_positive() {
        return Err(ComputeError::InvalidRiskAmount);
    }
    if charges_amount.is_negative() {
        return Err(ComputeError::InvalidCharges);
    }
    if trades.is_empty() {
        return Err(ComputeError::EmptyTradeSet);
    }

    let mut tracker = PositionTracker::new();
    for trade in &sorted_trades(trades) {
        tracker.process_trade(trade)?;
    }
    let TrackerOutput {
        state,
        opened_at,
        gross_pnl,
        cost_basis,
        trade_charges,
    } = tracker.into_output();

    let (direction, opened_at) = match (state.direction, opened_at) {
        (Some(direction), Some(opened_at)) => (direction, opened_at),
        _ => return Err(ComputeError::EmptyTradeSet),
    };

    let total_charges = checked(charges_amount.checked_add(trade_charges))?;
    let net_pnl = checked(gross_pnl.checked_sub(total_charges))?;

    let r_factor = checked(net_pnl.checked_div(risk_amount))?.round_dp(RATIO_DP);
    let net_return_percentage = percentage(net_pnl, cost_basis)?;
    let charges_divisor = if gross_pnl.is_zero() {
        Decimal::one()
    } else {
        gross_pnl
    };
    let charges_percentage = percentage(total_charges, charges_divisor)?;

    let status = status_for(state.is_closed(), net_pnl);

    let unrealized_pnl_amount = match (status, mark_price) {
        (PositionStatus::Open, Some(mark)) => {
            let marked = checked(mark.checked_mul(state.open_quantity))?;
            Some(match direction {
                Direction::Long => checked(marked.checked_sub(state.open_cost))?,
                Direction::Short => checked(state.open_cost.checked_sub(marked))?,
            })
        }
        _ => None,
    };

    debug!(
        "Computed position: direction={}, status={}, gross={}, net={}, r={}",
        direction, status, gross_pnl, net_pnl, r_factor
    );

    Ok(ComputedPosition {
        direction,
        status,
        opened_at,
        closed_at: state.closed_at,
        gross_pnl_amount: gross_pnl,
        charges_amount: total_charges,
        net_pnl_amount: net_pnl,
        r_factor,
        net_return_percentage,
        charges_as_percentage_of_net_pnl: charges_percentage,
        open_quantity: state.open_quantity,
        open_average_price_amount: state.average_price(),
        cost_basis_amount: cost_basis,
        unrealized_pnl_amount,
    })
}

fn status_for(closed: bool, net_pnl: Decimal) -> PositionStatus {
    if !closed {
        PositionStatus::Open
    } else if net_pnl.is_positive() {
        PositionStatus::Win
    } else if net_pnl.is_negative() {
        PositionStatus::Loss
    } else {
        PositionStatus::Breakeven
    }
}

/// `value / base * 100`, zero when `base` is zero.
fn percentage(value: Decimal, base: Decimal) -> Result<Decimal, ComputeError> {
    if base.is_zero() {
        return Ok(Decimal::zero());
    }
    let ratio = checked(value.checked_div(base))?;
    Ok(checked(ratio.checked_mul(Decimal::hundred()))?.round_dp(RATIO_DP))
}
