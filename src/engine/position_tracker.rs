use chrono::{DateTime, Utc};

use crate::domain::{Decimal, Direction, Trade};

use super::ComputeError;

/// Running state of a position while trades are applied.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PositionState {
    /// Direction fixed by the first trade (None before any trade).
    pub direction: Option<Direction>,

    /// Unsigned quantity still open.
    pub open_quantity: Decimal,

    /// Entry cost still carried by the open quantity (zero when flat).
    pub open_cost: Decimal,

    /// Time of the trade that brought open quantity back to zero.
    pub closed_at: Option<DateTime<Utc>>,
}

impl PositionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_flat(&self) -> bool {
        self.open_quantity.is_zero()
    }

    pub fn is_closed(&self) -> bool {
        self.closed_at.is_some()
    }

    /// Weighted average entry price of the open quantity, zero when flat.
    ///
    /// Display only: realized P&L is taken against `open_cost`, not this rounded value.
    pub fn average_price(&self) -> Decimal {
        if self.is_flat() {
            return Decimal::zero();
        }
        self.open_cost
            .checked_div(self.open_quantity)
            .unwrap_or_else(Decimal::zero)
    }
}

/// Applies trades one at a time, accumulating realized P&L, cost basis and charges.
///
/// Callers must feed trades in time order (see `domain::ordering`).
#[derive(Debug, Default)]
pub struct PositionTracker {
    pub state: PositionState,
    opened_at: Option<DateTime<Utc>>,
    gross_pnl: Decimal,
    cost_basis: Decimal,
    trade_charges: Decimal,
    processed: usize,
}

/// Accumulated results of a tracker run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerOutput {
    pub state: PositionState,
    pub opened_at: Option<DateTime<Utc>>,
    pub gross_pnl: Decimal,
    pub cost_basis: Decimal,
    pub trade_charges: Decimal,
}

impl PositionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process a single trade, updating state and the running totals.
    ///
    /// # Errors
    /// Rejects non-positive quantities, negative prices or charges, trades after the
    /// position closed, and reductions larger than the open quantity.
    pub fn process_trade(&mut self, trade: &Trade) -> Result<(), ComputeError> {
        let index = self.processed;
        self.validate_trade(index, trade)?;

        if self.state.is_closed() {
            return Err(ComputeError::TradeAfterClose { index });
        }

        let direction = *self
            .state
            .direction
            .get_or_insert_with(|| trade.kind.opening_direction());
        if self.opened_at.is_none() {
            self.opened_at = Some(trade.time);
        }

        self.trade_charges = checked(self.trade_charges.checked_add(trade.charges_amount))?;

        if trade.kind == direction.entry_kind() {
            self.handle_increase(trade)?;
        } else {
            self.handle_reduce(index, trade, direction)?;
        }

        self.processed += 1;
        Ok(())
    }

    fn validate_trade(&self, index: usize, trade: &Trade) -> Result<(), ComputeError> {
        if !trade.quantity.is_positive() {
            return Err(ComputeError::InvalidQuantity { index });
        }
        if trade.price.is_negative() {
            return Err(ComputeError::InvalidPrice { index });
        }
        if trade.charges_amount.is_negative() {
            return Err(ComputeError::InvalidCharges);
        }
        Ok(())
    }

    /// Handle a trade in the position's direction: add its notional to the open cost.
    fn handle_increase(&mut self, trade: &Trade) -> Result<(), ComputeError> {
        let notional = checked(trade.notional())?;

        self.state.open_cost = checked(self.state.open_cost.checked_add(notional))?;
        self.state.open_quantity = checked(self.state.open_quantity.checked_add(trade.quantity))?;
        self.cost_basis = checked(self.cost_basis.checked_add(notional))?;
        Ok(())
    }

    /// Handle a trade against the position's direction: release its share of the open
    /// cost and realize P&L against it. The closing trade releases whatever cost remains.
    fn handle_reduce(
        &mut self,
        index: usize,
        trade: &Trade,
        direction: Direction,
    ) -> Result<(), ComputeError> {
        if trade.quantity > self.state.open_quantity {
            return Err(ComputeError::QuantityExceedsOpen {
                index,
                open_quantity: self.state.open_quantity,
            });
        }

        let remaining = checked(self.state.open_quantity.checked_sub(trade.quantity))?;
        let released = if remaining.is_zero() {
            self.state.open_cost
        } else {
            let share = checked(self.state.open_cost.checked_mul(trade.quantity))?;
            checked(share.checked_div(self.state.open_quantity))?
        };

        let notional = checked(trade.notional())?;
        let realized = match direction {
            Direction::Long => checked(notional.checked_sub(released))?,
            Direction::Short => checked(released.checked_sub(notional))?,
        };
        self.gross_pnl = checked(self.gross_pnl.checked_add(realized))?;

        self.state.open_cost = checked(self.state.open_cost.checked_sub(released))?;
        self.state.open_quantity = remaining;
        if remaining.is_zero() {
            self.state.closed_at = Some(trade.time);
        }
        Ok(())
    }

    /// Get the accumulated outputs.
    pub fn into_output(self) -> TrackerOutput {
        TrackerOutput {
            state: self.state,
            opened_at: self.opened_at,
            gross_pnl: self.gross_pnl,
            cost_basis: self.cost_basis,
            trade_charges: self.trade_charges,
        }
    }
}

pub(super) fn checked(value: Option<Decimal>) -> Result<Decimal, ComputeError> {
    value.ok_or(ComputeError::Overflow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TradeKind;
    use chrono::TimeZone;

    fn d(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    fn trade(kind: TradeKind, qty: &str, price: &str, time_ms: i64) -> Trade {
        Trade::new(kind, Utc.timestamp_millis_opt(time_ms).unwrap(), d(qty), d(price))
    }

    #[test]
    fn test_simple_open_close_long() {
        let mut tracker = PositionTracker::new();

        tracker.process_trade(&trade(TradeKind::Buy, "1", "50000", 1000)).unwrap();
        assert_eq!(tracker.state.open_quantity, d("1"));
        assert_eq!(tracker.state.average_price(), d("50000"));
        assert_eq!(tracker.state.direction, Some(Direction::Long));

        tracker.process_trade(&trade(TradeKind::Sell, "1", "55000", 2000)).unwrap();
        assert!(tracker.state.is_flat());
        assert!(tracker.state.is_closed());

        let output = tracker.into_output();
        assert_eq!(output.gross_pnl, d("5000"));
        assert_eq!(output.cost_basis, d("50000"));
        assert_eq!(output.opened_at, Some(Utc.timestamp_millis_opt(1000).unwrap()));
        assert_eq!(output.state.closed_at, Some(Utc.timestamp_millis_opt(2000).unwrap()));
        assert_eq!(output.state.open_cost, Decimal::zero());
    }

    #[test]
    fn test_partial_close_preserves_average() {
        let mut tracker = PositionTracker::new();

        tracker.process_trade(&trade(TradeKind::Buy, "2", "50000", 1000)).unwrap();
        tracker.process_trade(&trade(TradeKind::Sell, "1", "55000", 2000)).unwrap();

        assert_eq!(tracker.state.open_quantity, d("1"));
        assert_eq!(tracker.state.open_cost, d("50000"));
        assert_eq!(tracker.state.average_price(), d("50000"));
        assert!(!tracker.state.is_closed());
    }

    #[test]
    fn test_average_weighted_on_add() {
        let mut tracker = PositionTracker::new();

        tracker.process_trade(&trade(TradeKind::Buy, "1", "50000", 1000)).unwrap();
        tracker.process_trade(&trade(TradeKind::Buy, "3", "60000", 2000)).unwrap();

        assert_eq!(tracker.state.open_quantity, d("4"));
        assert_eq!(tracker.state.average_price(), d("57500"));
    }

    #[test]
    fn test_short_open_add_partial_close_then_close() {
        let mut tracker = PositionTracker::new();

        tracker.process_trade(&trade(TradeKind::Sell, "1", "100", 1000)).unwrap();
        tracker.process_trade(&trade(TradeKind::Sell, "1", "90", 2000)).unwrap();
        assert_eq!(tracker.state.average_price(), d("95"));

        tracker.process_trade(&trade(TradeKind::Buy, "0.5", "80", 3000)).unwrap();
        assert_eq!(tracker.state.open_quantity, d("1.5"));
        assert_eq!(tracker.state.average_price(), d("95"));

        tracker.process_trade(&trade(TradeKind::Buy, "1.5", "70", 4000)).unwrap();
        assert!(tracker.state.is_closed());

        let output = tracker.into_output();
        // (95 - 80) * 0.5 + (95 - 70) * 1.5
        assert_eq!(output.gross_pnl, d("45"));
    }

    #[test]
    fn test_partial_close_releases_cost_share_exactly() {
        let mut tracker = PositionTracker::new();

        tracker.process_trade(&trade(TradeKind::Buy, "1", "1", 1000)).unwrap();
        tracker.process_trade(&trade(TradeKind::Buy, "2", "1.5", 2000)).unwrap();
        assert_eq!(tracker.state.open_cost, d("4"));

        tracker.process_trade(&trade(TradeKind::Sell, "1", "2", 3000)).unwrap();
        assert_eq!(tracker.state.open_quantity, d("2"));
        assert_eq!(tracker.state.open_cost, d("4") - d("4") / d("3"));

        tracker.process_trade(&trade(TradeKind::Sell, "2", "1", 4000)).unwrap();
        let output = tracker.into_output();
        assert_eq!(output.state.open_cost, Decimal::zero());
        assert_eq!(output.state.average_price(), Decimal::zero());
        assert_eq!(output.gross_pnl, Decimal::zero());
    }

    #[test]
    fn test_reduce_beyond_open_is_rejected() {
        let mut tracker = PositionTracker::new();
        tracker.process_trade(&trade(TradeKind::Buy, "1", "100", 1000)).unwrap();

        let err = tracker
            .process_trade(&trade(TradeKind::Sell, "2", "110", 2000))
            .unwrap_err();
        assert_eq!(
            err,
            ComputeError::QuantityExceedsOpen {
                index: 1,
                open_quantity: d("1")
            }
        );
    }

    #[test]
    fn test_trade_after_close_is_rejected() {
        let mut tracker = PositionTracker::new();
        tracker.process_trade(&trade(TradeKind::Buy, "1", "100", 1000)).unwrap();
        tracker.process_trade(&trade(TradeKind::Sell, "1", "110", 2000)).unwrap();

        let err = tracker
            .process_trade(&trade(TradeKind::Buy, "1", "100", 3000))
            .unwrap_err();
        assert_eq!(err, ComputeError::TradeAfterClose { index: 2 });
    }

    #[test]
    fn test_zero_quantity_is_rejected() {
        let mut tracker = PositionTracker::new();
        let err = tracker
            .process_trade(&trade(TradeKind::Buy, "0", "100", 1000))
            .unwrap_err();
        assert_eq!(err, ComputeError::InvalidQuantity { index: 0 });
    }

    #[test]
    fn test_trade_charges_accumulate() {
        let mut tracker = PositionTracker::new();
        tracker
            .process_trade(&trade(TradeKind::Buy, "1", "100", 1000).with_charges(d("1.25")))
            .unwrap();
        tracker
            .process_trade(&trade(TradeKind::Sell, "1", "100", 2000).with_charges(d("0.75")))
            .unwrap();
        assert_eq!(tracker.into_output().trade_charges, d("2"));
    }
}
