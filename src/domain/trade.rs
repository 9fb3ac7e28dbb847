//! Trade type representing a single buy or sell execution within a position.

use crate::domain::{Decimal, TradeKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single trade execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    /// Buy or sell.
    pub kind: TradeKind,
    /// Execution time.
    pub time: DateTime<Utc>,
    /// Quantity traded (always positive).
    pub quantity: Decimal,
    /// Price per unit.
    pub price: Decimal,
    /// Brokerage and exchange charges attributed to this trade.
    #[serde(default)]
    pub charges_amount: Decimal,
}

impl Trade {
    pub fn new(kind: TradeKind, time: DateTime<Utc>, quantity: Decimal, price: Decimal) -> Self {
        Trade {
            kind,
            time,
            quantity,
            price,
            charges_amount: Decimal::zero(),
        }
    }

    pub fn buy(time: DateTime<Utc>, quantity: Decimal, price: Decimal) -> Self {
        Self::new(TradeKind::Buy, time, quantity, price)
    }

    pub fn sell(time: DateTime<Utc>, quantity: Decimal, price: Decimal) -> Self {
        Self::new(TradeKind::Sell, time, quantity, price)
    }

    /// Set the per-trade charges.
    pub fn with_charges(mut self, charges_amount: Decimal) -> Self {
        self.charges_amount = charges_amount;
        self
    }

    /// `price * quantity`, or `None` on overflow.
    pub fn notional(&self) -> Option<Decimal> {
        self.price.checked_mul(self.quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn d(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    #[test]
    fn test_trade_json_shape() {
        let trade = Trade::buy(
            Utc.timestamp_millis_opt(1_700_000_000_000).unwrap(),
            d("10"),
            d("100.50"),
        )
        .with_charges(d("2.5"));

        let json = serde_json::to_value(&trade).unwrap();
        assert_eq!(json["kind"], "buy");
        assert_eq!(json["quantity"], "10");
        assert_eq!(json["price"], "100.5");
        assert_eq!(json["charges_amount"], "2.5");
        assert_eq!(json["time"], "2023-11-14T22:13:20Z");
    }

    #[test]
    fn test_trade_charges_default_to_zero() {
        let trade: Trade = serde_json::from_value(serde_json::json!({
            "kind": "sell",
            "time": "2024-01-02T03:04:05Z",
            "quantity": "5",
            "price": "50"
        }))
        .unwrap();
        assert_eq!(trade.charges_amount, Decimal::zero());
        assert_eq!(trade.kind, TradeKind::Sell);
    }

    #[test]
    fn test_notional() {
        let trade = Trade::sell(Utc::now(), d("0.5"), d("120"));
        assert_eq!(trade.notional(), Some(d("60")));
    }
}
