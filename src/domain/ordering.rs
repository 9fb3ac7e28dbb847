//! Stable trade ordering for deterministic processing.

use crate::domain::Trade;

/// Sort trades by execution time.
///
/// The sort is stable: trades sharing a timestamp keep their input order, so the
/// same input always yields the same sequence.
pub fn sort_trades_deterministic(trades: &mut [Trade]) {
    trades.sort_by(|a, b| a.time.cmp(&b.time));
}

/// Returns a time-ordered copy of `trades`.
pub fn sorted_trades(trades: &[Trade]) -> Vec<Trade> {
    let mut sorted = trades.to_vec();
    sort_trades_deterministic(&mut sorted);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Decimal, TradeKind};
    use chrono::{TimeZone, Utc};

    fn make_trade(kind: TradeKind, time_ms: i64, qty: &str) -> Trade {
        Trade::new(
            kind,
            Utc.timestamp_millis_opt(time_ms).unwrap(),
            Decimal::from_str_canonical(qty).unwrap(),
            Decimal::from_str_canonical("100").unwrap(),
        )
    }

    #[test]
    fn test_trade_ordering_by_time() {
        let mut trades = vec![
            make_trade(TradeKind::Sell, 2000, "1"),
            make_trade(TradeKind::Buy, 1000, "1"),
        ];
        sort_trades_deterministic(&mut trades);
        assert_eq!(trades[0].kind, TradeKind::Buy);
        assert_eq!(trades[1].kind, TradeKind::Sell);
    }

    #[test]
    fn test_trade_ordering_stable_on_ties() {
        let trades = vec![
            make_trade(TradeKind::Buy, 1000, "1"),
            make_trade(TradeKind::Buy, 1000, "2"),
            make_trade(TradeKind::Buy, 1000, "3"),
        ];
        let sorted = sorted_trades(&trades);
        assert_eq!(sorted, trades);
    }
}
