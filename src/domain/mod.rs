//! Domain types and determinism layer for the trading journal.
//!
//! This module provides:
//! - Lossless numeric handling via Decimal wrapper
//! - Decimal-string input validation against precision/scale contracts
//! - Domain primitives: Instrument, TradeKind, Direction, PositionStatus
//! - Trade and StoredPosition types with string-encoded decimals on the wire
//! - Stable trade ordering for deterministic processing

pub mod decimal;
pub mod decimal_string;
pub mod ordering;
pub mod position;
pub mod primitives;
pub mod trade;

pub use decimal::Decimal;
pub use decimal_string::{validate, DecimalKind, DecimalStringError, Validation};
pub use position::StoredPosition;
pub use primitives::{Direction, Instrument, PositionStatus, TradeKind};
pub use trade::Trade;
