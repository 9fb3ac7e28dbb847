//! Domain primitives: Instrument, TradeKind, Direction, PositionStatus.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Instrument symbol (e.g., "NIFTY24JUNFUT", "AAPL").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Instrument(pub String);

impl Instrument {
    /// Create an Instrument from a string.
    pub fn new(symbol: String) -> Self {
        Instrument(symbol)
    }

    /// Get the instrument as a string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Instrument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Trade kind: Buy or Sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeKind {
    Buy,
    Sell,
}

impl TradeKind {
    /// Get the signed multiplier for this kind (+1 for Buy, -1 for Sell).
    pub fn sign(&self) -> i32 {
        match self {
            TradeKind::Buy => 1,
            TradeKind::Sell => -1,
        }
    }

    /// The direction a position takes when this kind opens it.
    pub fn opening_direction(&self) -> Direction {
        match self {
            TradeKind::Buy => Direction::Long,
            TradeKind::Sell => Direction::Short,
        }
    }
}

impl std::fmt::Display for TradeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeKind::Buy => write!(f, "buy"),
            TradeKind::Sell => write!(f, "sell"),
        }
    }
}

/// Position direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Opened with a buy; profits when price rises.
    Long,
    /// Opened with a sell; profits when price falls.
    Short,
}

impl Direction {
    /// The trade kind that increases exposure in this direction.
    pub fn entry_kind(&self) -> TradeKind {
        match self {
            Direction::Long => TradeKind::Buy,
            Direction::Short => TradeKind::Sell,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Long => "long",
            Direction::Short => "short",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "long" => Ok(Direction::Long),
            "short" => Ok(Direction::Short),
            other => Err(format!("unknown direction: {}", other)),
        }
    }
}

/// Position outcome status.
///
/// `Open` transitions exactly once into one of the closed states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionStatus {
    Open,
    Win,
    Loss,
    Breakeven,
}

impl PositionStatus {
    pub fn is_closed(&self) -> bool {
        !matches!(self, PositionStatus::Open)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PositionStatus::Open => "open",
            PositionStatus::Win => "win",
            PositionStatus::Loss => "loss",
            PositionStatus::Breakeven => "breakeven",
        }
    }
}

impl std::fmt::Display for PositionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PositionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(PositionStatus::Open),
            "win" => Ok(PositionStatus::Win),
            "loss" => Ok(PositionStatus::Loss),
            "breakeven" => Ok(PositionStatus::Breakeven),
            other => Err(format!("unknown status: {}", other)),
        }
    }
}
