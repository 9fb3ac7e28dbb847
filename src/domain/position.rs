//! A journaled position: user-entered inputs plus the computed outcome.

use crate::domain::{Decimal, Instrument, Trade};
use crate::engine::ComputedPosition;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredPosition {
    pub id: Uuid,
    pub instrument: Instrument,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub risk_amount: Decimal,
    pub charges_amount: Decimal,
    pub enable_auto_charges: bool,
    pub trades: Vec<Trade>,
    pub computed: ComputedPosition,
    pub created_at: DateTime<Utc>,
}

impl StoredPosition {
    pub fn net_pnl(&self) -> Decimal {
        self.computed.net_pnl_amount
    }

    pub fn r_factor(&self) -> Decimal {
        self.computed.r_factor
    }

    pub fn opened_at(&self) -> DateTime<Utc> {
        self.computed.opened_at
    }
}
