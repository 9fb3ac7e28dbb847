//! Position-list filter criteria and their URL query form.

use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

use crate::domain::{Decimal, Direction, PositionStatus, StoredPosition};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

impl FilterError {
    fn invalid(key: &str, value: &str) -> Self {
        FilterError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }
    }
}

/// Comparison operator for numeric filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CompareOp {
    /// Evaluate `lhs <op> rhs`.
    pub fn matches(&self, lhs: Decimal, rhs: Decimal) -> bool {
        match self {
            CompareOp::Eq => lhs == rhs,
            CompareOp::Ne => lhs != rhs,
            CompareOp::Gt => lhs > rhs,
            CompareOp::Gte => lhs >= rhs,
            CompareOp::Lt => lhs < rhs,
            CompareOp::Lte => lhs <= rhs,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOp::Eq => "eq",
            CompareOp::Ne => "ne",
            CompareOp::Gt => "gt",
            CompareOp::Gte => "gte",
            CompareOp::Lt => "lt",
            CompareOp::Lte => "lte",
        }
    }
}

impl FromStr for CompareOp {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "eq" => Ok(CompareOp::Eq),
            "ne" => Ok(CompareOp::Ne),
            "gt" => Ok(CompareOp::Gt),
            "gte" => Ok(CompareOp::Gte),
            "lt" => Ok(CompareOp::Lt),
            "lte" => Ok(CompareOp::Lte),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comparison {
    pub operator: CompareOp,
    pub value: Decimal,
}

impl Comparison {
    pub fn new(operator: CompareOp, value: Decimal) -> Self {
        Self { operator, value }
    }

    pub fn matches(&self, lhs: Decimal) -> bool {
        self.operator.matches(lhs, self.value)
    }

    /// `op:value`, e.g. `gte:100`.
    fn to_query_value(self) -> String {
        format!("{}:{}", self.operator.as_str(), self.value)
    }

    fn from_query_value(key: &str, raw: &str) -> Result<Self, FilterError> {
        let (op, value) = raw
            .split_once(':')
            .ok_or_else(|| FilterError::invalid(key, raw))?;
        let operator = op
            .parse::<CompareOp>()
            .map_err(|_| FilterError::invalid(key, raw))?;
        let value = Decimal::from_str_canonical(value).map_err(|_| FilterError::invalid(key, raw))?;
        Ok(Comparison { operator, value })
    }
}

/// Filters applied to the position list. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PositionFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instrument: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub statuses: Vec<PositionStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opened_from: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opened_to: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net_pnl: Option<Comparison>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r_factor: Option<Comparison>,
}

impl PositionFilter {
    pub fn is_empty(&self) -> bool {
        *self == PositionFilter::default()
    }

    pub fn matches(&self, position: &StoredPosition) -> bool {
        if let Some(instrument) = &self.instrument {
            if !position
                .instrument
                .as_str()
                .eq_ignore_ascii_case(instrument.trim())
            {
                return false;
            }
        }
        if let Some(direction) = self.direction {
            if position.computed.direction != direction {
                return false;
            }
        }
        if !self.statuses.is_empty() && !self.statuses.contains(&position.computed.status) {
            return false;
        }
        // Millisecond precision, matching the indexed column.
        let opened_ms = position.opened_at().timestamp_millis();
        if self
            .opened_from
            .is_some_and(|from| opened_ms < from.timestamp_millis())
        {
            return false;
        }
        if self
            .opened_to
            .is_some_and(|to| opened_ms > to.timestamp_millis())
        {
            return false;
        }
        if self.net_pnl.is_some_and(|c| !c.matches(position.net_pnl())) {
            return false;
        }
        if self.r_factor.is_some_and(|c| !c.matches(position.r_factor())) {
            return false;
        }
        true
    }

    /// Key/value pairs in URL query form.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(instrument) = &self.instrument {
            pairs.push(("instrument", instrument.clone()));
        }
        if let Some(direction) = self.direction {
            pairs.push(("direction", direction.to_string()));
        }
        if !self.statuses.is_empty() {
            let joined = self
                .statuses
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(",");
            pairs.push(("status", joined));
        }
        if let Some(from) = self.opened_from {
            pairs.push(("opened_from", from.to_rfc3339()));
        }
        if let Some(to) = self.opened_to {
            pairs.push(("opened_to", to.to_rfc3339()));
        }
        if let Some(net_pnl) = self.net_pnl {
            pairs.push(("net_pnl", net_pnl.to_query_value()));
        }
        if let Some(r_factor) = self.r_factor {
            pairs.push(("r_factor", r_factor.to_query_value()));
        }
        pairs
    }

    /// Percent-encoded query string (without the leading `?`).
    pub fn to_query_string(&self) -> String {
        let pairs = self.to_query_pairs();
        if pairs.is_empty() {
            return String::new();
        }
        let mut url = query_base();
        url.query_pairs_mut().extend_pairs(pairs);
        url.query().unwrap_or_default().to_string()
    }

    /// Parse a query string produced by [`to_query_string`](Self::to_query_string).
    ///
    /// Unknown keys are ignored.
    ///
    /// # Errors
    /// Returns `InvalidValue` for a known key with a malformed value.
    pub fn from_query_string(query: &str) -> Result<Self, FilterError> {
        let mut url = query_base();
        url.set_query(Some(query.trim_start_matches('?')));

        let mut filter = PositionFilter::default();
        for (key, value) in url.query_pairs() {
            let (key, value) = (&*key, &*value);
            match key {
                "instrument" if !value.is_empty() => filter.instrument = Some(value.to_string()),
                "direction" => {
                    filter.direction = Some(
                        value
                            .parse::<Direction>()
                            .map_err(|_| FilterError::invalid(key, value))?,
                    )
                }
                "status" => {
                    filter.statuses = value
                        .split(',')
                        .filter(|s| !s.is_empty())
                        .map(|s| {
                            s.parse::<PositionStatus>()
                                .map_err(|_| FilterError::invalid(key, value))
                        })
                        .collect::<Result<_, _>>()?
                }
                "opened_from" => filter.opened_from = Some(parse_time(key, value)?),
                "opened_to" => filter.opened_to = Some(parse_time(key, value)?),
                "net_pnl" => filter.net_pnl = Some(Comparison::from_query_value(key, value)?),
                "r_factor" => filter.r_factor = Some(Comparison::from_query_value(key, value)?),
                _ => {}
            }
        }
        Ok(filter)
    }
}

fn parse_time(key: &str, value: &str) -> Result<DateTime<Utc>, FilterError> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| FilterError::invalid(key, value))
}

/// Scratch URL used only for its form-urlencoding of the query component.
fn query_base() -> Url {
    Url::parse("http://localhost/").expect("static base URL is valid")
}
