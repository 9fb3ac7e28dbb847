use crate::api::envelope::{Envelope, FieldError};
use crate::domain::{Decimal, DecimalKind, Trade, TradeKind};
use crate::engine::{ComputeRequest, ComputedPosition};
use crate::error::AppError;
use axum::extract::rejection::JsonRejection;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

/// A trade as typed by the user: decimals arrive as text and are checked against
/// their precision/scale contract before anything is computed.
#[derive(Debug, Clone, Deserialize)]
pub struct TradeInput {
    pub kind: TradeKind,
    pub time: DateTime<Utc>,
    #[serde(default)]
    pub quantity: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub charges_amount: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ComputeInput {
    #[serde(default)]
    pub trades: Vec<TradeInput>,
    #[serde(default)]
    pub risk_amount: String,
    #[serde(default)]
    pub charges_amount: String,
    #[serde(default)]
    pub enable_auto_charges: bool,
    #[serde(default)]
    pub mark_price: Option<String>,
}

/// Collects per-field failures so that one response reports all of them.
#[derive(Default)]
struct FieldCheck {
    errors: Vec<FieldError>,
}

impl FieldCheck {
    fn required(&mut self, field: &str, value: &str, kind: DecimalKind) -> Option<Decimal> {
        match kind.parse(value.trim()) {
            Ok(Some(parsed)) => Some(parsed),
            Ok(None) => {
                self.errors.push(FieldError::new(field, "Required"));
                None
            }
            Err(e) => {
                self.errors.push(FieldError::new(field, e.to_string()));
                None
            }
        }
    }

    fn optional(&mut self, field: &str, value: &str, kind: DecimalKind) -> Option<Decimal> {
        match kind.parse(value.trim()) {
            Ok(parsed) => parsed,
            Err(e) => {
                self.errors.push(FieldError::new(field, e.to_string()));
                None
            }
        }
    }

    fn push(&mut self, field: &str, message: &str) {
        self.errors.push(FieldError::new(field, message));
    }
}

impl ComputeInput {
    /// Check every decimal field and build the engine request.
    ///
    /// # Errors
    /// Returns `AppError::Validation` listing each failing field.
    pub fn validate(&self) -> Result<ComputeRequest, AppError> {
        let mut check = FieldCheck::default();
        self.validate_into(&mut check)
            .ok_or(AppError::Validation(check.errors))
    }

    fn validate_into(&self, check: &mut FieldCheck) -> Option<ComputeRequest> {
        let risk_amount = check.required("risk_amount", &self.risk_amount, DecimalKind::Amount);
        let charges_amount =
            check.optional("charges_amount", &self.charges_amount, DecimalKind::Amount);
        let mark_price = match &self.mark_price {
            Some(raw) => check.optional("mark_price", raw, DecimalKind::Amount),
            None => None,
        };

        if self.trades.is_empty() {
            check.push("trades", "At least one trade is required");
        }
        let mut trades = Vec::with_capacity(self.trades.len());
        for (i, input) in self.trades.iter().enumerate() {
            let quantity = check.required(
                &format!("trades[{}].quantity", i),
                &input.quantity,
                DecimalKind::Quantity,
            );
            let price = check.required(
                &format!("trades[{}].price", i),
                &input.price,
                DecimalKind::Amount,
            );
            let charges = check.optional(
                &format!("trades[{}].charges_amount", i),
                &input.charges_amount,
                DecimalKind::Amount,
            );
            if let (Some(quantity), Some(price)) = (quantity, price) {
                let trade = Trade::new(input.kind, input.time, quantity, price);
                trades.push(trade.with_charges(charges.unwrap_or_default()));
            }
        }

        if !check.errors.is_empty() {
            return None;
        }
        let mut request = ComputeRequest::new(
            trades,
            risk_amount?,
            charges_amount.unwrap_or_default(),
        );
        request.enable_auto_charges = self.enable_auto_charges;
        request.mark_price = mark_price;
        Some(request)
    }
}

pub(crate) fn reject_body(rejection: JsonRejection) -> AppError {
    AppError::BadRequest(rejection.body_text())
}

pub async fn compute_position(
    payload: Result<Json<ComputeInput>, JsonRejection>,
) -> Result<Json<Envelope<ComputedPosition>>, AppError> {
    let Json(input) = payload.map_err(reject_body)?;
    let request = input.validate()?;
    let computed = request.compute()?;

    debug!(
        trades = request.trades.len(),
        status = computed.status.as_str(),
        "position computed"
    );

    Ok(Json(Envelope::success("Position computed", computed)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(json: serde_json::Value) -> ComputeInput {
        serde_json::from_value(json).unwrap()
    }

    fn field_errors(result: Result<ComputeRequest, AppError>) -> Vec<FieldError> {
        match result {
            Err(AppError::Validation(errors)) => errors,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_builds_request() {
        let request = input(serde_json::json!({
            "trades": [
                {"kind": "buy", "time": "2024-01-02T09:15:00Z", "quantity": "10", "price": "100"},
                {"kind": "sell", "time": "2024-01-02T10:15:00Z", "quantity": "10", "price": "120.5",
                 "charges_amount": "2.25"}
            ],
            "risk_amount": "100",
            "charges_amount": "10",
            "enable_auto_charges": true
        }))
        .validate()
        .unwrap();

        assert_eq!(request.trades.len(), 2);
        assert_eq!(request.trades[1].price.to_canonical_string(), "120.5");
        assert_eq!(request.trades[1].charges_amount.to_canonical_string(), "2.25");
        assert_eq!(request.charges_amount.to_canonical_string(), "10");
        assert!(request.enable_auto_charges);
        assert_eq!(request.mark_price, None);
    }

    #[test]
    fn test_validate_reports_every_field() {
        let errors = field_errors(
            input(serde_json::json!({
                "trades": [
                    {"kind": "buy", "time": "2024-01-02T09:15:00Z", "quantity": "10", "price": "100"},
                    {"kind": "sell", "time": "2024-01-02T10:15:00Z", "quantity": "1.123456789",
                     "price": "123.456"}
                ],
                "risk_amount": ""
            }))
            .validate(),
        );

        assert_eq!(
            errors,
            vec![
                FieldError::new("risk_amount", "Required"),
                FieldError::new("trades[1].quantity", "Must have at most 8 decimal places"),
                FieldError::new("trades[1].price", "Must have at most 2 decimal places"),
            ]
        );
    }

    #[test]
    fn test_validate_rejects_malformed_and_missing_trades() {
        let errors = field_errors(
            input(serde_json::json!({"risk_amount": "1e3", "trades": []})).validate(),
        );
        assert_eq!(
            errors,
            vec![
                FieldError::new("risk_amount", "Must be a number"),
                FieldError::new("trades", "At least one trade is required"),
            ]
        );
    }

    #[test]
    fn test_validate_mark_price() {
        let request = input(serde_json::json!({
            "trades": [{"kind": "sell", "time": "2024-01-02T09:15:00Z", "quantity": "5", "price": "50"}],
            "risk_amount": "50",
            "mark_price": "45.5"
        }))
        .validate()
        .unwrap();
        assert_eq!(request.mark_price.map(|d| d.to_canonical_string()), Some("45.5".into()));
    }
}
