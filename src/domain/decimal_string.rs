//! Validation of decimal text input against a precision/scale contract.
//!
//! Each field kind carries a fixed precision (total significant digits) and scale
//! (fractional digits). An empty string is "unset" and always valid.

use crate::domain::Decimal;
use serde::Serialize;
use thiserror::Error;

/// Field kind with its precision/scale contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DecimalKind {
    /// Money amounts: 14 digits, 2 decimals.
    Amount,
    /// Quantities: 20 digits, 8 decimals.
    Quantity,
}

impl DecimalKind {
    pub fn precision(&self) -> usize {
        match self {
            DecimalKind::Amount => 14,
            DecimalKind::Quantity => 20,
        }
    }

    pub fn scale(&self) -> usize {
        match self {
            DecimalKind::Amount => 2,
            DecimalKind::Quantity => 8,
        }
    }

    /// Validate `value` and parse it. Empty input yields `Ok(None)`.
    ///
    /// # Errors
    /// Returns the validation failure for malformed or out-of-contract input.
    pub fn parse(&self, value: &str) -> Result<Option<Decimal>, DecimalStringError> {
        validate(value, *self)?;
        let (negative, unsigned) = match value.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, value),
        };
        if unsigned.is_empty() || unsigned == "." {
            // "-" and "." are accepted while typing but carry no value.
            return Ok(None);
        }

        // Input may omit digits on either side of the point ("5.", ".5").
        let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, ""));
        let mut normalized = String::with_capacity(value.len() + 1);
        if negative {
            normalized.push('-');
        }
        normalized.push_str(if int_part.is_empty() { "0" } else { int_part });
        if !frac_part.is_empty() {
            normalized.push('.');
            normalized.push_str(frac_part);
        }
        Decimal::from_str_canonical(&normalized)
            .map(Some)
            .map_err(|_| DecimalStringError::Malformed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecimalStringError {
    #[error("Must be a number")]
    Malformed,
    #[error("Must have at most {precision} digits")]
    TooManyDigits { precision: usize },
    #[error("Must have at most {scale} decimal places")]
    TooManyDecimals { scale: usize },
}

/// Validate a decimal string for the given field kind.
///
/// # Errors
/// - `Malformed` for any character outside an optional leading `-`, digits and one `.`
/// - `TooManyDecimals` when the fractional digits exceed the kind's scale
/// - `TooManyDigits` when integer plus fractional digits exceed the kind's precision
pub fn validate(value: &str, kind: DecimalKind) -> Result<(), DecimalStringError> {
    if value.is_empty() {
        return Ok(());
    }

    let unsigned = value.strip_prefix('-').unwrap_or(value);
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((int_part, frac_part)) => (int_part, frac_part),
        None => (unsigned, ""),
    };

    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(int_part) || !all_digits(frac_part) {
        return Err(DecimalStringError::Malformed);
    }

    let stripped = int_part.trim_start_matches('0');
    let int_digits = if stripped.is_empty() { 1 } else { stripped.len() };
    let frac_digits = frac_part.len();

    if frac_digits > kind.scale() {
        return Err(DecimalStringError::TooManyDecimals { scale: kind.scale() });
    }
    if int_digits + frac_digits > kind.precision() {
        return Err(DecimalStringError::TooManyDigits {
            precision: kind.precision(),
        });
    }

    Ok(())
}

/// Serializable `{valid, error}` view of a validation outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Validation {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Validation {
    pub fn of(value: &str, kind: DecimalKind) -> Self {
        match validate(value, kind) {
            Ok(()) => Validation {
                valid: true,
                error: None,
            },
            Err(e) => Validation {
                valid: false,
                error: Some(e.to_string()),
            },
        }
    }
}
