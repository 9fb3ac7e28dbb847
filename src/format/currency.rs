//! Currency rendering with locale grouping and compact chart-axis forms.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

use crate::domain::Decimal;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Inr,
    Usd,
    Eur,
    Gbp,
}

/// Digit grouping convention of a currency's locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Grouping {
    /// 1,234,567.89
    Thousands,
    /// 12,34,567.89 (lakh/crore)
    Indian,
}

impl Currency {
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Inr => "₹",
            Currency::Usd => "$",
            Currency::Eur => "€",
            Currency::Gbp => "£",
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Currency::Inr => "INR",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
        }
    }

    fn grouping(&self) -> Grouping {
        match self {
            Currency::Inr => Grouping::Indian,
            _ => Grouping::Thousands,
        }
    }

    /// Compact tiers, largest first: (multiplier, suffix).
    fn compact_tiers(&self) -> &'static [(i64, &'static str)] {
        match self {
            Currency::Inr => &[(10_000_000, "Cr"), (100_000, "L"), (1_000, "K")],
            _ => &[
                (1_000_000_000_000, "T"),
                (1_000_000_000, "B"),
                (1_000_000, "M"),
                (1_000, "K"),
            ],
        }
    }
}

impl FromStr for Currency {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "INR" => Ok(Currency::Inr),
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            "GBP" => Ok(Currency::Gbp),
            _ => Err(FormatError::UnknownCurrency(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("Unknown currency: {0}")]
    UnknownCurrency(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormatOptions {
    pub currency: Currency,
    /// Abbreviate with K/L/Cr (INR) or K/M/B/T suffixes.
    pub compact: bool,
    /// Omit the currency symbol (chart tick labels).
    pub hide_symbol: bool,
}

impl FormatOptions {
    pub fn new(currency: Currency) -> Self {
        Self {
            currency,
            ..Self::default()
        }
    }

    pub fn compact(mut self) -> Self {
        self.compact = true;
        self
    }

    pub fn hide_symbol(mut self) -> Self {
        self.hide_symbol = true;
        self
    }
}

const DISPLAY_DP: u32 = 2;

/// Render `value` as currency text.
pub fn format_currency(value: Decimal, opts: &FormatOptions) -> String {
    let currency = opts.currency;
    let (magnitude, suffix) = if opts.compact {
        compact_magnitude(value.abs(), currency)
    } else {
        (value.abs().round_dp(DISPLAY_DP), "")
    };

    let digits = if opts.compact {
        group_number(&magnitude.to_canonical_string(), currency.grouping())
    } else {
        let mut fixed = magnitude.inner();
        fixed.rescale(DISPLAY_DP);
        group_number(&fixed.to_string(), currency.grouping())
    };

    let mut out = String::with_capacity(digits.len() + 6);
    // Sign follows the rounded magnitude so "-0.001" renders as zero.
    if value.is_negative() && !magnitude.is_zero() {
        out.push('-');
    }
    if !opts.hide_symbol {
        out.push_str(currency.symbol());
    }
    out.push_str(&digits);
    out.push_str(suffix);
    out
}

/// Render a decimal string as currency text.
///
/// # Errors
/// Returns `InvalidAmount` if `value` is not a decimal number.
pub fn format_currency_str(value: &str, opts: &FormatOptions) -> Result<String, FormatError> {
    let decimal = Decimal::from_str_canonical(value.trim())
        .map_err(|_| FormatError::InvalidAmount(value.to_string()))?;
    Ok(format_currency(decimal, opts))
}

/// Parse text produced by [`format_currency`] back into a decimal.
///
/// Accepts the currency symbol (optional), grouping commas and compact suffixes.
///
/// # Errors
/// Returns `InvalidAmount` for anything else.
pub fn parse_currency(text: &str, currency: Currency) -> Result<Decimal, FormatError> {
    let invalid = || FormatError::InvalidAmount(text.to_string());

    let trimmed = text.trim();
    let (negative, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };
    let rest = rest.strip_prefix(currency.symbol()).unwrap_or(rest);

    let mut multiplier = Decimal::one();
    let mut number = rest;
    for (tier, suffix) in currency.compact_tiers() {
        if let Some(stripped) = rest.strip_suffix(suffix) {
            multiplier = Decimal::from(*tier);
            number = stripped;
            break;
        }
    }

    let cleaned: String = number.chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() || !cleaned.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return Err(invalid());
    }
    let magnitude = Decimal::from_str_canonical(&cleaned).map_err(|_| invalid())?;
    let value = magnitude.checked_mul(multiplier).ok_or_else(invalid)?;

    Ok(if negative { -value } else { value })
}

/// Pick the largest tier whose rounded scaled value is at least one.
///
/// Choosing on the rounded value keeps e.g. 999,999 USD at "1M" rather than "1,000K",
/// which makes re-formatting a parsed compact string stable.
fn compact_magnitude(abs: Decimal, currency: Currency) -> (Decimal, &'static str) {
    for (tier, suffix) in currency.compact_tiers() {
        let scaled = (abs / Decimal::from(*tier)).round_dp(DISPLAY_DP);
        if scaled >= Decimal::one() {
            return (scaled, suffix);
        }
    }
    (abs.round_dp(DISPLAY_DP), "")
}

/// Insert grouping separators into the integer part of a plain decimal string.
fn group_number(plain: &str, grouping: Grouping) -> String {
    let (int_part, frac_part) = match plain.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (plain, None),
    };

    let digits: Vec<char> = int_part.chars().collect();
    let mut groups: Vec<String> = Vec::new();
    let mut end = digits.len();
    let mut width = 3;
    while end > 0 {
        let start = end.saturating_sub(width);
        groups.push(digits[start..end].iter().collect());
        end = start;
        if grouping == Grouping::Indian {
            width = 2;
        }
    }
    groups.reverse();

    let mut out = groups.join(",");
    if out.is_empty() {
        out.push('0');
    }
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    fn inr() -> FormatOptions {
        FormatOptions::new(Currency::Inr)
    }

    fn usd() -> FormatOptions {
        FormatOptions::new(Currency::Usd)
    }

    #[test]
    fn test_inr_indian_grouping() {
        assert_eq!(format_currency(d("1234567.891"), &inr()), "₹12,34,567.89");
        assert_eq!(format_currency(d("100000"), &inr()), "₹1,00,000.00");
        assert_eq!(format_currency(d("999"), &inr()), "₹999.00");
        assert_eq!(format_currency(d("0"), &inr()), "₹0.00");
    }

    #[test]
    fn test_usd_thousands_grouping() {
        assert_eq!(format_currency(d("1234567.5"), &usd()), "$1,234,567.50");
        assert_eq!(format_currency(d("12.345"), &usd()), "$12.35");
    }

    #[test]
    fn test_negative_values() {
        assert_eq!(format_currency(d("-190"), &inr()), "-₹190.00");
        assert_eq!(format_currency(d("-0.001"), &inr()), "₹0.00");
    }

    #[test]
    fn test_hide_symbol() {
        assert_eq!(format_currency(d("1500"), &usd().hide_symbol()), "1,500.00");
    }

    #[test]
    fn test_compact_inr() {
        let opts = inr().compact();
        assert_eq!(format_currency(d("950"), &opts), "₹950");
        assert_eq!(format_currency(d("1500"), &opts), "₹1.5K");
        assert_eq!(format_currency(d("250000"), &opts), "₹2.5L");
        assert_eq!(format_currency(d("12345678"), &opts), "₹1.23Cr");
        assert_eq!(format_currency(d("-99999"), &opts), "-₹1L");
    }

    #[test]
    fn test_compact_usd() {
        let opts = usd().compact().hide_symbol();
        assert_eq!(format_currency(d("2500000"), &opts), "2.5M");
        assert_eq!(format_currency(d("999999"), &opts), "1M");
        assert_eq!(format_currency(d("7100000000"), &opts), "7.1B");
        assert_eq!(format_currency(d("3000000000000000"), &opts), "3,000T");
    }

    #[test]
    fn test_compact_is_monotonic() {
        let opts = usd().compact();
        let values = [
            "1", "999", "999.999", "1000", "15000", "999999", "1000000", "2000000000",
        ];
        let mut previous = Decimal::zero();
        for raw in values {
            let shown = parse_currency(&format_currency(d(raw), &opts), Currency::Usd).unwrap();
            assert!(shown >= previous, "{} rendered below previous value", raw);
            previous = shown;
        }
    }

    #[test]
    fn test_round_trip_is_idempotent() {
        let values = ["0", "1234.5", "-98765.4321", "100000", "12345678.9", "0.005"];
        for currency in [Currency::Inr, Currency::Usd, Currency::Eur, Currency::Gbp] {
            for opts in [
                FormatOptions::new(currency),
                FormatOptions::new(currency).compact(),
                FormatOptions::new(currency).compact().hide_symbol(),
            ] {
                for raw in values {
                    let first = format_currency(d(raw), &opts);
                    let reparsed = parse_currency(&first, currency).unwrap();
                    assert_eq!(format_currency(reparsed, &opts), first, "{} {:?}", raw, opts);
                }
            }
        }
    }

    #[test]
    fn test_format_currency_str() {
        assert_eq!(format_currency_str("190", &inr()).unwrap(), "₹190.00");
        assert!(matches!(
            format_currency_str("abc", &inr()),
            Err(FormatError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_currency("₹12x", Currency::Inr).is_err());
        assert!(parse_currency("", Currency::Inr).is_err());
        assert!(parse_currency("$", Currency::Usd).is_err());
    }

    #[test]
    fn test_currency_from_str() {
        assert_eq!("usd".parse::<Currency>().unwrap(), Currency::Usd);
        assert!("XYZ".parse::<Currency>().is_err());
    }
}
