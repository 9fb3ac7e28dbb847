//! Display formatting for amounts.

pub mod currency;

pub use currency::{
    format_currency, format_currency_str, parse_currency, Currency, FormatError, FormatOptions,
};
