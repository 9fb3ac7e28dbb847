pub mod api;
pub mod client;
pub mod config;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod filter;
pub mod format;

pub use client::{ApiClient, ApiError, LocalComputer, PositionComputer, RecomputeSession, Session};
pub use config::Config;
pub use db::{init_db, Repository};
pub use domain::{
    Decimal, DecimalKind, DecimalStringError, Direction, Instrument, PositionStatus,
    StoredPosition, Trade, TradeKind,
};
pub use engine::{compute, ComputeError, ComputeRequest, ComputedPosition};
pub use error::AppError;
pub use filter::{FilterStore, PositionFilter, SearchRequest};
pub use format::{format_currency, Currency, FormatOptions};
