//! SQLite persistence for journaled positions.
//!
//! - connection setup, pragmas and versioned schema (`migrations`)
//! - the position repository (`repo`)

pub mod migrations;
pub mod repo;

pub use migrations::init_db;
pub use repo::{PageSpec, PositionQuery, RepoError, Repository};
