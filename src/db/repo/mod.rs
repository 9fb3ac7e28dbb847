//! Repository layer for database operations.
//!
//! Decimal columns are stored as canonical TEXT; the full position (trades and
//! computed outcome) lives in the JSON `payload` column.

mod positions;

use sqlx::sqlite::SqlitePool;

pub use positions::{PageSpec, PositionQuery, RepoError};

/// Repository for database operations.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }

    /// Readiness check for the underlying pool.
    ///
    /// # Errors
    /// Returns an error if the database cannot be reached.
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
