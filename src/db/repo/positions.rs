//! Position persistence and search pre-filtering for the repository.

use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{Direction, PositionStatus, StoredPosition};
use crate::filter::{PositionFilter, SortOrder};

use super::Repository;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error(transparent)]
    Db(#[from] sqlx::Error),
    #[error("Corrupt position payload: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Column-level subset of a [`PositionFilter`] that SQLite can evaluate.
///
/// Decimal comparisons are left to [`PositionFilter::matches`] since the
/// amounts are stored as text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionQuery {
    pub instrument: Option<String>,
    pub direction: Option<Direction>,
    pub statuses: Vec<PositionStatus>,
    pub opened_from_ms: Option<i64>,
    pub opened_to_ms: Option<i64>,
}

impl PositionQuery {
    pub fn from_filter(filter: &PositionFilter) -> Self {
        Self {
            instrument: filter.instrument.as_ref().map(|s| s.trim().to_string()),
            direction: filter.direction,
            statuses: filter.statuses.clone(),
            opened_from_ms: filter.opened_from.map(|t| t.timestamp_millis()),
            opened_to_ms: filter.opened_to.map(|t| t.timestamp_millis()),
        }
    }

    fn push_conditions(&self, builder: &mut QueryBuilder<'_, Sqlite>) {
        builder.push(" WHERE 1 = 1");
        if let Some(instrument) = &self.instrument {
            builder
                .push(" AND instrument = ")
                .push_bind(instrument.clone())
                .push(" COLLATE NOCASE");
        }
        if let Some(direction) = self.direction {
            builder.push(" AND direction = ").push_bind(direction.as_str());
        }
        if !self.statuses.is_empty() {
            builder.push(" AND status IN (");
            let mut separated = builder.separated(", ");
            for status in &self.statuses {
                separated.push_bind(status.as_str());
            }
            separated.push_unseparated(")");
        }
        if let Some(from_ms) = self.opened_from_ms {
            builder.push(" AND opened_at_ms >= ").push_bind(from_ms);
        }
        if let Some(to_ms) = self.opened_to_ms {
            builder.push(" AND opened_at_ms <= ").push_bind(to_ms);
        }
    }
}

/// One page of positions ordered by open time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSpec {
    pub order: SortOrder,
    pub limit: u32,
    pub offset: u64,
}

impl Repository {
    /// Insert a newly created position.
    ///
    /// # Errors
    /// Returns an error if serialization or the insert fails.
    pub async fn insert_position(&self, position: &StoredPosition) -> Result<(), RepoError> {
        let payload = serde_json::to_string(position)?;
        let computed = &position.computed;

        sqlx::query(
            r#"
            INSERT INTO positions (
                id, instrument, direction, status, opened_at_ms, closed_at_ms,
                net_pnl_amount, r_factor, payload, created_at_ms
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(position.id.to_string())
        .bind(position.instrument.as_str())
        .bind(computed.direction.as_str())
        .bind(computed.status.as_str())
        .bind(computed.opened_at.timestamp_millis())
        .bind(computed.closed_at.map(|t| t.timestamp_millis()))
        .bind(computed.net_pnl_amount.to_canonical_string())
        .bind(computed.r_factor.to_canonical_string())
        .bind(payload)
        .bind(position.created_at.timestamp_millis())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Fetch a position by id.
    ///
    /// # Errors
    /// Returns an error if the query fails or the stored payload is unreadable.
    pub async fn get_position(&self, id: Uuid) -> Result<Option<StoredPosition>, RepoError> {
        let row = sqlx::query("SELECT payload FROM positions WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let payload: String = row.get("payload");
                Ok(Some(serde_json::from_str(&payload)?))
            }
            None => Ok(None),
        }
    }

    /// Query positions matching the column-level filters, ordered by open time.
    ///
    /// # Errors
    /// Returns an error if the query fails or a stored payload is unreadable.
    pub async fn query_positions(
        &self,
        query: &PositionQuery,
    ) -> Result<Vec<StoredPosition>, RepoError> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT payload FROM positions");
        query.push_conditions(&mut builder);
        builder.push(" ORDER BY opened_at_ms ASC, id ASC");

        let rows = builder.build().fetch_all(&self.pool).await?;
        decode_payloads(rows)
    }

    /// Fetch one page of matching positions, ordered by open time then id.
    ///
    /// The id tiebreak is ascending in both orders.
    ///
    /// # Errors
    /// Returns an error if the query fails or a stored payload is unreadable.
    pub async fn page_positions(
        &self,
        query: &PositionQuery,
        page: PageSpec,
    ) -> Result<Vec<StoredPosition>, RepoError> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT payload FROM positions");
        query.push_conditions(&mut builder);
        builder.push(match page.order {
            SortOrder::Asc => " ORDER BY opened_at_ms ASC, id ASC",
            SortOrder::Desc => " ORDER BY opened_at_ms DESC, id ASC",
        });
        builder
            .push(" LIMIT ")
            .push_bind(i64::from(page.limit))
            .push(" OFFSET ")
            .push_bind(i64::try_from(page.offset).unwrap_or(i64::MAX));

        let rows = builder.build().fetch_all(&self.pool).await?;
        decode_payloads(rows)
    }

    /// Count positions matching the column-level filters.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn count_matching(&self, query: &PositionQuery) -> Result<u64, RepoError> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) AS n FROM positions");
        query.push_conditions(&mut builder);

        let row = builder.build().fetch_one(&self.pool).await?;
        Ok(row.get::<i64, _>("n").max(0) as u64)
    }

    /// Count all stored positions.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn count_positions(&self) -> Result<i64, RepoError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM positions")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get::<i64, _>("n"))
    }
}

fn decode_payloads(rows: Vec<SqliteRow>) -> Result<Vec<StoredPosition>, RepoError> {
    rows.into_iter()
        .map(|row| {
            let payload: String = row.get("payload");
            serde_json::from_str(&payload).map_err(RepoError::from)
        })
        .collect()
}
