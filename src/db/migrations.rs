//! Database initialization and versioned schema setup.

use sqlx::sqlite::{SqliteConnection, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::path::Path;
use tracing::{debug, info};

/// Bumped whenever `schema.sql` changes; stored in `PRAGMA user_version`.
pub const SCHEMA_VERSION: i64 = 1;

const CONNECTION_PRAGMAS: &[&str] = &[
    "PRAGMA foreign_keys = ON",
    "PRAGMA busy_timeout = 5000",
    "PRAGMA synchronous = NORMAL",
];

/// Open (creating if needed) the journal database and bring its schema up to date.
///
/// # Errors
/// Returns an error if the parent directory cannot be created, the database cannot be
/// opened, or a schema statement fails.
pub async fn init_db(db_path: &str) -> Result<SqlitePool, sqlx::Error> {
    if let Some(parent) = Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(sqlx::Error::Io)?;
        }
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .after_connect(|conn, _meta| Box::pin(async move { configure_connection(conn).await }))
        .connect(&format!("sqlite:{}?mode=rwc", db_path))
        .await?;

    let applied = run_migrations(&pool).await?;
    info!(
        path = db_path,
        schema_version = SCHEMA_VERSION,
        applied,
        "Database ready"
    );
    Ok(pool)
}

/// Apply `schema.sql` when the stored version is behind. Returns whether it ran.
async fn run_migrations(pool: &SqlitePool) -> Result<bool, sqlx::Error> {
    let current = schema_version(pool).await?;
    if current >= SCHEMA_VERSION {
        debug!(current, "Schema up to date");
        return Ok(false);
    }

    let mut tx = pool.begin().await?;
    for statement in include_str!("schema.sql").split(';') {
        let trimmed = statement.trim();
        if !trimmed.is_empty() {
            sqlx::query(trimmed).execute(&mut *tx).await?;
        }
    }
    // PRAGMA does not accept bound parameters.
    sqlx::query(&format!("PRAGMA user_version = {}", SCHEMA_VERSION))
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    debug!(from = current, to = SCHEMA_VERSION, "Schema migrated");
    Ok(true)
}

async fn schema_version(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    let row = sqlx::query("PRAGMA user_version").fetch_one(pool).await?;
    Ok(row.get(0))
}

async fn configure_connection(conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    for pragma in CONNECTION_PRAGMAS {
        sqlx::query(pragma).execute(&mut *conn).await?;
    }

    // journal_mode answers with the mode actually in effect.
    let row = sqlx::query("PRAGMA journal_mode = WAL")
        .fetch_one(&mut *conn)
        .await?;
    let journal_mode: String = row.get(0);
    debug!(%journal_mode, "SQLite connection configured");
    Ok(())
}
