use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use thiserror::Error;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 10;

/// Schema for the two persisted tables. Executed idempotently at startup and
/// again by [`results::reset_schema`] after a drop, which is why this lives
/// as an inline script rather than a migration directory.
const SCHEMA_SQL: &str = "\
CREATE TABLE IF NOT EXISTS classification_results (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    domain TEXT NOT NULL,
    domain_key TEXT NOT NULL,
    label TEXT NOT NULL,
    summary TEXT NOT NULL DEFAULT '',
    confidence REAL NOT NULL DEFAULT 0.0,
    snippet TEXT NOT NULL DEFAULT '',
    html_content TEXT NOT NULL DEFAULT '',
    ocr_content TEXT NOT NULL DEFAULT '',
    extraction_method TEXT NOT NULL DEFAULT '',
    processing_method TEXT NOT NULL DEFAULT '',
    batch_id TEXT,
    processed_at TIMESTAMP NOT NULL,
    created_at TIMESTAMP NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_results_domain_key ON classification_results (domain_key);
CREATE INDEX IF NOT EXISTS idx_results_label ON classification_results (label);
CREATE INDEX IF NOT EXISTS idx_results_batch ON classification_results (batch_id);
CREATE INDEX IF NOT EXISTS idx_results_processed_at ON classification_results (processed_at);

CREATE TABLE IF NOT EXISTS batch_metadata (
    batch_id TEXT PRIMARY KEY,
    total_domains INTEGER NOT NULL DEFAULT 0,
    config TEXT,
    status TEXT NOT NULL DEFAULT 'processing',
    started_at TIMESTAMP,
    completed_at TIMESTAMP
);
";

#[derive(Debug, Error)]
pub enum DbError {
    #[error("batch {batch_id} is not in '{expected_status}' status")]
    InvalidBatchTransition {
        batch_id: String,
        expected_status: &'static str,
    },
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Open (creating if missing) the `SQLite` database at `path`.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the file cannot be opened or the pool cannot
/// be established.
pub async fn connect_pool(path: &Path) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);

    SqlitePoolOptions::new()
        .max_connections(DEFAULT_MAX_CONNECTIONS)
        .acquire_timeout(Duration::from_secs(DEFAULT_ACQUIRE_TIMEOUT_SECS))
        .connect_with(options)
        .await
}

/// Open a private in-memory database on a single connection.
///
/// A single connection is mandatory: each new `:memory:` connection would
/// otherwise see its own empty database.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the pool cannot be established.
pub async fn connect_in_memory() -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
}

/// Create both tables and their indexes if they do not exist yet.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any DDL statement fails.
pub async fn init_schema(pool: &SqlitePool) -> Result<(), DbError> {
    sqlx::raw_sql(SCHEMA_SQL).execute(pool).await?;
    Ok(())
}

/// Send a `SELECT 1` to verify the pool has a live connection.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn ping(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(pool)
        .await?;
    Ok(())
}

pub mod batches;
pub mod results;

pub use batches::{
    begin_batch, complete_batch, get_batch, list_batches, BatchIdGenerator, BatchRow,
    BatchSummaryRow,
};
pub use results::{
    clear_all, delete_batch, domain_exists, get_result, query_results, reset_schema, stats,
    upsert_batch, vacuum, ClearSummary, InsertSummary, OrderBy, ResultFilter, ResultRow,
    StoreStats,
};
