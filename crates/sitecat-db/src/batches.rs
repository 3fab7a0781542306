//! Batch metadata lifecycle and time-derived batch id generation.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::DbError;

/// A row from the `batch_metadata` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BatchRow {
    pub batch_id: String,
    pub total_domains: i64,
    pub config: Option<String>,
    pub status: String,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// A batch row joined with its current result count, for listings.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BatchSummaryRow {
    pub batch_id: String,
    pub total_domains: i64,
    pub status: String,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub result_count: i64,
}

/// Generates `batch_YYYYMMDD_HHMMSS` identifiers from the wall clock.
///
/// Ids from one generator are unique within the process: a second id minted
/// in the same clock second gets a `_2`, `_3`, … suffix.
#[derive(Debug, Default)]
pub struct BatchIdGenerator {
    state: Mutex<Option<(String, u32)>>,
}

impl BatchIdGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mints the next batch id for the current wall-clock time.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn next(&self) -> String {
        self.next_at(Utc::now())
    }

    fn next_at(&self, now: DateTime<Utc>) -> String {
        let stamp = format!("batch_{}", now.format("%Y%m%d_%H%M%S"));
        let mut state = self.state.lock().expect("batch id state poisoned");

        match state.as_mut() {
            Some((last, counter)) if *last == stamp => {
                *counter += 1;
                format!("{stamp}_{counter}")
            }
            _ => {
                *state = Some((stamp.clone(), 1));
                stamp
            }
        }
    }
}

/// Creates the batch row in `processing` status with `started_at = now`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails (including a duplicate
/// batch id from another process).
pub async fn begin_batch(
    pool: &SqlitePool,
    batch_id: &str,
    total_domains: i64,
    config: &serde_json::Value,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO batch_metadata (batch_id, total_domains, config, status, started_at) \
         VALUES (?, ?, ?, 'processing', ?)",
    )
    .bind(batch_id)
    .bind(total_domains)
    .bind(config.to_string())
    .bind(Utc::now())
    .execute(pool)
    .await?;

    tracing::info!(batch_id, total_domains, "batch started");
    Ok(())
}

/// Marks a `processing` batch as `completed` and stamps `completed_at`.
///
/// # Errors
///
/// Returns [`DbError::InvalidBatchTransition`] if the batch does not exist
/// or is not in `processing` status, or [`DbError::Sqlx`] if the update
/// fails.
pub async fn complete_batch(pool: &SqlitePool, batch_id: &str) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE batch_metadata SET status = 'completed', completed_at = ? \
         WHERE batch_id = ? AND status = 'processing'",
    )
    .bind(Utc::now())
    .bind(batch_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidBatchTransition {
            batch_id: batch_id.to_string(),
            expected_status: "processing",
        });
    }

    tracing::info!(batch_id, "batch completed");
    Ok(())
}

/// Fetches a single batch row, or `None` if it does not exist.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_batch(pool: &SqlitePool, batch_id: &str) -> Result<Option<BatchRow>, DbError> {
    let row = sqlx::query_as::<_, BatchRow>(
        "SELECT batch_id, total_domains, config, status, started_at, completed_at \
         FROM batch_metadata WHERE batch_id = ?",
    )
    .bind(batch_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// All batches, newest first, each with its live result count.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_batches(pool: &SqlitePool) -> Result<Vec<BatchSummaryRow>, DbError> {
    let rows = sqlx::query_as::<_, BatchSummaryRow>(
        "SELECT b.batch_id, b.total_domains, b.status, b.started_at, b.completed_at, \
                COUNT(r.id) AS result_count \
         FROM batch_metadata b \
         LEFT JOIN classification_results r ON r.batch_id = b.batch_id \
         GROUP BY b.batch_id \
         ORDER BY b.started_at DESC",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
