//! Result-store operations for the `classification_results` table.
//!
//! Dedup is keyed on the `domain_key` column, precomputed by
//! [`normalize_domain`] at insert time. SQLite's `LOWER` is ASCII-only, so
//! the key must be normalized in Rust for non-ASCII domains to dedup
//! consistently. The stored `domain` column keeps the trimmed original
//! casing. Overwrite is modeled as delete-then-insert, never an in-place
//! update. All writes go through a transaction and are durable when the
//! call returns.

use std::collections::BTreeMap;

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use sitecat_core::{normalize_domain, ClassificationRecord, Label};

use crate::DbError;

const RESULT_COLUMNS: &str = "id, domain, label, summary, confidence, snippet, \
     html_content, ocr_content, extraction_method, processing_method, \
     batch_id, processed_at, created_at";

/// A row from the `classification_results` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ResultRow {
    pub id: i64,
    pub domain: String,
    pub label: String,
    pub summary: String,
    pub confidence: f64,
    pub snippet: String,
    pub html_content: String,
    pub ocr_content: String,
    pub extraction_method: String,
    pub processing_method: String,
    pub batch_id: Option<String>,
    pub processed_at: chrono::DateTime<Utc>,
    pub created_at: chrono::DateTime<Utc>,
}

impl ResultRow {
    /// Parsed label, falling back to `Error` for rows written by an
    /// incompatible schema version.
    #[must_use]
    pub fn label(&self) -> Label {
        self.label.parse().unwrap_or(Label::Error)
    }
}

/// Per-record outcome counts from [`upsert_batch`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InsertSummary {
    pub inserted: u64,
    pub updated: u64,
    pub skipped: u64,
}

/// Counts returned by [`clear_all`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClearSummary {
    pub results_deleted: u64,
    pub batches_deleted: u64,
}

/// AND-combined query filters; `None` fields match everything.
#[derive(Debug, Clone, Default)]
pub struct ResultFilter {
    pub domain_substring: Option<String>,
    pub label: Option<Label>,
    pub batch_id: Option<String>,
    pub min_confidence: Option<f64>,
}

/// Whitelisted orderings for [`query_results`]. The original system
/// interpolated a caller-supplied ORDER BY clause; an enum closes that hole.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OrderBy {
    #[default]
    ProcessedAtDesc,
    CreatedAtDesc,
    DomainAsc,
    ConfidenceDesc,
}

impl OrderBy {
    fn clause(self) -> &'static str {
        match self {
            OrderBy::ProcessedAtDesc => " ORDER BY processed_at DESC, id DESC",
            OrderBy::CreatedAtDesc => " ORDER BY created_at DESC, id DESC",
            OrderBy::DomainAsc => " ORDER BY domain ASC, id DESC",
            OrderBy::ConfidenceDesc => " ORDER BY confidence DESC, id DESC",
        }
    }
}

/// Aggregate counts from [`stats`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub total: i64,
    pub by_label: BTreeMap<String, i64>,
}

/// Returns `true` if an active record exists for the normalized domain.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the lookup fails.
pub async fn domain_exists(pool: &SqlitePool, domain: &str) -> Result<bool, DbError> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM classification_results WHERE domain_key = ?")
            .bind(normalize_domain(domain))
            .fetch_one(pool)
            .await?;

    Ok(count > 0)
}

/// Fetches the most recent active record for the normalized domain.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_result(pool: &SqlitePool, domain: &str) -> Result<Option<ResultRow>, DbError> {
    let row = sqlx::query_as::<_, ResultRow>(&format!(
        "SELECT {RESULT_COLUMNS} FROM classification_results \
         WHERE domain_key = ? \
         ORDER BY processed_at DESC, id DESC LIMIT 1",
    ))
    .bind(normalize_domain(domain))
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Inserts a batch of records under skip/overwrite policy, in one transaction.
///
/// Per record: an existing active record for the same normalized domain is
/// skipped when `overwrite` is false, or deleted and replaced when it is
/// true. Check-then-act happens inside the transaction, which bounds (but
/// does not eliminate) duplicate-row risk across concurrent processes.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement or the commit fails; nothing
/// is persisted in that case.
pub async fn upsert_batch(
    pool: &SqlitePool,
    records: &[ClassificationRecord],
    batch_id: &str,
    overwrite: bool,
) -> Result<InsertSummary, DbError> {
    let mut tx = pool.begin().await?;
    let mut summary = InsertSummary::default();
    let now = Utc::now();

    for record in records {
        let normalized = normalize_domain(&record.domain);
        let existing: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM classification_results WHERE domain_key = ?")
                .bind(&normalized)
                .fetch_one(&mut *tx)
                .await?;

        if existing > 0 {
            if !overwrite {
                summary.skipped += 1;
                continue;
            }
            sqlx::query("DELETE FROM classification_results WHERE domain_key = ?")
                .bind(&normalized)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query(
            "INSERT INTO classification_results \
                 (domain, domain_key, label, summary, confidence, snippet, html_content, \
                  ocr_content, extraction_method, processing_method, batch_id, processed_at, \
                  created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(record.domain.trim())
        .bind(&normalized)
        .bind(record.label.to_string())
        .bind(&record.summary)
        .bind(record.confidence)
        .bind(&record.snippet)
        .bind(&record.html_content)
        .bind(&record.ocr_content)
        .bind(&record.extraction_method)
        .bind(&record.processing_method)
        .bind(batch_id)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if existing > 0 {
            summary.updated += 1;
        } else {
            summary.inserted += 1;
        }
    }

    tx.commit().await?;

    tracing::info!(
        batch_id,
        inserted = summary.inserted,
        updated = summary.updated,
        skipped = summary.skipped,
        "persisted classification batch"
    );

    Ok(summary)
}

/// Queries results with AND-combined filters, pagination, and a whitelisted
/// ordering. The domain filter is a case-insensitive substring match.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn query_results(
    pool: &SqlitePool,
    filter: &ResultFilter,
    order: OrderBy,
    limit: Option<i64>,
    offset: i64,
) -> Result<Vec<ResultRow>, DbError> {
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
        "SELECT {RESULT_COLUMNS} FROM classification_results WHERE 1=1"
    ));

    if let Some(substring) = &filter.domain_substring {
        qb.push(" AND INSTR(domain_key, ");
        qb.push_bind(normalize_domain(substring));
        qb.push(") > 0");
    }
    if let Some(label) = filter.label {
        qb.push(" AND label = ");
        qb.push_bind(label.to_string());
    }
    if let Some(batch_id) = &filter.batch_id {
        qb.push(" AND batch_id = ");
        qb.push_bind(batch_id.clone());
    }
    if let Some(min_confidence) = filter.min_confidence {
        qb.push(" AND confidence >= ");
        qb.push_bind(min_confidence);
    }

    qb.push(order.clause());

    if let Some(limit) = limit {
        qb.push(" LIMIT ");
        qb.push_bind(limit);
        qb.push(" OFFSET ");
        qb.push_bind(offset);
    }

    let rows = qb.build_query_as::<ResultRow>().fetch_all(pool).await?;
    Ok(rows)
}

/// Deletes all results carrying `batch_id` and the batch row itself.
///
/// Returns the number of deleted result rows.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if either delete fails.
pub async fn delete_batch(pool: &SqlitePool, batch_id: &str) -> Result<u64, DbError> {
    let mut tx = pool.begin().await?;

    let deleted = sqlx::query("DELETE FROM classification_results WHERE batch_id = ?")
        .bind(batch_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    sqlx::query("DELETE FROM batch_metadata WHERE batch_id = ?")
        .bind(batch_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(batch_id, deleted, "deleted batch and its results");
    Ok(deleted)
}

/// Deletes every result and batch row. Destructive and irreversible; also
/// resets the autoincrement counter.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any delete fails.
pub async fn clear_all(pool: &SqlitePool) -> Result<ClearSummary, DbError> {
    let mut tx = pool.begin().await?;

    let results_deleted = sqlx::query("DELETE FROM classification_results")
        .execute(&mut *tx)
        .await?
        .rows_affected();
    let batches_deleted = sqlx::query("DELETE FROM batch_metadata")
        .execute(&mut *tx)
        .await?
        .rows_affected();

    // sqlite_sequence does not exist until an AUTOINCREMENT table has seen
    // an insert; treat its absence as already-reset.
    sqlx::query("DELETE FROM sqlite_sequence WHERE name = 'classification_results'")
        .execute(&mut *tx)
        .await
        .ok();

    tx.commit().await?;

    tracing::info!(results_deleted, batches_deleted, "cleared all store data");

    Ok(ClearSummary {
        results_deleted,
        batches_deleted,
    })
}

/// Drops and recreates both tables. Catastrophic-recovery path only.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if a drop or the schema re-init fails.
pub async fn reset_schema(pool: &SqlitePool) -> Result<(), DbError> {
    sqlx::raw_sql(
        "DROP TABLE IF EXISTS classification_results;\n\
         DROP TABLE IF EXISTS batch_metadata;",
    )
    .execute(pool)
    .await?;

    crate::init_schema(pool).await?;

    tracing::warn!("store schema dropped and recreated");
    Ok(())
}

/// Reclaims file space. No semantic effect.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the `VACUUM` fails.
pub async fn vacuum(pool: &SqlitePool) -> Result<(), DbError> {
    sqlx::query("VACUUM").execute(pool).await?;
    Ok(())
}

/// Total and per-label counts, optionally restricted to one batch.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the aggregation fails.
pub async fn stats(pool: &SqlitePool, batch_id: Option<&str>) -> Result<StoreStats, DbError> {
    let rows: Vec<(String, i64)> = match batch_id {
        Some(batch_id) => {
            sqlx::query_as(
                "SELECT label, COUNT(*) FROM classification_results \
                 WHERE batch_id = ? GROUP BY label",
            )
            .bind(batch_id)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as("SELECT label, COUNT(*) FROM classification_results GROUP BY label")
                .fetch_all(pool)
                .await?
        }
    };

    let by_label: BTreeMap<String, i64> = rows.into_iter().collect();
    let total = by_label.values().sum();

    Ok(StoreStats { total, by_label })
}
