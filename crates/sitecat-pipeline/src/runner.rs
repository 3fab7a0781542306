//! Pipeline orchestration: partition, fan-out, merge, persist.

use std::collections::{BTreeMap, HashMap};

use futures::stream::{self, StreamExt};
use sqlx::SqlitePool;

use sitecat_core::{normalize_domain, ClassificationRecord, Label, RunOptions};
use sitecat_db::{BatchIdGenerator, InsertSummary, ResultRow};
use sitecat_fetch::TextFromImage;

use crate::task::{DomainTask, TaskOutcome};
use crate::traits::{Fetcher, SiteClassifier};
use crate::PipelineError;

/// Outcome of one pipeline run.
///
/// `results` follows the original input domain order. `processed` counts
/// newly produced records, `skipped` counts input entries satisfied by
/// prior runs, and `failed` counts dispatched domains that produced no
/// record (fetch failures). `batch_id` is `None` when the run dispatched
/// no work or produced no records.
#[derive(Debug)]
pub struct RunReport {
    pub results: Vec<ClassificationRecord>,
    pub batch_id: Option<String>,
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub insert_summary: InsertSummary,
}

/// Runs the full classification pipeline over `domains`.
///
/// 1. Partition input into already-stored and to-process (skipped entirely
///    under `overwrite`).
/// 2. Open a batch sized to the dispatched domain count.
/// 3. Fan tasks out across `options.workers` concurrent slots; tasks fail
///    independently.
/// 4. Merge new and prior records keyed by normalized domain (new wins)
///    and emit them in original input order.
/// 5. Persist the new records and complete the batch; a run whose tasks
///    all failed deletes its batch row instead and reports no batch.
///
/// # Errors
///
/// Returns [`PipelineError::Db`] if any store operation fails; per-domain
/// fetch and classification failures never abort the run.
pub async fn run_pipeline(
    pool: &SqlitePool,
    fetcher: &dyn Fetcher,
    classifier: &dyn SiteClassifier,
    ocr: &dyn TextFromImage,
    batch_ids: &BatchIdGenerator,
    domains: &[String],
    options: &RunOptions,
) -> Result<RunReport, PipelineError> {
    // Step 1: decide what actually needs work.
    let mut existing: HashMap<String, ClassificationRecord> = HashMap::new();
    let mut to_process: Vec<String> = Vec::new();
    let mut skipped = 0usize;

    for domain in domains {
        if options.overwrite {
            to_process.push(domain.clone());
            continue;
        }
        match sitecat_db::get_result(pool, domain).await? {
            Some(row) => {
                tracing::info!(domain = %domain, "skipping already classified domain");
                existing.insert(normalize_domain(domain), row_to_record(row));
                skipped += 1;
            }
            None => to_process.push(domain.clone()),
        }
    }

    if to_process.is_empty() {
        tracing::info!(skipped, "no new domains to process");
        return Ok(RunReport {
            results: ordered_results(domains, &existing),
            batch_id: None,
            processed: 0,
            skipped,
            failed: 0,
            insert_summary: InsertSummary::default(),
        });
    }

    // Step 2: open the batch before dispatch. `total_domains` counts the
    // dispatched domains, repeats included, not the merged output.
    let batch_id = batch_ids.next();
    let total = i64::try_from(to_process.len()).unwrap_or(i64::MAX);
    sitecat_db::begin_batch(pool, &batch_id, total, &options.to_config_json()).await?;

    tracing::info!(
        batch_id,
        dispatched = to_process.len(),
        skipped,
        workers = options.workers,
        "starting classification run"
    );

    // Step 3: bounded fan-out. Completion order is unconstrained; outcomes
    // carry their original index.
    let outcomes: Vec<TaskOutcome> = stream::iter(
        to_process
            .iter()
            .enumerate()
            .map(|(index, domain)| DomainTask::new(domain.clone(), index))
            .map(|task| task.run(fetcher, classifier, ocr, options)),
    )
    .buffer_unordered(options.workers.max(1))
    .collect()
    .await;

    // Step 4: collect keyed by original index; count failures.
    let mut new_records: BTreeMap<usize, ClassificationRecord> = BTreeMap::new();
    let mut failed = 0usize;
    for outcome in outcomes {
        match outcome {
            TaskOutcome::Completed { index, record } => {
                new_records.insert(index, record);
            }
            TaskOutcome::Failed { domain, reason, .. } => {
                tracing::warn!(domain = %domain, reason = %reason, "domain dropped from output");
                failed += 1;
            }
        }
    }

    let processed = new_records.len();

    // A batch with zero produced records is represented as no batch at all.
    if new_records.is_empty() {
        tracing::warn!(batch_id, failed, "run produced no records — discarding batch");
        sitecat_db::delete_batch(pool, &batch_id).await?;
        return Ok(RunReport {
            results: ordered_results(domains, &existing),
            batch_id: None,
            processed: 0,
            skipped,
            failed,
            insert_summary: InsertSummary::default(),
        });
    }

    // Step 5: persist, then merge for output. New records win over prior
    // ones, which only matters under overwrite.
    let records: Vec<ClassificationRecord> = new_records.into_values().collect();
    let insert_summary =
        sitecat_db::upsert_batch(pool, &records, &batch_id, options.overwrite).await?;
    sitecat_db::complete_batch(pool, &batch_id).await?;

    let mut merged = existing;
    for record in records {
        merged.insert(normalize_domain(&record.domain), record);
    }

    Ok(RunReport {
        results: ordered_results(domains, &merged),
        batch_id: Some(batch_id),
        processed,
        skipped,
        failed,
        insert_summary,
    })
}

/// Walks the original input order and emits the merged record for every
/// domain that has one. Domains whose tasks failed are simply absent.
fn ordered_results(
    domains: &[String],
    merged: &HashMap<String, ClassificationRecord>,
) -> Vec<ClassificationRecord> {
    domains
        .iter()
        .filter_map(|domain| merged.get(&normalize_domain(domain)).cloned())
        .collect()
}

fn row_to_record(row: ResultRow) -> ClassificationRecord {
    let label: Label = row.label();
    ClassificationRecord {
        domain: row.domain,
        label,
        summary: row.summary,
        confidence: row.confidence,
        snippet: row.snippet,
        html_content: row.html_content,
        ocr_content: row.ocr_content,
        extraction_method: row.extraction_method,
        processing_method: row.processing_method,
    }
}
