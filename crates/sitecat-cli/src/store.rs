//! Store inspection and maintenance command handlers.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use sqlx::SqlitePool;

use sitecat_core::Label;
use sitecat_db::{OrderBy, ResultFilter, ResultRow};

#[derive(Debug, Clone, Args)]
pub(crate) struct FilterArgs {
    /// Case-insensitive substring match on the domain.
    #[arg(long)]
    pub domain: Option<String>,

    /// Exact label match: Marketing, Portal, Other, or Error.
    #[arg(long)]
    pub label: Option<Label>,

    /// Restrict to one batch.
    #[arg(long)]
    pub batch: Option<String>,

    /// Minimum confidence, inclusive.
    #[arg(long)]
    pub min_confidence: Option<f64>,
}

impl FilterArgs {
    fn to_filter(&self) -> ResultFilter {
        ResultFilter {
            domain_substring: self.domain.clone(),
            label: self.label,
            batch_id: self.batch.clone(),
            min_confidence: self.min_confidence,
        }
    }
}

#[derive(Debug, Args)]
pub(crate) struct QueryArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Sort order: processed, created, domain, or confidence.
    #[arg(long, default_value = "processed", value_parser = parse_order)]
    pub order: OrderBy,

    #[arg(long, default_value_t = 50)]
    pub limit: i64,

    #[arg(long, default_value_t = 0)]
    pub offset: i64,
}

#[derive(Debug, Args)]
pub(crate) struct ExportArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Destination file; stdout when omitted.
    #[arg(long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

fn parse_order(s: &str) -> Result<OrderBy, String> {
    match s {
        "processed" => Ok(OrderBy::ProcessedAtDesc),
        "created" => Ok(OrderBy::CreatedAtDesc),
        "domain" => Ok(OrderBy::DomainAsc),
        "confidence" => Ok(OrderBy::ConfidenceDesc),
        other => Err(format!(
            "unknown order '{other}'; expected processed, created, domain, or confidence"
        )),
    }
}

pub(crate) async fn run_query(pool: &SqlitePool, args: QueryArgs) -> anyhow::Result<()> {
    let rows = sitecat_db::query_results(
        pool,
        &args.filter.to_filter(),
        args.order,
        Some(args.limit),
        args.offset,
    )
    .await?;

    if rows.is_empty() {
        println!("no matching results");
        return Ok(());
    }

    for row in &rows {
        println!(
            "{}\t{}\t{:.2}\t{}\t{}",
            row.domain,
            row.label,
            row.confidence,
            row.batch_id.as_deref().unwrap_or("-"),
            row.summary,
        );
    }
    println!("{} result(s)", rows.len());

    Ok(())
}

pub(crate) async fn run_stats(pool: &SqlitePool, batch_id: Option<&str>) -> anyhow::Result<()> {
    let stats = sitecat_db::stats(pool, batch_id).await?;

    match batch_id {
        Some(batch_id) => println!("batch {batch_id}: {} result(s)", stats.total),
        None => println!("{} result(s) stored", stats.total),
    }
    for (label, count) in &stats.by_label {
        println!("  {label}: {count}");
    }

    Ok(())
}

pub(crate) async fn run_batches(pool: &SqlitePool) -> anyhow::Result<()> {
    let batches = sitecat_db::list_batches(pool).await?;

    if batches.is_empty() {
        println!("no batches recorded");
        return Ok(());
    }

    for batch in &batches {
        let completed = batch
            .completed_at
            .map_or_else(|| "-".to_string(), |t| t.to_rfc3339());
        println!(
            "{}\t{}\t{}/{} result(s)\tcompleted {}",
            batch.batch_id, batch.status, batch.result_count, batch.total_domains, completed,
        );
    }

    Ok(())
}

pub(crate) async fn run_delete_batch(pool: &SqlitePool, batch_id: &str) -> anyhow::Result<()> {
    if sitecat_db::get_batch(pool, batch_id).await?.is_none() {
        anyhow::bail!("batch '{batch_id}' not found");
    }

    let deleted = sitecat_db::delete_batch(pool, batch_id).await?;
    println!("deleted batch {batch_id} and {deleted} result(s)");
    Ok(())
}

pub(crate) async fn run_clear(pool: &SqlitePool, yes: bool) -> anyhow::Result<()> {
    if !yes {
        anyhow::bail!("clear deletes every stored result; re-run with --yes to confirm");
    }

    let summary = sitecat_db::clear_all(pool).await?;
    println!(
        "cleared {} result(s) and {} batch(es)",
        summary.results_deleted, summary.batches_deleted
    );
    Ok(())
}

pub(crate) async fn run_reset(pool: &SqlitePool, yes: bool) -> anyhow::Result<()> {
    if !yes {
        anyhow::bail!("reset drops and recreates both tables; re-run with --yes to confirm");
    }

    sitecat_db::reset_schema(pool).await?;
    println!("schema dropped and recreated");
    Ok(())
}

pub(crate) async fn run_vacuum(pool: &SqlitePool) -> anyhow::Result<()> {
    sitecat_db::vacuum(pool).await?;
    println!("vacuum complete");
    Ok(())
}

pub(crate) async fn run_export(pool: &SqlitePool, args: ExportArgs) -> anyhow::Result<()> {
    let rows = sitecat_db::query_results(
        pool,
        &args.filter.to_filter(),
        OrderBy::ProcessedAtDesc,
        None,
        0,
    )
    .await?;

    let csv = render_csv(&rows);

    match &args.output {
        Some(path) => {
            std::fs::write(path, csv)
                .map_err(|e| anyhow::anyhow!("cannot write {}: {e}", path.display()))?;
            println!("exported {} result(s) to {}", rows.len(), path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(csv.as_bytes())?;
        }
    }

    Ok(())
}

const CSV_HEADER: &str = "domain,label,confidence,summary,snippet,extraction_method,\
                          processing_method,batch_id,processed_at,created_at";

fn render_csv(rows: &[ResultRow]) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');

    for row in rows {
        let fields = [
            csv_field(&row.domain),
            csv_field(&row.label),
            format!("{:.4}", row.confidence),
            csv_field(&row.summary),
            csv_field(&row.snippet),
            csv_field(&row.extraction_method),
            csv_field(&row.processing_method),
            csv_field(row.batch_id.as_deref().unwrap_or("")),
            row.processed_at.to_rfc3339(),
            row.created_at.to_rfc3339(),
        ];
        out.push_str(&fields.join(","));
        out.push('\n');
    }

    out
}

/// Quotes a CSV field when it contains a delimiter, quote, or newline.
fn csv_field(value: &str) -> String {
    if value.contains(['"', ',', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    #[test]
    fn plain_csv_fields_pass_through() {
        assert_eq!(csv_field("example.com"), "example.com");
    }

    #[test]
    fn fields_with_delimiters_are_quoted_and_escaped() {
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_field("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn order_names_parse() {
        assert_eq!(parse_order("processed").unwrap(), OrderBy::ProcessedAtDesc);
        assert_eq!(parse_order("confidence").unwrap(), OrderBy::ConfidenceDesc);
        assert!(parse_order("random").is_err());
    }

    #[test]
    fn csv_output_has_header_and_one_line_per_row() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let row = ResultRow {
            id: 1,
            domain: "example.com".to_string(),
            label: "Marketing".to_string(),
            summary: "sells widgets, cheap".to_string(),
            confidence: 0.92,
            snippet: "Widgets for less".to_string(),
            html_content: String::new(),
            ocr_content: String::new(),
            extraction_method: "html".to_string(),
            processing_method: "http fetcher (headless)".to_string(),
            batch_id: Some("batch_20250601_120000".to_string()),
            processed_at: now,
            created_at: now,
        };

        let csv = render_csv(&[row]);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("domain,label,confidence"));
        assert!(lines[1].contains("\"sells widgets, cheap\""));
        assert!(lines[1].contains("0.9200"));
    }
}
