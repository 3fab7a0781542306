//! The `run` command: wire up the collaborators and drive a full
//! classification run.

use std::path::PathBuf;

use clap::Args;
use sqlx::SqlitePool;

use sitecat_classify::{ClassifierClient, ClassifierConfig};
use sitecat_core::{AppConfig, ExtractionMethod, RenderOptions, RunOptions};
use sitecat_db::BatchIdGenerator;
use sitecat_fetch::{HttpFetcher, NoopOcr};

#[derive(Debug, Args)]
pub(crate) struct RunArgs {
    /// Domains given directly on the command line.
    pub domains: Vec<String>,

    /// File with one domain per line; blank lines and `#` comments are
    /// ignored. Combined with any inline domains.
    #[arg(long, value_name = "FILE")]
    pub domains_file: Option<PathBuf>,

    /// Which text sources feed the classifier: html, ocr, or both.
    #[arg(long, default_value = "html")]
    pub method: ExtractionMethod,

    /// Concurrent worker slots. Defaults to SITECAT_WORKERS.
    #[arg(long)]
    pub workers: Option<usize>,

    /// Re-classify domains that already have a stored result.
    #[arg(long)]
    pub overwrite: bool,

    /// Request a visible browser window from the fetcher.
    #[arg(long)]
    pub headful: bool,

    /// Request anti-detection measures from the fetcher.
    #[arg(long)]
    pub anti_detection: bool,
}

/// Collects the domain list from the inline arguments and the optional
/// domains file, preserving order: file entries first, inline after.
fn load_domains(args: &RunArgs) -> anyhow::Result<Vec<String>> {
    let mut domains: Vec<String> = Vec::new();

    if let Some(path) = &args.domains_file {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("cannot read {}: {e}", path.display()))?;
        domains.extend(
            contents
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(ToString::to_string),
        );
    }

    domains.extend(args.domains.iter().map(|d| d.trim().to_string()));
    domains.retain(|d| !d.is_empty());

    Ok(domains)
}

pub(crate) async fn run_classify(
    pool: &SqlitePool,
    config: &AppConfig,
    args: RunArgs,
) -> anyhow::Result<()> {
    let domains = load_domains(&args)?;
    if domains.is_empty() {
        anyhow::bail!("no domains to classify; pass them inline or via --domains-file");
    }

    let api_key = config
        .classifier_api_key
        .clone()
        .ok_or_else(|| anyhow::anyhow!("OPENAI_API_KEY is not set; the run command needs it"))?;

    let workers = match args.workers {
        Some(0) => anyhow::bail!("--workers must be at least 1"),
        Some(n) => n,
        None => config.default_workers,
    };

    let options = RunOptions {
        method: args.method,
        workers,
        overwrite: args.overwrite,
        render: RenderOptions {
            headless: !args.headful,
            anti_detection: args.anti_detection,
        },
    };

    let fetcher = HttpFetcher::new(config.fetch_timeout_secs, &config.fetch_user_agent)
        .map_err(|e| anyhow::anyhow!("failed to build fetcher: {e}"))?;
    let classifier = ClassifierClient::new(ClassifierConfig::from_app_config(config, api_key))
        .map_err(|e| anyhow::anyhow!("failed to build classifier client: {e}"))?;
    let batch_ids = BatchIdGenerator::new();

    let report = sitecat_pipeline::run_pipeline(
        pool,
        &fetcher,
        &classifier,
        &NoopOcr,
        &batch_ids,
        &domains,
        &options,
    )
    .await?;

    for record in &report.results {
        println!(
            "{}\t{}\t{:.2}\t{}",
            record.domain, record.label, record.confidence, record.summary
        );
    }

    match &report.batch_id {
        Some(batch_id) => println!(
            "batch {batch_id}: {} classified, {} skipped, {} failed \
             ({} inserted, {} updated, {} duplicates)",
            report.processed,
            report.skipped,
            report.failed,
            report.insert_summary.inserted,
            report.insert_summary.updated,
            report.insert_summary.skipped,
        ),
        None => println!(
            "no batch recorded: {} skipped, {} failed",
            report.skipped, report.failed
        ),
    }

    Ok(())
}
