use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod run;
mod store;

#[derive(Debug, Parser)]
#[command(name = "sitecat")]
#[command(about = "Classify website domains and manage the result store")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch, extract, and classify a list of domains.
    Run(run::RunArgs),
    /// Query stored classification results.
    Query(store::QueryArgs),
    /// Show total and per-label result counts.
    Stats {
        /// Restrict counts to one batch.
        #[arg(long)]
        batch: Option<String>,
    },
    /// List recorded batches with their result counts.
    Batches,
    /// Delete one batch and every result it produced.
    DeleteBatch { batch_id: String },
    /// Delete all results and batch metadata.
    Clear {
        /// Skip the confirmation check.
        #[arg(long)]
        yes: bool,
    },
    /// Drop and recreate both tables. Last-resort recovery.
    Reset {
        /// Skip the confirmation check.
        #[arg(long)]
        yes: bool,
    },
    /// Reclaim database file space.
    Vacuum,
    /// Export results as CSV.
    Export(store::ExportArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = sitecat_core::load_app_config()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .init();

    let cli = Cli::parse();

    let pool = sitecat_db::connect_pool(&config.database_path).await?;
    sitecat_db::init_schema(&pool).await?;

    match cli.command {
        Commands::Run(args) => run::run_classify(&pool, &config, args).await?,
        Commands::Query(args) => store::run_query(&pool, args).await?,
        Commands::Stats { batch } => store::run_stats(&pool, batch.as_deref()).await?,
        Commands::Batches => store::run_batches(&pool).await?,
        Commands::DeleteBatch { batch_id } => store::run_delete_batch(&pool, &batch_id).await?,
        Commands::Clear { yes } => store::run_clear(&pool, yes).await?,
        Commands::Reset { yes } => store::run_reset(&pool, yes).await?,
        Commands::Vacuum => store::run_vacuum(&pool).await?,
        Commands::Export(args) => store::run_export(&pool, args).await?,
    }

    Ok(())
}
