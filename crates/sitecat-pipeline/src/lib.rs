//! Concurrent classification pipeline.
//!
//! Fans a list of domains out across a bounded worker pool, runs each
//! through fetch → extract → classify → assemble, and persists the batch
//! with skip/overwrite dedup against prior runs. Output order always
//! matches input order regardless of completion order; one domain's
//! failure never affects its siblings.

use thiserror::Error;

pub mod runner;
pub mod snippet;
pub mod task;
pub mod traits;

pub use runner::{run_pipeline, RunReport};
pub use snippet::{build_record, extract_snippet, SNIPPET_MAX_LENGTH};
pub use task::{DomainTask, TaskOutcome, TaskState};
pub use traits::{Fetcher, SiteClassifier};

/// Errors that abort a whole pipeline run. Per-domain fetch and
/// classification failures are contained at the task boundary and never
/// show up here; only the store can fail the run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Db(#[from] sitecat_db::DbError),
}
