//! Per-domain unit of work.
//!
//! A task runs the fetch → extract → classify → assemble sequence to
//! completion on one worker. Fetch failure is terminal: there is nothing
//! to classify, the task fails, and the domain is omitted from output.
//! Classifier retry exhaustion is not: it becomes a synthetic `Error`
//! record with confidence 0.0 so the outcome is still durably recorded.

use sitecat_classify::Classification;
use sitecat_core::{ClassificationRecord, ExtractionMethod, Label, RunOptions};
use sitecat_fetch::{extract_text, FetchedPage, TextFromImage};

use crate::snippet::build_record;
use crate::traits::{Fetcher, SiteClassifier};

/// Lifecycle of a [`DomainTask`]. `Done` and `Failed` are disjoint
/// terminals; the error edge into `Failed` can fire from any other state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    Fetching,
    Extracting,
    Classifying,
    Assembled,
    Done,
    Failed,
}

/// What one finished task contributes to the run.
#[derive(Debug)]
pub enum TaskOutcome {
    Completed {
        index: usize,
        record: ClassificationRecord,
    },
    Failed {
        index: usize,
        domain: String,
        reason: String,
    },
}

/// One domain's in-flight work, owned by the orchestrator for the duration
/// of a run and discarded after its outcome is merged.
#[derive(Debug)]
pub struct DomainTask {
    domain: String,
    index: usize,
    state: TaskState,
}

impl DomainTask {
    #[must_use]
    pub fn new(domain: String, index: usize) -> Self {
        Self {
            domain,
            index,
            state: TaskState::Pending,
        }
    }

    #[must_use]
    pub fn state(&self) -> TaskState {
        self.state
    }

    fn transition(&mut self, next: TaskState) {
        tracing::debug!(domain = %self.domain, from = ?self.state, to = ?next, "task transition");
        self.state = next;
    }

    /// Runs the task to a terminal state and returns its outcome.
    pub async fn run(
        mut self,
        fetcher: &dyn Fetcher,
        classifier: &dyn SiteClassifier,
        ocr: &dyn TextFromImage,
        options: &RunOptions,
    ) -> TaskOutcome {
        // Step 1: fetch. A failure here is terminal for the task.
        self.transition(TaskState::Fetching);
        let page = match fetcher.fetch(&self.domain, &options.render).await {
            Ok(page) => page,
            Err(err) => {
                tracing::error!(domain = %self.domain, error = %err, "fetch failed — dropping domain");
                self.transition(TaskState::Failed);
                return TaskOutcome::Failed {
                    index: self.index,
                    domain: self.domain,
                    reason: err.to_string(),
                };
            }
        };

        // Step 2: extract. Deterministic; empty input yields empty text.
        self.transition(TaskState::Extracting);
        let (primary_text, secondary_text) = extract_texts(&page, options.method, ocr);

        // Step 3: classify. The gateway retries internally; exhaustion is
        // recorded as a synthetic Error classification.
        self.transition(TaskState::Classifying);
        let classification = match classifier
            .classify(&self.domain, &primary_text, &secondary_text)
            .await
        {
            Ok(classification) => classification,
            Err(err) => {
                tracing::warn!(
                    domain = %self.domain,
                    error = %err,
                    "classification exhausted its retries — recording Error result"
                );
                Classification {
                    domain: self.domain.clone(),
                    label: Label::Error,
                    summary: format!("Failed to classify due to API errors: {err}"),
                    confidence: 0.0,
                }
            }
        };

        // Step 4: assemble the final record.
        self.transition(TaskState::Assembled);
        let record = build_record(
            &self.domain,
            &classification,
            &primary_text,
            &secondary_text,
            options,
        );

        self.transition(TaskState::Done);
        tracing::info!(domain = %self.domain, label = %record.label, "task completed");

        TaskOutcome::Completed {
            index: self.index,
            record,
        }
    }
}

/// Derives (primary, secondary) texts from the fetched page according to
/// the configured extraction method. OCR runs only when a screenshot is
/// available; the HTTP fetcher never produces one, so `ocr`/`both` degrade
/// to empty secondary text.
fn extract_texts(
    page: &FetchedPage,
    method: ExtractionMethod,
    ocr: &dyn TextFromImage,
) -> (String, String) {
    let ocr_text = || {
        page.screenshot
            .as_deref()
            .map(|image| ocr.extract_text(image))
            .unwrap_or_default()
    };

    match method {
        ExtractionMethod::Html => (extract_text(&page.html), String::new()),
        ExtractionMethod::Ocr => (String::new(), ocr_text()),
        ExtractionMethod::Both => (extract_text(&page.html), ocr_text()),
    }
}
