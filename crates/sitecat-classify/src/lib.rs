//! Classifier gateway.
//!
//! Wraps an OpenAI-compatible chat-completions endpoint with function
//! calling, strict response validation, and a bounded retry policy.
//! Transient failures (transport errors, malformed responses) are retried
//! inside the gateway and never visible outside it; retry exhaustion
//! surfaces as [`ClassifyError::RetriesExhausted`].

use thiserror::Error;

pub mod client;
mod retry;
pub mod types;

pub use client::{ClassifierClient, ClassifierConfig};
pub use types::Classification;

#[derive(Debug, Error)]
pub enum ClassifyError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response was structurally wrong: no tool call, unparsable
    /// arguments, a missing required field, or an unknown label.
    #[error("malformed classifier response for {domain}: {reason}")]
    Malformed { domain: String, reason: String },

    /// The retry budget is exhausted. Fatal for the calling task.
    #[error("classification of {domain} failed after {attempts} attempts: {reason}")]
    RetriesExhausted {
        domain: String,
        attempts: u32,
        reason: String,
    },
}
