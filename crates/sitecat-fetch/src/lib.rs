//! Site fetching and text extraction collaborators.
//!
//! The fetch side of the pipeline: an HTTP page fetcher, a visible-text
//! extractor for HTML, and the OCR seam for rendered screenshots. Browser
//! rendering and anti-detection tactics are out of scope; the fetcher here
//! speaks plain HTTP and never produces a screenshot payload.

use thiserror::Error;

pub mod client;
pub mod extract;
pub mod ocr;

pub use client::{FetchedPage, HttpFetcher};
pub use extract::extract_text;
pub use ocr::{NoopOcr, TextFromImage};

/// Errors from the fetch collaborator. Any of these is terminal for the
/// domain task that triggered the fetch.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The site answered with a non-success status on every attempt.
    #[error("{domain} returned status {status}")]
    Status { domain: String, status: u16 },
}
