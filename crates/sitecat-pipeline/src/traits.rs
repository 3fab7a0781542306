//! Collaborator seams for the pipeline.
//!
//! The orchestrator only ever sees these traits; production wires in
//! [`HttpFetcher`] and [`ClassifierClient`], tests wire in stubs.

use async_trait::async_trait;

use sitecat_classify::{Classification, ClassifierClient, ClassifyError};
use sitecat_core::RenderOptions;
use sitecat_fetch::{FetchError, FetchedPage, HttpFetcher};

/// Fetches raw site content for a domain.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, domain: &str, options: &RenderOptions)
        -> Result<FetchedPage, FetchError>;
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(
        &self,
        domain: &str,
        options: &RenderOptions,
    ) -> Result<FetchedPage, FetchError> {
        HttpFetcher::fetch(self, domain, options).await
    }
}

/// Classifies a site from its extracted texts. Implementations own their
/// retry policy; the only error a task ever sees is retry exhaustion.
#[async_trait]
pub trait SiteClassifier: Send + Sync {
    async fn classify(
        &self,
        domain: &str,
        primary_text: &str,
        secondary_text: &str,
    ) -> Result<Classification, ClassifyError>;
}

#[async_trait]
impl SiteClassifier for ClassifierClient {
    async fn classify(
        &self,
        domain: &str,
        primary_text: &str,
        secondary_text: &str,
    ) -> Result<Classification, ClassifyError> {
        ClassifierClient::classify(self, domain, primary_text, secondary_text).await
    }
}
