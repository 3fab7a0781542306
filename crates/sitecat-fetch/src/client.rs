//! HTTP page fetcher.

use std::time::Duration;

use reqwest::Client;

use sitecat_core::RenderOptions;

use crate::FetchError;

const FETCH_ATTEMPTS: u32 = 2;

/// Raw content handed to the extraction stage. `screenshot` stays `None`
/// for the HTTP fetcher; a rendered-browser fetcher would populate it.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub html: String,
    pub screenshot: Option<Vec<u8>>,
}

/// Fetches `https://{domain}` with a bounded number of attempts.
///
/// Use [`HttpFetcher::new`] for production or [`HttpFetcher::with_scheme`]
/// to point at a plain-HTTP mock server in tests (the "domain" is then the
/// mock's `host:port`).
pub struct HttpFetcher {
    client: Client,
    scheme: String,
}

impl HttpFetcher {
    /// Creates a fetcher speaking HTTPS.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, FetchError> {
        Self::with_scheme(timeout_secs, user_agent, "https")
    }

    /// Creates a fetcher with an explicit URL scheme.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn with_scheme(
        timeout_secs: u64,
        user_agent: &str,
        scheme: &str,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent.to_owned())
            .build()?;

        Ok(Self {
            client,
            scheme: scheme.to_owned(),
        })
    }

    /// Fetches the site's landing page, retrying once on failure.
    ///
    /// Rendering flags in `options` cannot be honored over plain HTTP; they
    /// are logged and ignored here.
    ///
    /// # Errors
    ///
    /// Returns the last [`FetchError`] once both attempts have failed.
    pub async fn fetch(
        &self,
        domain: &str,
        options: &RenderOptions,
    ) -> Result<FetchedPage, FetchError> {
        if !options.headless || options.anti_detection {
            tracing::debug!(
                domain,
                "render flags set but the HTTP fetcher does not drive a browser"
            );
        }

        let url = format!("{}://{}", self.scheme, domain.trim());
        let mut last_err: Option<FetchError> = None;

        for attempt in 1..=FETCH_ATTEMPTS {
            match self.fetch_once(&url, domain).await {
                Ok(page) => {
                    tracing::info!(domain, attempt, "fetched site");
                    return Ok(page);
                }
                Err(err) => {
                    tracing::warn!(domain, attempt, error = %err, "fetch attempt failed");
                    last_err = Some(err);
                }
            }
        }

        Err(last_err.unwrap_or(FetchError::Status {
            domain: domain.to_owned(),
            status: 0,
        }))
    }

    async fn fetch_once(&self, url: &str, domain: &str) -> Result<FetchedPage, FetchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                domain: domain.to_owned(),
                status: status.as_u16(),
            });
        }

        let html = response.text().await?;
        Ok(FetchedPage {
            html,
            screenshot: None,
        })
    }
}
