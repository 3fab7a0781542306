//! HTTP client for the chat-completions classification endpoint.

use std::time::Duration;

use reqwest::Client;
use serde_json::json;

use sitecat_core::AppConfig;

use crate::retry::retry_with_backoff;
use crate::types::{ChatCompletionResponse, Classification, RawClassification};
use crate::ClassifyError;

const TOOL_NAME: &str = "classify_site";
const TEMPERATURE: f64 = 0.1;
const MAX_TOKENS: u32 = 500;
/// Upper bounds on the text shipped to the model; overlong input is
/// truncated, never rejected.
const PRIMARY_TEXT_MAX_CHARS: usize = 2000;
const SECONDARY_TEXT_MAX_CHARS: usize = 800;

const SYSTEM_PROMPT: &str = "Classify websites into: Marketing (business/product sites), \
    Portal (login/dashboards), Other (anything that doesn't suit our other categories), \
    or Error (any errors/failures).\n\n\
    CRITICAL: Always classify as 'Error' if you see: 404/403/500 errors, 'page not found', \
    'server error', 'can't be reached', domain parking, or any malfunction indicators.";

/// Classifier settings, resolved once at pipeline start and passed by
/// reference. Replaces any module-global client configuration.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub max_attempts: u32,
    pub backoff_base_ms: u64,
    pub timeout_secs: u64,
}

impl ClassifierConfig {
    /// Builds classifier settings from the application config. The caller
    /// resolves the API key first; a missing key is its error to report.
    #[must_use]
    pub fn from_app_config(config: &AppConfig, api_key: String) -> Self {
        Self {
            api_key,
            base_url: config.classifier_base_url.clone(),
            model: config.classifier_model.clone(),
            max_attempts: config.classifier_max_attempts,
            backoff_base_ms: config.classifier_backoff_base_ms,
            timeout_secs: config.fetch_timeout_secs,
        }
    }
}

/// Client for the classification endpoint.
///
/// Use a wiremock URI as `base_url` in tests.
pub struct ClassifierClient {
    client: Client,
    config: ClassifierConfig,
    base_url: String,
}

impl ClassifierClient {
    /// Creates a new client.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifyError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(config: ClassifierConfig) -> Result<Self, ClassifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        let base_url = config.base_url.trim_end_matches('/').to_owned();

        Ok(Self {
            client,
            config,
            base_url,
        })
    }

    /// Classifies a site from its extracted texts.
    ///
    /// Transport failures and malformed responses are retried with
    /// exponential back-off up to the configured attempt budget.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifyError::RetriesExhausted`] once the budget is spent;
    /// no other error escapes this method.
    pub async fn classify(
        &self,
        domain: &str,
        primary_text: &str,
        secondary_text: &str,
    ) -> Result<Classification, ClassifyError> {
        let result = retry_with_backoff(
            self.config.max_attempts,
            self.config.backoff_base_ms,
            || self.classify_once(domain, primary_text, secondary_text),
        )
        .await;

        match result {
            Ok(classification) => {
                tracing::info!(
                    domain,
                    label = %classification.label,
                    confidence = classification.confidence,
                    "classified site"
                );
                Ok(classification)
            }
            Err(err) => Err(ClassifyError::RetriesExhausted {
                domain: domain.to_owned(),
                attempts: self.config.max_attempts.max(1),
                reason: err.to_string(),
            }),
        }
    }

    async fn classify_once(
        &self,
        domain: &str,
        primary_text: &str,
        secondary_text: &str,
    ) -> Result<Classification, ClassifyError> {
        let body = self.request_body(domain, primary_text, secondary_text);
        let url = format!("{}/v1/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let parsed: ChatCompletionResponse =
            response
                .json()
                .await
                .map_err(|e| ClassifyError::Malformed {
                    domain: domain.to_owned(),
                    reason: format!("undecodable completion envelope: {e}"),
                })?;

        Self::validate(domain, parsed)
    }

    fn request_body(
        &self,
        domain: &str,
        primary_text: &str,
        secondary_text: &str,
    ) -> serde_json::Value {
        let primary = truncate_chars(primary_text, PRIMARY_TEXT_MAX_CHARS);
        let secondary = truncate_chars(secondary_text, SECONDARY_TEXT_MAX_CHARS);

        let user_content = format!(
            "Domain: {domain}\nHTML: {}\nOCR: {}\n\nClassify this website and provide a brief summary.",
            if primary.is_empty() { "None" } else { primary },
            if secondary.is_empty() { "None" } else { secondary },
        );

        json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": user_content },
            ],
            "tools": [classify_site_tool()],
            "tool_choice": { "type": "function", "function": { "name": TOOL_NAME } },
            "temperature": TEMPERATURE,
            "max_tokens": MAX_TOKENS,
        })
    }

    /// Requires exactly one `classify_site` tool call whose arguments carry
    /// all four fields with a known label. Anything else is malformed.
    fn validate(
        domain: &str,
        response: ChatCompletionResponse,
    ) -> Result<Classification, ClassifyError> {
        let malformed = |reason: String| ClassifyError::Malformed {
            domain: domain.to_owned(),
            reason,
        };

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| malformed("no choices in response".to_owned()))?;

        let tool_call = choice
            .message
            .tool_calls
            .into_iter()
            .next()
            .ok_or_else(|| malformed("no tool calls in response".to_owned()))?;

        if tool_call.function.name != TOOL_NAME {
            return Err(malformed(format!(
                "unexpected function called: {}",
                tool_call.function.name
            )));
        }

        let raw: RawClassification = serde_json::from_str(&tool_call.function.arguments)
            .map_err(|e| malformed(format!("undecodable tool arguments: {e}")))?;

        let label = raw
            .classification_label
            .parse()
            .map_err(|e: String| malformed(e))?;

        Ok(Classification {
            domain: raw.domain,
            label,
            summary: raw.summary,
            confidence: raw.confidence_level,
        })
    }
}

/// Cuts `s` to at most `max_chars` characters, on a char boundary.
fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((index, _)) => &s[..index],
        None => s,
    }
}

fn classify_site_tool() -> serde_json::Value {
    json!({
        "type": "function",
        "function": {
            "name": TOOL_NAME,
            "description": "Classify a website based on its content. Always classify error pages as 'Error'",
            "parameters": {
                "type": "object",
                "properties": {
                    "domain": {
                        "type": "string",
                        "description": "The domain name of the website"
                    },
                    "classification_label": {
                        "type": "string",
                        "enum": ["Marketing", "Portal", "Other", "Error"],
                        "description": "The primary classification category"
                    },
                    "summary": {
                        "type": "string",
                        "description": "A very brief summary of the website's purpose and content"
                    },
                    "confidence_level": {
                        "type": "number",
                        "description": "A self-reported confidence level between 0.0 and 1.0"
                    }
                },
                "required": ["domain", "classification_label", "summary", "confidence_level"]
            }
        }
    })
}
