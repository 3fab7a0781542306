//! Result assembly: text cleanup, snippet truncation, record construction.

use sitecat_classify::Classification;
use sitecat_core::{ClassificationRecord, RunOptions};

pub const SNIPPET_MAX_LENGTH: usize = 200;
const SNIPPET_SENTINEL: &str = "No content available";
/// A trailing space inside the prefix only wins if it sits in the last 20%.
const WORD_BOUNDARY_RATIO: f64 = 0.8;

/// Joins primary and secondary text with a single space and collapses all
/// runs of whitespace.
#[must_use]
pub fn clean_combined(primary_text: &str, secondary_text: &str) -> String {
    let combined = format!("{primary_text} {secondary_text}");
    combined.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Builds the display snippet from the two extracted texts.
///
/// Empty combined text yields the sentinel. Text within `max_length`
/// characters is returned verbatim. Longer text is cut to the first
/// `max_length` characters, backed up to the last space when that space
/// falls within the final 20% of the prefix, and suffixed with `...`.
#[must_use]
pub fn extract_snippet(primary_text: &str, secondary_text: &str, max_length: usize) -> String {
    let cleaned = clean_combined(primary_text, secondary_text);
    if cleaned.is_empty() {
        return SNIPPET_SENTINEL.to_string();
    }

    let chars: Vec<char> = cleaned.chars().collect();
    if chars.len() <= max_length {
        return cleaned;
    }

    let prefix = &chars[..max_length];
    let last_space = prefix.iter().rposition(|c| *c == ' ');

    #[allow(clippy::cast_precision_loss)]
    let boundary = max_length as f64 * WORD_BOUNDARY_RATIO;

    let cut = match last_space {
        #[allow(clippy::cast_precision_loss)]
        Some(position) if position as f64 >= boundary => position,
        _ => max_length,
    };

    let mut snippet: String = chars[..cut].iter().collect();
    snippet.push_str("...");
    snippet
}

/// Assembles the persistable record from a classification and the texts it
/// was derived from. Confidence is clamped to `[0, 1]`, with non-finite
/// values treated as absent.
#[must_use]
pub fn build_record(
    domain: &str,
    classification: &Classification,
    primary_text: &str,
    secondary_text: &str,
    options: &RunOptions,
) -> ClassificationRecord {
    let confidence = if classification.confidence.is_finite() {
        classification.confidence.clamp(0.0, 1.0)
    } else {
        0.0
    };

    ClassificationRecord {
        domain: domain.trim().to_string(),
        label: classification.label,
        summary: classification.summary.clone(),
        confidence,
        snippet: extract_snippet(primary_text, secondary_text, SNIPPET_MAX_LENGTH),
        html_content: primary_text.to_string(),
        ocr_content: secondary_text.to_string(),
        extraction_method: options.method.to_string(),
        processing_method: options.processing_method(),
    }
}
