//! Shared domain types for the classification pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Classification outcome assigned to a domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    Marketing,
    Portal,
    Other,
    Error,
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Marketing => write!(f, "Marketing"),
            Label::Portal => write!(f, "Portal"),
            Label::Other => write!(f, "Other"),
            Label::Error => write!(f, "Error"),
        }
    }
}

impl FromStr for Label {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Marketing" => Ok(Label::Marketing),
            "Portal" => Ok(Label::Portal),
            "Other" => Ok(Label::Other),
            "Error" => Ok(Label::Error),
            other => Err(format!("unknown classification label: {other}")),
        }
    }
}

/// Which text sources feed the classifier for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMethod {
    Html,
    Ocr,
    Both,
}

impl fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionMethod::Html => write!(f, "html"),
            ExtractionMethod::Ocr => write!(f, "ocr"),
            ExtractionMethod::Both => write!(f, "both"),
        }
    }
}

impl FromStr for ExtractionMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "html" => Ok(ExtractionMethod::Html),
            "ocr" => Ok(ExtractionMethod::Ocr),
            "both" => Ok(ExtractionMethod::Both),
            other => Err(format!("unknown extraction method: {other}")),
        }
    }
}

/// Rendering flags forwarded to the fetch collaborator.
///
/// The bundled HTTP fetcher cannot honor these; they still travel through
/// provenance so a rendered-browser fetcher can be swapped in later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOptions {
    pub headless: bool,
    pub anti_detection: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            headless: true,
            anti_detection: false,
        }
    }
}

/// Per-run pipeline options, recorded verbatim in batch metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOptions {
    pub method: ExtractionMethod,
    pub workers: usize,
    pub overwrite: bool,
    pub render: RenderOptions,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            method: ExtractionMethod::Html,
            workers: 4,
            overwrite: false,
            render: RenderOptions::default(),
        }
    }
}

impl RunOptions {
    /// JSON value stored in the batch `config` column.
    #[must_use]
    pub fn to_config_json(&self) -> serde_json::Value {
        serde_json::json!({
            "method": self.method.to_string(),
            "workers": self.workers,
            "overwrite": self.overwrite,
            "headless": self.render.headless,
            "anti_detection": self.render.anti_detection,
        })
    }

    /// Human-readable provenance tag for stored records.
    #[must_use]
    pub fn processing_method(&self) -> String {
        let mode = if self.render.headless {
            "headless"
        } else {
            "headful"
        };
        if self.render.anti_detection {
            format!("http fetcher ({mode} + anti-detection)")
        } else {
            format!("http fetcher ({mode})")
        }
    }
}

/// A fully assembled classification result, ready to persist.
///
/// `domain` keeps the trimmed original casing; the case-insensitive key
/// used for dedup comes from [`normalize_domain`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationRecord {
    pub domain: String,
    pub label: Label,
    pub summary: String,
    pub confidence: f64,
    pub snippet: String,
    pub html_content: String,
    pub ocr_content: String,
    pub extraction_method: String,
    pub processing_method: String,
}

/// Canonical dedup key for a domain: trimmed, lowercased.
#[must_use]
pub fn normalize_domain(domain: &str) -> String {
    domain.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_round_trips_through_display() {
        for label in [Label::Marketing, Label::Portal, Label::Other, Label::Error] {
            let parsed: Label = label.to_string().parse().unwrap();
            assert_eq!(parsed, label);
        }
    }

    #[test]
    fn unknown_label_is_rejected() {
        assert!("Shopping".parse::<Label>().is_err());
    }

    #[test]
    fn extraction_method_parses_lowercase_names() {
        assert_eq!(
            "html".parse::<ExtractionMethod>().unwrap(),
            ExtractionMethod::Html
        );
        assert_eq!(
            "ocr".parse::<ExtractionMethod>().unwrap(),
            ExtractionMethod::Ocr
        );
        assert_eq!(
            "both".parse::<ExtractionMethod>().unwrap(),
            ExtractionMethod::Both
        );
        assert!("screenshot".parse::<ExtractionMethod>().is_err());
    }

    #[test]
    fn normalize_domain_trims_and_lowercases() {
        assert_eq!(normalize_domain("  Example.COM "), "example.com");
        assert_eq!(normalize_domain("example.com"), "example.com");
    }

    #[test]
    fn run_options_config_json_has_all_flags() {
        let options = RunOptions::default();
        let json = options.to_config_json();
        assert_eq!(json["method"], "html");
        assert_eq!(json["workers"], 4);
        assert_eq!(json["overwrite"], false);
        assert_eq!(json["headless"], true);
        assert_eq!(json["anti_detection"], false);
    }

    #[test]
    fn processing_method_reflects_render_flags() {
        let mut options = RunOptions::default();
        assert_eq!(options.processing_method(), "http fetcher (headless)");

        options.render.headless = false;
        options.render.anti_detection = true;
        assert_eq!(
            options.processing_method(),
            "http fetcher (headful + anti-detection)"
        );
    }
}
