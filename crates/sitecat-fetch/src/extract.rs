//! Visible-text extraction from HTML.

use scraper::node::Node;
use scraper::Html;

/// Elements whose subtree text is navigation or machinery, not content.
const STRIPPED_ELEMENTS: &[&str] = &["script", "style", "nav", "header", "footer"];

/// Extracts the visible text of an HTML document.
///
/// Text inside `script`, `style`, `nav`, `header`, and `footer` subtrees is
/// dropped; everything else is whitespace-collapsed and joined with single
/// spaces. Empty or unparsable input yields an empty string, never an error.
#[must_use]
pub fn extract_text(html: &str) -> String {
    if html.trim().is_empty() {
        return String::new();
    }

    let document = Html::parse_document(html);
    let mut words: Vec<&str> = Vec::new();

    for node in document.tree.nodes() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let stripped = node.ancestors().any(|ancestor| {
            matches!(ancestor.value(), Node::Element(e) if STRIPPED_ELEMENTS.contains(&e.name()))
        });
        if stripped {
            continue;
        }
        words.extend(text.split_whitespace());
    }

    words.join(" ")
}
