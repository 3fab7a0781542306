//! Wire types for the chat-completions function-calling exchange.

use serde::Deserialize;

use sitecat_core::Label;

/// A validated classification returned by the gateway.
#[derive(Debug, Clone)]
pub struct Classification {
    pub domain: String,
    pub label: Label,
    pub summary: String,
    pub confidence: f64,
}

/// Raw function-call arguments as the model emits them. Every field is
/// required; serde rejects a payload with any of them missing.
#[derive(Debug, Deserialize)]
pub(crate) struct RawClassification {
    pub domain: String,
    pub classification_label: String,
    pub summary: String,
    pub confidence_level: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatCompletionResponse {
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChoiceMessage {
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ToolCall {
    pub function: FunctionCall,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FunctionCall {
    pub name: String,
    /// JSON-encoded arguments string, parsed into [`RawClassification`].
    pub arguments: String,
}
