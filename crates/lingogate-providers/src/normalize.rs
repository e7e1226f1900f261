//! Response normalizer: pulls translated text out of each provider's
//! envelope and post-processes `<think>` blocks for display.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::error::ProviderError;
use crate::registry::ResponseShape;
use crate::request::ProviderResponse;

/// Non-greedy so each `<think>` block is wrapped on its own.
static THINK_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)(<think>)(.*?)(</think>)").unwrap());

/// JSON pointer to the text field for a response shape.
fn text_pointer(shape: ResponseShape) -> &'static str {
    match shape {
        ResponseShape::ChatChoices => "/choices/0/message/content",
        ResponseShape::GeminiCandidates => "/candidates/0/content/parts/0/text",
        ResponseShape::OllamaMessage => "/message/content",
    }
}

/// The text at the shape's expected path, if it is present and a string.
pub fn extract(shape: ResponseShape, body: &Value) -> Option<&str> {
    body.pointer(text_pointer(shape)).and_then(Value::as_str)
}

/// Extract the text or fail with `MalformedResponse` naming the missing path.
pub fn extract_text(
    provider_id: &str,
    shape: ResponseShape,
    response: &ProviderResponse,
) -> Result<String, ProviderError> {
    extract(shape, &response.body)
        .map(str::to_string)
        .ok_or_else(|| ProviderError::MalformedResponse {
            provider: provider_id.to_string(),
            detail: format!("no string at {}", text_pointer(shape)),
        })
}

/// Wrap the inside of every `<think>…</think>` block in a
/// `<div class="think-content">` so the front end can style reasoning
/// separately. Leading/trailing whitespace of the whole output is trimmed;
/// text between blocks is left as is.
pub fn wrap_think_content(text: &str) -> String {
    THINK_BLOCK
        .replace_all(text.trim(), r#"${1}<div class="think-content">${2}</div>${3}"#)
        .into_owned()
}
