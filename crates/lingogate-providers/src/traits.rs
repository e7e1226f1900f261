//! Provider strategy trait: one implementation per wire format.
//!
//! Every backend (OpenAI, Gemini, OpenRouter, Ollama, LM Studio) implements
//! this trait. Adding a provider means adding a strategy and a registry
//! entry; existing strategies are untouched.

use serde_json::Value;

use crate::error::ProviderError;
use crate::normalize;
use crate::registry::{AuthStyle, ProviderSpec};
use crate::request::{ChatCall, ProviderRequest, ProviderResponse};

/// Builds provider-specific requests and reads provider-specific responses.
pub trait ProviderStrategy: Send + Sync {
    /// The registry entry this strategy serves.
    fn spec(&self) -> &'static ProviderSpec;

    /// Build the chat/generate request for one translation.
    fn build_request(&self, call: &ChatCall<'_>) -> ProviderRequest;

    /// Pull the translated text out of the provider's envelope.
    fn extract_response(&self, response: &ProviderResponse) -> Result<String, ProviderError> {
        let spec = self.spec();
        normalize::extract_text(spec.name, spec.response_shape, response)
    }

    /// Build the model-listing request.
    fn models_request(&self, endpoint: &str, api_key: Option<&str>) -> ProviderRequest {
        let spec = self.spec();
        apply_auth(spec, ProviderRequest::get(spec.models_url(endpoint)), api_key)
    }

    /// Map the provider's model list into the OpenAI-style `{data: [...]}` shape.
    ///
    /// Most providers already return something the front end understands,
    /// so the default passes the body through.
    fn normalize_models(&self, body: Value) -> Value {
        body
    }
}

/// Attach the API key the way the provider expects it.
///
/// Local providers never get credentials, even if a key string is supplied.
pub fn apply_auth(
    spec: &ProviderSpec,
    request: ProviderRequest,
    api_key: Option<&str>,
) -> ProviderRequest {
    match (spec.auth, api_key.filter(|k| !k.is_empty())) {
        (AuthStyle::BearerHeader, Some(key)) => {
            request.header("Authorization", format!("Bearer {key}"))
        }
        (AuthStyle::QueryKey, Some(key)) => request.query("key", key),
        _ => request,
    }
}
