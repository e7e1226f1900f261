//! Per-provider request builders.
//!
//! Three of the five providers speak the OpenAI `/chat/completions` dialect
//! and share [`chat_completions_request`]; OpenRouter and Ollama add a few
//! fields on top. Gemini has its own `contents`/`parts` body and takes the
//! key as a query parameter.

use serde_json::{json, Value};
use tracing::debug;

use crate::error::ProviderError;
use crate::registry::{self, ProviderSpec, GEMINI, LMSTUDIO, OLLAMA, OPENAI, OPENROUTER};
use crate::request::{ChatCall, ProviderRequest};
use crate::traits::{apply_auth, ProviderStrategy};

/// Low temperature keeps translations literal.
pub const TRANSLATION_TEMPERATURE: f64 = 0.2;

/// Build the request for `provider_id`, or fail if the registry has no such provider.
pub fn build_request(
    provider_id: &str,
    call: &ChatCall<'_>,
) -> Result<ProviderRequest, ProviderError> {
    let spec = registry::find_by_name(provider_id)
        .ok_or_else(|| ProviderError::UnsupportedProvider(provider_id.to_string()))?;
    let request = spec.strategy().build_request(call);
    debug!(
        provider = spec.name,
        model = call.model,
        url = %request.url,
        thinking = call.thinking_enabled,
        "built provider request"
    );
    Ok(request)
}

/// `{model, messages: [system, user], temperature}`
fn chat_completions_body(call: &ChatCall<'_>) -> Value {
    json!({
        "model": call.model,
        "messages": [
            { "role": "system", "content": call.system_prompt },
            { "role": "user", "content": call.text },
        ],
        "temperature": TRANSLATION_TEMPERATURE,
    })
}

fn chat_completions_request(
    spec: &'static ProviderSpec,
    call: &ChatCall<'_>,
    body: Value,
) -> ProviderRequest {
    let endpoint = spec.resolve_endpoint(call.endpoint);
    let request = ProviderRequest::post(spec.chat_url(endpoint, call.model)).json(body);
    apply_auth(spec, request, call.api_key)
}

// ─────────────────────────────────────────────
// OpenAI
// ─────────────────────────────────────────────

pub struct OpenAiStrategy;

impl ProviderStrategy for OpenAiStrategy {
    fn spec(&self) -> &'static ProviderSpec {
        &OPENAI
    }

    fn build_request(&self, call: &ChatCall<'_>) -> ProviderRequest {
        chat_completions_request(self.spec(), call, chat_completions_body(call))
    }
}

// ─────────────────────────────────────────────
// LM Studio (local, OpenAI-compatible)
// ─────────────────────────────────────────────

pub struct LmStudioStrategy;

impl ProviderStrategy for LmStudioStrategy {
    fn spec(&self) -> &'static ProviderSpec {
        &LMSTUDIO
    }

    fn build_request(&self, call: &ChatCall<'_>) -> ProviderRequest {
        chat_completions_request(self.spec(), call, chat_completions_body(call))
    }
}

// ─────────────────────────────────────────────
// OpenRouter
// ─────────────────────────────────────────────

pub struct OpenRouterStrategy;

impl ProviderStrategy for OpenRouterStrategy {
    fn spec(&self) -> &'static ProviderSpec {
        &OPENROUTER
    }

    fn build_request(&self, call: &ChatCall<'_>) -> ProviderRequest {
        let mut body = chat_completions_body(call);
        if call.thinking_enabled {
            body["reasoning"] = json!({ "enabled": true });
        } else {
            body["reasoning"] = json!({ "exclude": true });
            body["include_reasoning"] = json!(false);
        }
        chat_completions_request(self.spec(), call, body)
    }
}

// ─────────────────────────────────────────────
// Ollama (local)
// ─────────────────────────────────────────────

pub struct OllamaStrategy;

impl ProviderStrategy for OllamaStrategy {
    fn spec(&self) -> &'static ProviderSpec {
        &OLLAMA
    }

    fn build_request(&self, call: &ChatCall<'_>) -> ProviderRequest {
        let mut body = chat_completions_body(call);
        body["stream"] = json!(false);
        body["think"] = json!(call.thinking_enabled);
        chat_completions_request(self.spec(), call, body)
    }

    /// `/api/tags` returns `{models: [{name}]}`; the front end expects `{data: [{id}]}`.
    fn normalize_models(&self, body: Value) -> Value {
        let data: Vec<Value> = body
            .get("models")
            .and_then(Value::as_array)
            .map(|models| {
                models
                    .iter()
                    .map(|m| json!({ "id": m.get("name").cloned().unwrap_or(Value::Null), "object": "model" }))
                    .collect()
            })
            .unwrap_or_default();
        json!({ "data": data })
    }
}

// ─────────────────────────────────────────────
// Gemini
// ─────────────────────────────────────────────

pub struct GeminiStrategy;

impl ProviderStrategy for GeminiStrategy {
    fn spec(&self) -> &'static ProviderSpec {
        &GEMINI
    }

    fn build_request(&self, call: &ChatCall<'_>) -> ProviderRequest {
        let spec = self.spec();
        let endpoint = spec.resolve_endpoint(call.endpoint);
        // Gemini has no system role here; both texts go in one user turn.
        let body = json!({
            "contents": [{
                "role": "user",
                "parts": [
                    { "text": call.system_prompt },
                    { "text": call.text },
                ],
            }],
            "generationConfig": { "temperature": TRANSLATION_TEMPERATURE },
        });
        let request = ProviderRequest::post(spec.chat_url(endpoint, call.model)).json(body);
        apply_auth(spec, request, call.api_key)
    }

    fn models_request(&self, endpoint: &str, api_key: Option<&str>) -> ProviderRequest {
        let spec = self.spec();
        let request = ProviderRequest::get(spec.models_url(endpoint)).query("pageSize", "1000");
        apply_auth(spec, request, api_key)
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
