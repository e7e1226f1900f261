//! Provider registry: static specs for the five supported LLM backends.
//!
//! Each `ProviderSpec` describes how to reach one provider: its default
//! endpoint and model, how it authenticates, how its chat and model-listing
//! URLs are derived, and which response envelope it returns.

use crate::strategies::{
    GeminiStrategy, LmStudioStrategy, OllamaStrategy, OpenAiStrategy, OpenRouterStrategy,
};
use crate::traits::ProviderStrategy;

// ─────────────────────────────────────────────
// Descriptor pieces
// ─────────────────────────────────────────────

/// How the API key reaches the provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthStyle {
    /// `Authorization: Bearer <key>` header.
    BearerHeader,
    /// `?key=<key>` query parameter.
    QueryKey,
    /// Local server, no authentication.
    None,
}

/// The envelope the translated text comes back in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResponseShape {
    /// `choices[0].message.content`
    ChatChoices,
    /// `candidates[0].content.parts[0].text`
    GeminiCandidates,
    /// `message.content`
    OllamaMessage,
}

/// How the chat/generate URL is derived from the configured endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatUrl {
    /// The endpoint is the chat URL.
    Endpoint,
    /// `<endpoint>/<model><action>`, e.g. `.../models/gemini-1.5-pro:generateContent`.
    PerModel { action: &'static str },
}

/// How the model-listing URL is derived from the configured endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelsUrl {
    /// The endpoint itself lists models.
    Endpoint,
    /// Replace a trailing path segment, e.g. `/chat/completions` → `/models`.
    ReplaceSuffix {
        from: &'static str,
        to: &'static str,
    },
}

/// Which strategy implements dispatch for a provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    Gemini,
    OpenRouter,
    Ollama,
    LmStudio,
}

impl ProviderKind {
    /// The strategy that builds requests and reads responses for this kind.
    pub fn strategy(self) -> &'static dyn ProviderStrategy {
        match self {
            ProviderKind::OpenAi => &OpenAiStrategy,
            ProviderKind::Gemini => &GeminiStrategy,
            ProviderKind::OpenRouter => &OpenRouterStrategy,
            ProviderKind::Ollama => &OllamaStrategy,
            ProviderKind::LmStudio => &LmStudioStrategy,
        }
    }
}

// ─────────────────────────────────────────────
// ProviderSpec: static metadata for one provider
// ─────────────────────────────────────────────

/// Static description of one LLM provider.
#[derive(Clone, Debug)]
pub struct ProviderSpec {
    /// Internal name (e.g. `"openrouter"`). Unique across the registry.
    pub name: &'static str,
    /// Human-readable name for messages. E.g. `"LM Studio"`.
    pub display_name: &'static str,
    pub kind: ProviderKind,
    /// Chat endpoint used when the config does not override it.
    pub default_endpoint: &'static str,
    /// Model used when neither the request nor the config names one.
    pub default_model: &'static str,
    pub auth: AuthStyle,
    pub response_shape: ResponseShape,
    pub chat_url: ChatUrl,
    pub models_url: ModelsUrl,
}

impl ProviderSpec {
    /// Whether calls fail fast with `missing_api_key` when no key is set.
    pub fn requires_api_key(&self) -> bool {
        self.auth != AuthStyle::None
    }

    /// Local/self-hosted providers accept unauthenticated requests.
    pub fn is_local(&self) -> bool {
        self.auth == AuthStyle::None
    }

    /// Configured endpoint, or the registry default.
    pub fn resolve_endpoint<'a>(&self, configured: Option<&'a str>) -> &'a str {
        configured
            .filter(|e| !e.trim().is_empty())
            .unwrap_or(self.default_endpoint)
    }

    /// Build the chat/generate URL for `model`.
    pub fn chat_url(&self, endpoint: &str, model: &str) -> String {
        match self.chat_url {
            ChatUrl::Endpoint => endpoint.to_string(),
            ChatUrl::PerModel { action } => {
                format!("{}/{}{}", endpoint.trim_end_matches('/'), model, action)
            }
        }
    }

    /// Build the model-listing URL.
    pub fn models_url(&self, endpoint: &str) -> String {
        match self.models_url {
            ModelsUrl::Endpoint => endpoint.to_string(),
            ModelsUrl::ReplaceSuffix { from, to } => {
                let trimmed = endpoint.trim_end_matches('/');
                match trimmed.strip_suffix(from) {
                    Some(base) => format!("{base}{to}"),
                    None => trimmed.replace(from, to),
                }
            }
        }
    }

    /// The dispatch strategy for this provider.
    pub fn strategy(&self) -> &'static dyn ProviderStrategy {
        self.kind.strategy()
    }
}

// ─────────────────────────────────────────────
// All providers
// ─────────────────────────────────────────────

const OPENAI_MODELS: ModelsUrl = ModelsUrl::ReplaceSuffix {
    from: "/chat/completions",
    to: "/models",
};

pub static OPENAI: ProviderSpec = ProviderSpec {
    name: "openai",
    display_name: "OpenAI",
    kind: ProviderKind::OpenAi,
    default_endpoint: "https://api.openai.com/v1/chat/completions",
    default_model: "gpt-3.5-turbo",
    auth: AuthStyle::BearerHeader,
    response_shape: ResponseShape::ChatChoices,
    chat_url: ChatUrl::Endpoint,
    models_url: OPENAI_MODELS,
};

pub static GEMINI: ProviderSpec = ProviderSpec {
    name: "gemini",
    display_name: "Gemini",
    kind: ProviderKind::Gemini,
    default_endpoint: "https://generativelanguage.googleapis.com/v1beta/models",
    default_model: "gemini-1.5-pro",
    auth: AuthStyle::QueryKey,
    response_shape: ResponseShape::GeminiCandidates,
    chat_url: ChatUrl::PerModel {
        action: ":generateContent",
    },
    models_url: ModelsUrl::Endpoint,
};

pub static OPENROUTER: ProviderSpec = ProviderSpec {
    name: "openrouter",
    display_name: "OpenRouter",
    kind: ProviderKind::OpenRouter,
    default_endpoint: "https://openrouter.ai/api/v1/chat/completions",
    default_model: "openrouter/auto",
    auth: AuthStyle::BearerHeader,
    response_shape: ResponseShape::ChatChoices,
    chat_url: ChatUrl::Endpoint,
    models_url: OPENAI_MODELS,
};

pub static OLLAMA: ProviderSpec = ProviderSpec {
    name: "ollama",
    display_name: "Ollama",
    kind: ProviderKind::Ollama,
    default_endpoint: "http://localhost:11434/api/chat",
    default_model: "llama3",
    auth: AuthStyle::None,
    response_shape: ResponseShape::OllamaMessage,
    chat_url: ChatUrl::Endpoint,
    models_url: ModelsUrl::ReplaceSuffix {
        from: "/api/chat",
        to: "/api/tags",
    },
};

pub static LMSTUDIO: ProviderSpec = ProviderSpec {
    name: "lmstudio",
    display_name: "LM Studio",
    kind: ProviderKind::LmStudio,
    default_endpoint: "http://localhost:1234/v1/chat/completions",
    default_model: "local-model",
    auth: AuthStyle::None,
    response_shape: ResponseShape::ChatChoices,
    chat_url: ChatUrl::Endpoint,
    models_url: OPENAI_MODELS,
};

/// Every supported provider, in display order.
pub static PROVIDERS: &[&ProviderSpec] = &[&OPENAI, &GEMINI, &OPENROUTER, &OLLAMA, &LMSTUDIO];

/// Find a provider spec by exact name.
pub fn find_by_name(name: &str) -> Option<&'static ProviderSpec> {
    PROVIDERS.iter().copied().find(|spec| spec.name == name)
}

/// Display name for a provider id, falling back to the capitalized id.
pub fn display_name(name: &str) -> String {
    find_by_name(name)
        .map(|s| s.display_name.to_string())
        .unwrap_or_else(|| lingogate_core::utils::capitalize(name))
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
