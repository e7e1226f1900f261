//! Configuration schema: the snapshot every gateway call reads.
//!
//! Hierarchy: `Config` → `ProvidersConfig`, `TranslationModes`,
//! `ServerConfig`, `NetworkConfig`, plus the list of saved models.
//!
//! JSON on disk uses **camelCase** keys; Rust uses snake_case.
//! We use `#[serde(rename_all = "camelCase")]` to handle the conversion.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Placeholder replaced with the requested target language.
pub const TARGET_LANG_TOKEN: &str = "{{TARGET_LANG}}";
/// Placeholder replaced with the detected source language.
pub const SOURCE_LANG_TOKEN: &str = "{{SOURCE_LANG}}";

// ─────────────────────────────────────────────
// Root Config
// ─────────────────────────────────────────────

/// Root configuration: loaded from `~/.lingogate/config.json` + env vars.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Provider used when a request does not name one.
    pub default_provider: String,
    /// Model used when a request does not name one. Empty = provider default.
    pub default_model: String,
    pub providers: ProvidersConfig,
    pub saved_models: Vec<SavedModel>,
    pub translation_modes: TranslationModes,
    pub server: ServerConfig,
    pub network: NetworkConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_provider: "openai".to_string(),
            default_model: String::new(),
            providers: ProvidersConfig::default(),
            saved_models: Vec::new(),
            translation_modes: TranslationModes::default(),
            server: ServerConfig::default(),
            network: NetworkConfig::default(),
        }
    }
}

// ─────────────────────────────────────────────
// Providers
// ─────────────────────────────────────────────

/// Configuration for a single LLM provider (API key, endpoint override).
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderConfig {
    /// API key for authentication. Empty = not set.
    pub api_key: String,
    /// Custom chat endpoint (overrides the registry default).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl ProviderConfig {
    /// Whether this provider has a configured API key.
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// The API key, or `None` when it is empty.
    pub fn api_key(&self) -> Option<&str> {
        if self.api_key.is_empty() {
            None
        } else {
            Some(&self.api_key)
        }
    }
}

/// All provider configurations.
///
/// One `ProviderConfig` per supported LLM backend.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ProvidersConfig {
    pub openai: ProviderConfig,
    pub gemini: ProviderConfig,
    pub openrouter: ProviderConfig,
    pub ollama: ProviderConfig,
    pub lmstudio: ProviderConfig,
}

impl ProvidersConfig {
    /// Get a provider config by name (e.g. `"openai"`).
    pub fn get_by_name(&self, name: &str) -> Option<&ProviderConfig> {
        match name {
            "openai" => Some(&self.openai),
            "gemini" => Some(&self.gemini),
            "openrouter" => Some(&self.openrouter),
            "ollama" => Some(&self.ollama),
            "lmstudio" => Some(&self.lmstudio),
            _ => None,
        }
    }

    /// Mutable access by name, used by config-update operations.
    pub fn get_mut_by_name(&mut self, name: &str) -> Option<&mut ProviderConfig> {
        match name {
            "openai" => Some(&mut self.openai),
            "gemini" => Some(&mut self.gemini),
            "openrouter" => Some(&mut self.openrouter),
            "ollama" => Some(&mut self.ollama),
            "lmstudio" => Some(&mut self.lmstudio),
            _ => None,
        }
    }

    /// Convert to a HashMap<String, ProviderConfig> keyed by provider name.
    pub fn to_map(&self) -> HashMap<String, ProviderConfig> {
        let entries: &[(&str, &ProviderConfig)] = &[
            ("openai", &self.openai),
            ("gemini", &self.gemini),
            ("openrouter", &self.openrouter),
            ("ollama", &self.ollama),
            ("lmstudio", &self.lmstudio),
        ];
        entries
            .iter()
            .map(|(name, config)| (name.to_string(), (*config).clone()))
            .collect()
    }
}

/// A model the user picked in the front end and wants to keep around.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SavedModel {
    pub provider: String,
    pub model_id: String,
    pub display_name: String,
    pub added_at: chrono::DateTime<chrono::Utc>,
    /// SHA-256 hex digest of the key in use when the model was saved.
    #[serde(default)]
    pub api_key_hash: String,
}

// ─────────────────────────────────────────────
// Translation modes
// ─────────────────────────────────────────────

/// Prompt templates and the thinking toggle.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct TranslationModes {
    /// Name of the active mode.
    pub default_mode: String,
    /// Built-in templates keyed by mode name.
    pub presets: BTreeMap<String, String>,
    /// User-edited templates; take precedence over presets.
    pub custom_overrides: BTreeMap<String, String>,
    /// Ask providers that support it for visible reasoning.
    pub thinking_enabled: bool,
}

impl TranslationModes {
    /// Template for `mode`: custom override first, then preset, else empty.
    pub fn template_for(&self, mode: &str) -> &str {
        self.custom_overrides
            .get(mode)
            .filter(|t| !t.is_empty())
            .or_else(|| self.presets.get(mode))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Template for the active mode.
    pub fn active_template(&self) -> &str {
        self.template_for(&self.default_mode)
    }
}

impl Default for TranslationModes {
    fn default() -> Self {
        let presets = [
            (
                "only_translate",
                "You are a professional translator. Translate strictly into {{TARGET_LANG}}. \
                 Keep meaning, tone, numbers, names, code. No extra commentary.",
            ),
            (
                "prompt_translator",
                "Act as a prompt translator. Convert the user text into a clear, concise \
                 {{TARGET_LANG}} prompt for an AI model. Keep intent, constraints, and structure.",
            ),
            (
                "master_translate",
                "You are a master literary and technical translator. Translate into natural, \
                 idiomatic {{TARGET_LANG}}; preserve style and nuance; fix minor grammar, \
                 keep formatting.",
            ),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            default_mode: "only_translate".to_string(),
            presets,
            custom_overrides: BTreeMap::new(),
            thinking_enabled: false,
        }
    }
}

// ─────────────────────────────────────────────
// Server / network
// ─────────────────────────────────────────────

/// HTTP listener configuration.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    /// Listen address.
    pub host: String,
    /// Listen port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

/// Timeouts and retry policy for provider calls.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct NetworkConfig {
    /// Per-attempt timeout for translation requests.
    pub translate_timeout_secs: u64,
    /// Timeout for model-listing requests (not retried).
    pub models_timeout_secs: u64,
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Wait before the second attempt; doubles afterwards.
    pub initial_backoff_secs: u64,
    /// Upper bound on any single wait.
    pub max_backoff_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            translate_timeout_secs: 60,
            models_timeout_secs: 15,
            max_attempts: 3,
            initial_backoff_secs: 2,
            max_backoff_secs: 10,
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
