//! Gateway orchestrator: composes config, detection, prompt rendering,
//! request building, transport, and normalization into `translate` and
//! `list_models`, plus the config update operations behind the HTTP API.
//!
//! Each call reads one config snapshot at the start and never touches
//! shared mutable state. Updates go through the [`ConfigStore`]; their
//! load → modify → save cycles are serialized by an async mutex.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use lingogate_core::config::schema::TranslationModes;
use lingogate_core::config::{Config, ConfigError, ConfigStore, ProviderConfig, SavedModel};
use lingogate_providers::prompt::{self, UNKNOWN_LANGUAGE};
use lingogate_providers::registry::{self, ProviderSpec};
use lingogate_providers::{
    classify, normalize, ChatCall, ErrorCategory, HttpTransport, ProviderError, ReqwestTransport,
    RetryPolicy, RetryingTransport, Sleeper, TokioSleeper,
};

use crate::detect::{LanguageDetector, WhatlangDetector};

// ─────────────────────────────────────────────
// Request / outcome types
// ─────────────────────────────────────────────

/// One translation request as received from a caller.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct TranslateRequest {
    pub text: String,
    pub target_lang: String,
    /// Provider id; falls back to the configured default.
    #[serde(default, alias = "engine")]
    pub provider: Option<String>,
    /// Model id; falls back to the configured default, then the provider default.
    #[serde(default)]
    pub model: Option<String>,
}

/// Result of a translation: text, or a categorized failure. Never both.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TranslationOutcome {
    Translated {
        output: String,
    },
    Failed {
        category: ErrorCategory,
        message: String,
    },
}

impl TranslationOutcome {
    /// What the caller shows the user: the translation or the error message.
    pub fn output(&self) -> &str {
        match self {
            TranslationOutcome::Translated { output } => output,
            TranslationOutcome::Failed { message, .. } => message,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TranslationOutcome::Translated { .. })
    }

    fn failed(provider_id: &str, error: &ProviderError) -> Self {
        let classified = classify(provider_id, error);
        TranslationOutcome::Failed {
            category: classified.category,
            message: classified.message,
        }
    }
}

/// Partial update of the translation modes.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ModeUpdate {
    #[serde(default)]
    pub default_mode: Option<String>,
    #[serde(default)]
    pub thinking_enabled: Option<bool>,
    #[serde(default)]
    pub prompt_override: Option<PromptOverride>,
}

/// Custom template for one mode. An empty or missing prompt removes the override.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PromptOverride {
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
}

// ─────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────

/// Faults outside the classified provider taxonomy.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("configuration unavailable: {0}")]
    Config(#[from] ConfigError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Internal faults fall outside the provider taxonomy.
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::UnknownError
    }
}

/// Failures of the model-listing operation.
#[derive(Debug, Error)]
pub enum ModelsError {
    #[error("provider is required")]
    MissingProvider,

    #[error("unsupported provider: {0}")]
    InvalidProvider(String),

    #[error("API key not set for {0}")]
    MissingApiKey(String),

    /// The provider could not be reached or answered with an error.
    #[error("{message}")]
    Provider {
        category: ErrorCategory,
        message: String,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ModelsError {
    /// Short machine-readable code for the HTTP body.
    pub fn code(&self) -> &'static str {
        match self {
            ModelsError::MissingProvider => "missing_provider",
            ModelsError::InvalidProvider(_) => "invalid_provider",
            ModelsError::MissingApiKey(_) => "missing_api_key",
            ModelsError::Provider { .. } => "provider_error",
            ModelsError::Config(_) => "config_error",
        }
    }

    /// Whether the caller sent a bad request (as opposed to a provider or
    /// storage failure).
    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            ModelsError::MissingProvider
                | ModelsError::InvalidProvider(_)
                | ModelsError::MissingApiKey(_)
        )
    }
}

/// Failures of the config update operations.
#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("Provider and model_id are required.")]
    MissingFields,

    #[error("Provider '{0}' not configured.")]
    UnknownProvider(String),

    #[error("API key is required for {0}.")]
    MissingApiKey(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl UpdateError {
    pub fn is_request_error(&self) -> bool {
        !matches!(self, UpdateError::Config(_))
    }
}

// ─────────────────────────────────────────────
// Gateway
// ─────────────────────────────────────────────

/// The translation gateway. Cheap to share behind an `Arc`.
pub struct Gateway {
    config: Arc<dyn ConfigStore>,
    detector: Arc<dyn LanguageDetector>,
    transport: Arc<dyn HttpTransport>,
    sleeper: Arc<dyn Sleeper>,
    /// Serializes load → modify → save cycles.
    update_lock: Mutex<()>,
}

impl Gateway {
    /// Gateway with the real detector, HTTP client, and sleep.
    pub fn new(config: Arc<dyn ConfigStore>) -> Self {
        Self {
            config,
            detector: Arc::new(WhatlangDetector),
            transport: Arc::new(ReqwestTransport::new()),
            sleeper: Arc::new(TokioSleeper),
            update_lock: Mutex::new(()),
        }
    }

    pub fn with_detector(mut self, detector: Arc<dyn LanguageDetector>) -> Self {
        self.detector = detector;
        self
    }

    pub fn with_transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Current configuration snapshot.
    pub fn config(&self) -> Result<Config, GatewayError> {
        Ok(self.config.load()?)
    }

    /// Translate `request.text` into `request.target_lang`.
    ///
    /// Provider and configuration problems come back as
    /// [`TranslationOutcome::Failed`]; `Err` is reserved for faults the
    /// caller cannot act on (config storage unavailable).
    pub async fn translate(
        &self,
        request: &TranslateRequest,
    ) -> Result<TranslationOutcome, GatewayError> {
        // ResolveConfig
        let config = self.config.load()?;
        let provider_id = non_empty(request.provider.as_deref())
            .unwrap_or(config.default_provider.as_str());

        let Some(spec) = registry::find_by_name(provider_id) else {
            info!(provider = provider_id, "translate: unsupported provider");
            return Ok(TranslationOutcome::failed(
                provider_id,
                &ProviderError::UnsupportedProvider(provider_id.to_string()),
            ));
        };

        let provider_config = config.providers.get_by_name(spec.name);
        let api_key = provider_config.and_then(ProviderConfig::api_key);
        if spec.requires_api_key() && api_key.is_none() {
            info!(provider = spec.name, "translate: API key not set");
            return Ok(TranslationOutcome::failed(
                spec.name,
                &ProviderError::MissingApiKey(spec.name.to_string()),
            ));
        }

        let model = resolve_model(&config, spec, request.model.as_deref());

        // DetectSourceLang
        let source_lang = match self.detector.detect(&request.text) {
            Ok(lang) => lang,
            Err(e) => {
                debug!(error = %e, "language detection failed");
                UNKNOWN_LANGUAGE.to_string()
            }
        };

        // RenderPrompt
        let modes = &config.translation_modes;
        let system_prompt =
            prompt::render(modes.active_template(), &request.target_lang, &source_lang);

        // Dispatch
        let call = ChatCall {
            endpoint: provider_config.and_then(|c| c.endpoint.as_deref()),
            model,
            text: &request.text,
            system_prompt: &system_prompt,
            api_key,
            thinking_enabled: modes.thinking_enabled,
        };
        let strategy = spec.strategy();
        let provider_request = strategy.build_request(&call);
        debug!(
            provider = spec.name,
            model,
            mode = %modes.default_mode,
            source_lang = %source_lang,
            url = %provider_request.url,
            "dispatching translation"
        );

        let transport = RetryingTransport::new(
            self.transport.clone(),
            self.sleeper.clone(),
            RetryPolicy::from(&config.network),
        );
        let timeout = Duration::from_secs(config.network.translate_timeout_secs);

        // Normalize / Classify
        let result = transport
            .send(&provider_request, timeout)
            .await
            .and_then(|response| strategy.extract_response(&response));

        match result {
            Ok(text) => Ok(TranslationOutcome::Translated {
                output: normalize::wrap_think_content(&text),
            }),
            Err(e) => {
                let outcome = TranslationOutcome::failed(spec.name, &e);
                error!(provider = spec.name, model, error = %e, "translation failed");
                Ok(outcome)
            }
        }
    }

    /// List the models `provider` offers, normalized to `{data: [...]}`.
    ///
    /// `temp_key` takes precedence over the configured key. Not retried.
    pub async fn list_models(
        &self,
        provider: Option<&str>,
        temp_key: Option<&str>,
    ) -> Result<Value, ModelsError> {
        let provider_id = non_empty(provider).ok_or(ModelsError::MissingProvider)?;
        let spec = registry::find_by_name(provider_id)
            .ok_or_else(|| ModelsError::InvalidProvider(provider_id.to_string()))?;

        let config = self.config.load()?;
        let provider_config = config.providers.get_by_name(spec.name);
        let api_key =
            non_empty(temp_key).or_else(|| provider_config.and_then(ProviderConfig::api_key));
        if spec.requires_api_key() && api_key.is_none() {
            return Err(ModelsError::MissingApiKey(spec.name.to_string()));
        }

        let endpoint = spec.resolve_endpoint(provider_config.and_then(|c| c.endpoint.as_deref()));
        let strategy = spec.strategy();
        let request = strategy.models_request(endpoint, api_key);
        let timeout = Duration::from_secs(config.network.models_timeout_secs);
        debug!(provider = spec.name, url = %request.url, "listing models");

        match self.transport.execute(&request, timeout).await {
            Ok(response) => Ok(strategy.normalize_models(response.body)),
            Err(e) => {
                let classified = classify(spec.name, &ProviderError::Transport(e));
                error!(
                    provider = spec.name,
                    category = %classified.category,
                    "failed to list models: {}",
                    classified.message
                );
                Err(ModelsError::Provider {
                    category: classified.category,
                    message: classified.message,
                })
            }
        }
    }

    /// Current translation modes.
    pub fn translation_modes(&self) -> Result<TranslationModes, GatewayError> {
        Ok(self.config.load()?.translation_modes)
    }

    /// Apply a partial mode update and persist it.
    pub async fn update_translation_modes(
        &self,
        update: ModeUpdate,
    ) -> Result<TranslationModes, UpdateError> {
        let _guard = self.update_lock.lock().await;
        let mut config = self.config.load_stored()?;
        let modes = &mut config.translation_modes;

        if let Some(mode) = update.default_mode {
            modes.default_mode = mode;
        }
        if let Some(thinking) = update.thinking_enabled {
            modes.thinking_enabled = thinking;
        }
        if let Some(PromptOverride {
            mode: Some(mode),
            prompt,
        }) = update.prompt_override
        {
            match prompt.filter(|p| !p.is_empty()) {
                Some(prompt) => {
                    modes.custom_overrides.insert(mode, prompt);
                }
                None => {
                    modes.custom_overrides.remove(&mode);
                }
            }
        }

        self.config.save(&config)?;
        info!(mode = %config.translation_modes.default_mode, "translation modes updated");
        Ok(config.translation_modes)
    }

    /// Saved models, in insertion order.
    pub fn saved_models(&self) -> Result<Vec<SavedModel>, GatewayError> {
        Ok(self.config.load()?.saved_models)
    }

    /// Remember `model_id` for `provider` and make it the default.
    ///
    /// A supplied key is stored in the config for providers that need one.
    pub async fn save_model(
        &self,
        provider: Option<&str>,
        model_id: Option<&str>,
        api_key: Option<&str>,
    ) -> Result<SavedModel, UpdateError> {
        let (Some(provider_id), Some(model_id)) = (non_empty(provider), non_empty(model_id)) else {
            return Err(UpdateError::MissingFields);
        };
        let spec = registry::find_by_name(provider_id)
            .ok_or_else(|| UpdateError::UnknownProvider(provider_id.to_string()))?;

        let _guard = self.update_lock.lock().await;
        // Key checks see env overrides; only the stored layer is written back.
        let current = self.config.load()?;
        let mut config = self.config.load_stored()?;

        let temp_key = non_empty(api_key);
        let effective_key = temp_key
            .or_else(|| {
                current
                    .providers
                    .get_by_name(spec.name)
                    .and_then(ProviderConfig::api_key)
            })
            .unwrap_or_default()
            .to_string();

        if spec.requires_api_key() && effective_key.is_empty() {
            return Err(UpdateError::MissingApiKey(spec.name.to_string()));
        }
        if let (Some(key), false) = (temp_key, spec.is_local()) {
            if let Some(provider_config) = config.providers.get_mut_by_name(spec.name) {
                provider_config.api_key = key.to_string();
            }
        }

        let api_key_hash = if effective_key.is_empty() {
            String::new()
        } else {
            hex::encode(Sha256::digest(effective_key.as_bytes()))
        };
        let display_name = format!("{} · {}", spec.display_name, model_id);

        let existing = config
            .saved_models
            .iter()
            .position(|m| m.provider == spec.name && m.model_id == model_id);
        let saved = match existing {
            Some(index) => {
                let existing = &mut config.saved_models[index];
                existing.display_name = display_name;
                existing.api_key_hash = api_key_hash;
                existing.clone()
            }
            None => {
                let model = SavedModel {
                    provider: spec.name.to_string(),
                    model_id: model_id.to_string(),
                    display_name,
                    added_at: Utc::now(),
                    api_key_hash,
                };
                config.saved_models.push(model.clone());
                model
            }
        };

        config.default_provider = spec.name.to_string();
        config.default_model = model_id.to_string();
        self.config.save(&config)?;
        info!(provider = spec.name, model = model_id, "saved model set as default");
        Ok(saved)
    }

    /// Make `provider` / `model_id` the defaults.
    pub async fn set_default_model(
        &self,
        provider: Option<&str>,
        model_id: Option<&str>,
    ) -> Result<(), UpdateError> {
        let (Some(provider_id), Some(model_id)) = (non_empty(provider), non_empty(model_id)) else {
            return Err(UpdateError::MissingFields);
        };
        let spec = registry::find_by_name(provider_id)
            .ok_or_else(|| UpdateError::UnknownProvider(provider_id.to_string()))?;

        let _guard = self.update_lock.lock().await;
        let mut config = self.config.load_stored()?;
        config.default_provider = spec.name.to_string();
        config.default_model = model_id.to_string();
        self.config.save(&config)?;
        info!(provider = spec.name, model = model_id, "default model changed");
        Ok(())
    }
}

/// `Some(s)` only for non-blank strings.
fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Request model, else the configured default (when it belongs to this
/// provider), else the provider's own default.
fn resolve_model<'a>(
    config: &'a Config,
    spec: &'static ProviderSpec,
    requested: Option<&'a str>,
) -> &'a str {
    non_empty(requested)
        .or_else(|| {
            (config.default_provider == spec.name)
                .then(|| non_empty(Some(config.default_model.as_str())))
                .flatten()
        })
        .unwrap_or(spec.default_model)
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use lingogate_core::config::MemoryConfigStore;
    use lingogate_providers::{ProviderRequest, ProviderResponse, TransportError};
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex as StdMutex;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::detect::DetectError;

    struct FixedDetector(Option<&'static str>);

    impl LanguageDetector for FixedDetector {
        fn detect(&self, _text: &str) -> Result<String, DetectError> {
            self.0.map(str::to_string).ok_or(DetectError::Unidentified)
        }
    }

    /// Counts calls and always fails to connect.
    #[derive(Default)]
    struct CountingTransport {
        calls: AtomicU32,
    }

    #[async_trait]
    impl HttpTransport for CountingTransport {
        async fn execute(
            &self,
            _request: &ProviderRequest,
            _timeout: Duration,
        ) -> Result<ProviderResponse, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(TransportError::Connect("connection refused".into()))
        }
    }

    #[derive(Default)]
    struct RecordingSleeper {
        waits: StdMutex<Vec<Duration>>,
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.waits.lock().unwrap().push(duration);
        }
    }

    /// Stored config plus a key that only exists in the read layer.
    struct LayeredStore {
        stored: MemoryConfigStore,
        openrouter_key: &'static str,
    }

    impl ConfigStore for LayeredStore {
        fn load(&self) -> Result<Config, ConfigError> {
            let mut config = self.stored.load()?;
            config.providers.openrouter.api_key = self.openrouter_key.to_string();
            Ok(config)
        }

        fn load_stored(&self) -> Result<Config, ConfigError> {
            self.stored.load()
        }

        fn save(&self, config: &Config) -> Result<(), ConfigError> {
            self.stored.save(config)
        }
    }

    fn gateway(config: Config) -> (Gateway, Arc<MemoryConfigStore>) {
        let store = Arc::new(MemoryConfigStore::new(config));
        let gateway = Gateway::new(store.clone())
            .with_detector(Arc::new(FixedDetector(Some("spa"))))
            .with_sleeper(Arc::new(RecordingSleeper::default()));
        (gateway, store)
    }

    fn translate_request(provider: &str) -> TranslateRequest {
        TranslateRequest {
            text: "Hola".into(),
            target_lang: "English".into(),
            provider: Some(provider.into()),
            model: None,
        }
    }

    async fn sent_body(server: &MockServer) -> Value {
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        requests[0].body_json::<Value>().unwrap()
    }

    #[tokio::test]
    async fn test_translate_openai_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": "Hello"}}]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let mut config = Config::default();
        config.providers.openai = ProviderConfig {
            api_key: "sk-test".into(),
            endpoint: Some(format!("{}/v1/chat/completions", mock_server.uri())),
        };
        let (gateway, _) = gateway(config);

        let outcome = gateway.translate(&translate_request("openai")).await.unwrap();
        assert_eq!(
            outcome,
            TranslationOutcome::Translated {
                output: "Hello".into()
            }
        );

        let body = sent_body(&mock_server).await;
        assert_eq!(body["model"], "gpt-3.5-turbo");
        assert_eq!(body["messages"][1]["content"], "Hola");
        let system = body["messages"][0]["content"].as_str().unwrap();
        assert!(system.contains("Translate strictly into English"));
    }

    #[tokio::test]
    async fn test_translate_missing_key_makes_no_network_call() {
        let transport = Arc::new(CountingTransport::default());
        let (gateway, _) = gateway(Config::default());
        let gateway = gateway.with_transport(transport.clone());

        let outcome = gateway.translate(&translate_request("openai")).await.unwrap();

        assert_eq!(outcome.output(), "Error: API key not set for openai");
        assert!(matches!(
            outcome,
            TranslationOutcome::Failed {
                category: ErrorCategory::MissingApiKey,
                ..
            }
        ));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_translate_unsupported_provider() {
        let (gateway, _) = gateway(Config::default());
        let outcome = gateway.translate(&translate_request("anthropic")).await.unwrap();
        assert_eq!(outcome.output(), "Error: Unsupported provider 'anthropic'");
    }

    #[tokio::test]
    async fn test_translate_connection_failure_retries_then_classifies() {
        let transport = Arc::new(CountingTransport::default());
        let sleeper = Arc::new(RecordingSleeper::default());
        let (gateway, _) = gateway(Config::default());
        let gateway = gateway
            .with_transport(transport.clone())
            .with_sleeper(sleeper.clone());

        let outcome = gateway.translate(&translate_request("ollama")).await.unwrap();

        assert_eq!(transport.calls.load(Ordering::SeqCst), 3);
        assert_eq!(
            *sleeper.waits.lock().unwrap(),
            vec![Duration::from_secs(2), Duration::from_secs(4)]
        );
        assert!(outcome.output().starts_with("Connection to Ollama failed."));
    }

    #[tokio::test]
    async fn test_translate_provider_status_is_not_retried() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let mut config = Config::default();
        config.providers.openrouter = ProviderConfig {
            api_key: "or-key".into(),
            endpoint: Some(format!("{}/api/v1/chat/completions", mock_server.uri())),
        };
        let (gateway, _) = gateway(config);

        let outcome = gateway
            .translate(&translate_request("openrouter"))
            .await
            .unwrap();
        assert_eq!(
            outcome.output(),
            "Error from OpenRouter (Status 429): rate limited"
        );
    }

    #[tokio::test]
    async fn test_translate_ollama_wraps_think_and_renders_source() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "message": {"content": "<think>plan</think>\nHello"}
            })))
            .mount(&mock_server)
            .await;

        let mut config = Config::default();
        config.default_provider = "ollama".into();
        config.providers.ollama.endpoint = Some(format!("{}/api/chat", mock_server.uri()));
        config.translation_modes.thinking_enabled = true;
        config
            .translation_modes
            .custom_overrides
            .insert("only_translate".into(), "From {{SOURCE_LANG}} to {{TARGET_LANG}}.".into());
        let (gateway, _) = gateway(config);

        let request = TranslateRequest {
            provider: None,
            ..translate_request("")
        };
        let outcome = gateway.translate(&request).await.unwrap();
        assert_eq!(
            outcome.output(),
            "<think><div class=\"think-content\">plan</div></think>\nHello"
        );

        let body = sent_body(&mock_server).await;
        assert_eq!(body["messages"][0]["content"], "From spa to English.");
        assert_eq!(body["think"], json!(true));
        assert_eq!(body["model"], "llama3");
    }

    #[tokio::test]
    async fn test_translate_detection_failure_degrades() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": "Hi"}}]
            })))
            .mount(&mock_server)
            .await;

        let mut config = Config::default();
        config.providers.lmstudio.endpoint =
            Some(format!("{}/v1/chat/completions", mock_server.uri()));
        config
            .translation_modes
            .custom_overrides
            .insert("only_translate".into(), "{{SOURCE_LANG}}".into());
        let (gateway, _) = gateway(config);
        let gateway = gateway.with_detector(Arc::new(FixedDetector(None)));

        let outcome = gateway.translate(&translate_request("lmstudio")).await.unwrap();
        assert!(outcome.is_success());

        let body = sent_body(&mock_server).await;
        assert_eq!(body["messages"][0]["content"], "the source language");
    }

    #[tokio::test]
    async fn test_translate_malformed_response() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
            .mount(&mock_server)
            .await;

        let mut config = Config::default();
        config.providers.gemini = ProviderConfig {
            api_key: "g-key".into(),
            endpoint: Some(format!("{}/v1beta/models", mock_server.uri())),
        };
        let (gateway, _) = gateway(config);

        let outcome = gateway.translate(&translate_request("gemini")).await.unwrap();
        assert_eq!(outcome.output(), "Error: Malformed provider response.");
    }

    #[test]
    fn test_resolve_model_fallbacks() {
        let mut config = Config::default();
        config.default_provider = "openai".into();
        config.default_model = "gpt-4o".into();

        assert_eq!(resolve_model(&config, &registry::OPENAI, Some("o1")), "o1");
        assert_eq!(resolve_model(&config, &registry::OPENAI, Some("  ")), "gpt-4o");
        assert_eq!(resolve_model(&config, &registry::OPENAI, None), "gpt-4o");
        // Default model belongs to another provider.
        assert_eq!(resolve_model(&config, &registry::OLLAMA, None), "llama3");
    }

    // ── list_models ──

    #[tokio::test]
    async fn test_list_models_ollama_mapping() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"models": [{"name": "llama3"}]})),
            )
            .mount(&mock_server)
            .await;

        let mut config = Config::default();
        config.providers.ollama.endpoint = Some(format!("{}/api/chat", mock_server.uri()));
        let (gateway, _) = gateway(config);

        let models = gateway.list_models(Some("ollama"), None).await.unwrap();
        assert_eq!(
            models,
            json!({"data": [{"id": "llama3", "object": "model"}]})
        );
    }

    #[tokio::test]
    async fn test_list_models_temp_key_overrides_config() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/models"))
            .and(wiremock::matchers::header("Authorization", "Bearer temp"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [{"id": "gpt-4o"}]})))
            .mount(&mock_server)
            .await;

        let mut config = Config::default();
        config.providers.openai = ProviderConfig {
            api_key: "stored".into(),
            endpoint: Some(format!("{}/v1/chat/completions", mock_server.uri())),
        };
        let (gateway, _) = gateway(config);

        let models = gateway.list_models(Some("openai"), Some("temp")).await.unwrap();
        assert_eq!(models["data"][0]["id"], "gpt-4o");
    }

    #[tokio::test]
    async fn test_list_models_request_errors() {
        let (gateway, _) = gateway(Config::default());

        let err = gateway.list_models(None, None).await.unwrap_err();
        assert_eq!(err.code(), "missing_provider");

        let err = gateway.list_models(Some("bogus"), None).await.unwrap_err();
        assert_eq!(err.code(), "invalid_provider");

        let err = gateway.list_models(Some("gemini"), None).await.unwrap_err();
        assert_eq!(err.code(), "missing_api_key");
        assert_eq!(err.to_string(), "API key not set for gemini");
        assert!(err.is_request_error());
    }

    #[tokio::test]
    async fn test_list_models_provider_failure() {
        let transport = Arc::new(CountingTransport::default());
        let (gateway, _) = gateway(Config::default());
        let gateway = gateway.with_transport(transport.clone());

        let err = gateway.list_models(Some("lmstudio"), None).await.unwrap_err();
        assert_eq!(err.code(), "provider_error");
        assert!(!err.is_request_error());
        assert!(err.to_string().contains("LM Studio"));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    // ── config updates ──

    #[tokio::test]
    async fn test_mode_update_and_override_removal() {
        let (gateway, store) = gateway(Config::default());

        gateway
            .update_translation_modes(ModeUpdate {
                default_mode: Some("master_translate".into()),
                thinking_enabled: Some(true),
                prompt_override: Some(PromptOverride {
                    mode: Some("master_translate".into()),
                    prompt: Some("Custom {{TARGET_LANG}}".into()),
                }),
            })
            .await
            .unwrap();

        let modes = store.load().unwrap().translation_modes;
        assert_eq!(modes.default_mode, "master_translate");
        assert!(modes.thinking_enabled);
        assert_eq!(modes.active_template(), "Custom {{TARGET_LANG}}");

        gateway
            .update_translation_modes(ModeUpdate {
                prompt_override: Some(PromptOverride {
                    mode: Some("master_translate".into()),
                    prompt: Some(String::new()),
                }),
                ..Default::default()
            })
            .await
            .unwrap();

        let modes = store.load().unwrap().translation_modes;
        assert!(modes.custom_overrides.is_empty());
        assert!(modes.thinking_enabled);
        assert!(modes.active_template().contains("master literary"));
    }

    #[tokio::test]
    async fn test_save_model_upserts_and_sets_default() {
        let (gateway, store) = gateway(Config::default());

        let saved = gateway
            .save_model(Some("openai"), Some("gpt-4o"), Some("sk-new"))
            .await
            .unwrap();
        assert_eq!(saved.display_name, "OpenAI · gpt-4o");
        assert_eq!(
            saved.api_key_hash,
            hex::encode(Sha256::digest("sk-new".as_bytes()))
        );

        gateway
            .save_model(Some("openai"), Some("gpt-4o"), None)
            .await
            .unwrap();

        let config = store.load().unwrap();
        assert_eq!(config.saved_models.len(), 1);
        assert_eq!(config.providers.openai.api_key, "sk-new");
        assert_eq!(config.default_provider, "openai");
        assert_eq!(config.default_model, "gpt-4o");
    }

    #[tokio::test]
    async fn test_save_model_local_provider_keeps_no_key() {
        let (gateway, store) = gateway(Config::default());

        let saved = gateway
            .save_model(Some("lmstudio"), Some("qwen"), None)
            .await
            .unwrap();
        assert_eq!(saved.display_name, "LM Studio · qwen");
        assert!(saved.api_key_hash.is_empty());

        gateway
            .save_model(Some("ollama"), Some("llama3"), Some("ignored"))
            .await
            .unwrap();
        let config = store.load().unwrap();
        assert!(config.providers.ollama.api_key.is_empty());
        assert_eq!(config.saved_models.len(), 2);
        assert_eq!(config.default_provider, "ollama");
    }

    #[tokio::test]
    async fn test_save_model_validation() {
        let (gateway, _) = gateway(Config::default());

        let err = gateway.save_model(None, Some("m"), None).await.unwrap_err();
        assert!(matches!(err, UpdateError::MissingFields));

        let err = gateway
            .save_model(Some("bogus"), Some("m"), None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Provider 'bogus' not configured.");

        let err = gateway
            .save_model(Some("gemini"), Some("gemini-1.5-pro"), None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "API key is required for gemini.");
        assert!(err.is_request_error());
    }

    #[tokio::test]
    async fn test_set_default_model() {
        let (gateway, store) = gateway(Config::default());

        gateway
            .set_default_model(Some("gemini"), Some("gemini-2.0-flash"))
            .await
            .unwrap();
        let config = store.load().unwrap();
        assert_eq!(config.default_provider, "gemini");
        assert_eq!(config.default_model, "gemini-2.0-flash");

        assert!(gateway.set_default_model(Some("gemini"), None).await.is_err());
    }

    #[tokio::test]
    async fn test_updates_do_not_persist_read_layer() {
        let store = Arc::new(LayeredStore {
            stored: MemoryConfigStore::default(),
            openrouter_key: "sk-from-env",
        });
        let gateway = Gateway::new(store.clone());

        // The read-layer key satisfies the key check.
        let saved = gateway
            .save_model(Some("openrouter"), Some("openrouter/auto"), None)
            .await
            .unwrap();
        assert_eq!(
            saved.api_key_hash,
            hex::encode(Sha256::digest("sk-from-env".as_bytes()))
        );

        gateway
            .update_translation_modes(ModeUpdate {
                thinking_enabled: Some(true),
                ..Default::default()
            })
            .await
            .unwrap();

        let stored = store.load_stored().unwrap();
        assert!(stored.providers.openrouter.api_key.is_empty());
        assert!(stored.translation_modes.thinking_enabled);
        assert_eq!(stored.default_provider, "openrouter");
    }

    #[tokio::test]
    async fn test_unparsable_config_file_blocks_updates() {
        use lingogate_core::config::FileConfigStore;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let broken = r#"{"providers":{"openai":{"apiKey":"sk-user-key"}},}"#;
        std::fs::write(&path, broken).unwrap();
        let gateway = Gateway::new(Arc::new(FileConfigStore::new(path.clone())));

        let err = gateway
            .update_translation_modes(ModeUpdate {
                default_mode: Some("master_translate".into()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, UpdateError::Config(ConfigError::Json(_))));
        assert!(!err.is_request_error());

        let err = gateway
            .set_default_model(Some("gemini"), Some("gemini-1.5-pro"))
            .await
            .unwrap_err();
        assert!(matches!(err, UpdateError::Config(_)));

        assert!(gateway.translate(&translate_request("openai")).await.is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), broken);
    }
}
