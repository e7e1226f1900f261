//! HTTP boundary: axum router over a shared [`Gateway`].
//!
//! `/translate` answers 200 for every classified failure, with the
//! message in `output`; 500 is reserved for internal faults.
//!
//! Every JSON body on this boundary uses snake_case keys, in both
//! directions. The camelCase on-disk schema never leaks out: reads go
//! through the `*View` types below.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tracing::error;

use lingogate_core::config::schema::{NetworkConfig, ServerConfig};
use lingogate_core::config::{Config, ProviderConfig, SavedModel, TranslationModes};

use crate::orchestrator::{
    Gateway, GatewayError, ModeUpdate, ModelsError, TranslateRequest, UpdateError,
};

/// Shared handler state.
pub struct AppState {
    pub gateway: Arc<Gateway>,
}

type ApiResponse = (StatusCode, Json<Value>);

/// Build the full router.
pub fn router(gateway: Arc<Gateway>) -> Router {
    let state = Arc::new(AppState { gateway });

    Router::new()
        .route("/health", get(health_handler))
        .route("/translate", post(translate_handler))
        .route("/models", get(list_models_handler))
        .route("/get-models", get(list_models_handler))
        .route("/config", get(config_handler))
        .route("/get-config", get(config_handler))
        .route(
            "/translation-modes",
            get(get_modes_handler).post(update_modes_handler),
        )
        .route("/saved-models", get(saved_models_handler))
        .route("/save-model", post(save_model_handler))
        .route("/set-default-model", post(set_default_model_handler))
        .with_state(state)
}

// ─────────────────────────────────────────────
// Request bodies
// ─────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ModelsQuery {
    #[serde(default, alias = "engine")]
    pub provider: Option<String>,
    #[serde(default, rename = "tempKey", alias = "temp_key")]
    pub temp_key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SaveModelBody {
    #[serde(default, alias = "engine")]
    pub provider: Option<String>,
    #[serde(default)]
    pub model_id: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
}

// ─────────────────────────────────────────────
// Response bodies
// ─────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ModesView {
    pub default_mode: String,
    pub presets: BTreeMap<String, String>,
    pub custom_overrides: BTreeMap<String, String>,
    pub thinking_enabled: bool,
}

impl From<TranslationModes> for ModesView {
    fn from(modes: TranslationModes) -> Self {
        Self {
            default_mode: modes.default_mode,
            presets: modes.presets,
            custom_overrides: modes.custom_overrides,
            thinking_enabled: modes.thinking_enabled,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SavedModelView {
    pub provider: String,
    pub model_id: String,
    pub display_name: String,
    pub added_at: DateTime<Utc>,
    pub api_key_hash: String,
}

impl From<SavedModel> for SavedModelView {
    fn from(model: SavedModel) -> Self {
        Self {
            provider: model.provider,
            model_id: model.model_id,
            display_name: model.display_name,
            added_at: model.added_at,
            api_key_hash: model.api_key_hash,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProviderView {
    pub api_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl From<ProviderConfig> for ProviderView {
    fn from(provider: ProviderConfig) -> Self {
        Self {
            api_key: provider.api_key,
            endpoint: provider.endpoint,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ServerView {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Serialize)]
pub struct NetworkView {
    pub translate_timeout_secs: u64,
    pub models_timeout_secs: u64,
    pub max_attempts: u32,
    pub initial_backoff_secs: u64,
    pub max_backoff_secs: u64,
}

/// Whole config snapshot as served by `/config`.
#[derive(Debug, Serialize)]
pub struct ConfigView {
    pub default_provider: String,
    pub default_model: String,
    pub providers: BTreeMap<String, ProviderView>,
    pub saved_models: Vec<SavedModelView>,
    pub translation_modes: ModesView,
    pub server: ServerView,
    pub network: NetworkView,
}

impl From<Config> for ConfigView {
    fn from(config: Config) -> Self {
        let ServerConfig { host, port } = config.server;
        let NetworkConfig {
            translate_timeout_secs,
            models_timeout_secs,
            max_attempts,
            initial_backoff_secs,
            max_backoff_secs,
        } = config.network;
        Self {
            providers: config
                .providers
                .to_map()
                .into_iter()
                .map(|(name, provider)| (name, provider.into()))
                .collect(),
            saved_models: config.saved_models.into_iter().map(Into::into).collect(),
            translation_modes: config.translation_modes.into(),
            default_provider: config.default_provider,
            default_model: config.default_model,
            server: ServerView { host, port },
            network: NetworkView {
                translate_timeout_secs,
                models_timeout_secs,
                max_attempts,
                initial_backoff_secs,
                max_backoff_secs,
            },
        }
    }
}

// ─────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────

async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn translate_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TranslateRequest>, JsonRejection>,
) -> ApiResponse {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "output": format!("Invalid request: {}", rejection.body_text()) })),
            )
        }
    };

    // A panic inside the call surfaces as a JoinError instead of a dropped connection.
    let gateway = state.gateway.clone();
    let result = tokio::spawn(async move { gateway.translate(&request).await })
        .await
        .map_err(|e| GatewayError::Internal(e.to_string()))
        .and_then(|inner| inner);

    match result {
        Ok(outcome) => (StatusCode::OK, Json(json!({ "output": outcome.output() }))),
        Err(e) => {
            error!(category = %e.category(), error = %e, "unhandled error during translation");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "output": format!("A critical server error occurred: {e}") })),
            )
        }
    }
}

async fn list_models_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ModelsQuery>,
) -> ApiResponse {
    match state
        .gateway
        .list_models(query.provider.as_deref(), query.temp_key.as_deref())
        .await
    {
        Ok(models) => (StatusCode::OK, Json(models)),
        Err(e @ ModelsError::Provider { .. }) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.code(), "text": e.to_string() })),
        ),
        Err(e) => {
            let status = if e.is_request_error() {
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            (status, Json(json!({ "error": e.code(), "message": e.to_string() })))
        }
    }
}

async fn config_handler(State(state): State<Arc<AppState>>) -> ApiResponse {
    snapshot(state.gateway.config().map(ConfigView::from))
}

async fn get_modes_handler(State(state): State<Arc<AppState>>) -> ApiResponse {
    snapshot(state.gateway.translation_modes().map(ModesView::from))
}

async fn saved_models_handler(State(state): State<Arc<AppState>>) -> ApiResponse {
    snapshot(
        state
            .gateway
            .saved_models()
            .map(|models| models.into_iter().map(SavedModelView::from).collect::<Vec<_>>()),
    )
}

async fn update_modes_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ModeUpdate>, JsonRejection>,
) -> ApiResponse {
    let Json(update) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return failure(StatusCode::BAD_REQUEST, rejection.body_text()),
    };
    match state.gateway.update_translation_modes(update).await {
        Ok(_) => success(),
        Err(e) => update_failure(e),
    }
}

async fn save_model_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SaveModelBody>, JsonRejection>,
) -> ApiResponse {
    let Json(body) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return failure(StatusCode::BAD_REQUEST, rejection.body_text()),
    };
    let result = state
        .gateway
        .save_model(
            body.provider.as_deref(),
            body.model_id.as_deref(),
            body.api_key.as_deref(),
        )
        .await;
    match result {
        Ok(_) => success(),
        Err(e) => update_failure(e),
    }
}

async fn set_default_model_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SaveModelBody>, JsonRejection>,
) -> ApiResponse {
    let Json(body) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return failure(StatusCode::BAD_REQUEST, rejection.body_text()),
    };
    match state
        .gateway
        .set_default_model(body.provider.as_deref(), body.model_id.as_deref())
        .await
    {
        Ok(()) => success(),
        Err(e) => update_failure(e),
    }
}

// ─────────────────────────────────────────────
// Response helpers
// ─────────────────────────────────────────────

fn snapshot<T: Serialize>(result: Result<T, GatewayError>) -> ApiResponse {
    match result.and_then(|value| {
        serde_json::to_value(value).map_err(|e| GatewayError::Internal(e.to_string()))
    }) {
        Ok(value) => (StatusCode::OK, Json(value)),
        Err(e) => {
            error!(error = %e, "failed to read configuration");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "config_error", "message": e.to_string() })),
            )
        }
    }
}

fn success() -> ApiResponse {
    (StatusCode::OK, Json(json!({ "success": true })))
}

fn failure(status: StatusCode, message: impl Into<String>) -> ApiResponse {
    (
        status,
        Json(json!({ "success": false, "message": message.into() })),
    )
}

fn update_failure(e: UpdateError) -> ApiResponse {
    if e.is_request_error() {
        failure(StatusCode::BAD_REQUEST, e.to_string())
    } else {
        error!(error = %e, "failed to persist configuration");
        failure(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use lingogate_core::config::{Config, ConfigError, ConfigStore, MemoryConfigStore};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct BrokenStore;

    impl ConfigStore for BrokenStore {
        fn load(&self) -> Result<Config, ConfigError> {
            Err(ConfigError::Poisoned)
        }

        fn save(&self, _config: &Config) -> Result<(), ConfigError> {
            Err(ConfigError::Poisoned)
        }
    }

    fn state_with(config: Config) -> (Arc<AppState>, Arc<MemoryConfigStore>) {
        let store = Arc::new(MemoryConfigStore::new(config));
        let gateway = Arc::new(Gateway::new(store.clone()));
        (Arc::new(AppState { gateway }), store)
    }

    fn translate_body(provider: &str) -> TranslateRequest {
        TranslateRequest {
            text: "Hola".into(),
            target_lang: "English".into(),
            provider: Some(provider.into()),
            model: None,
        }
    }

    #[test]
    fn test_router_builds() {
        let (state, _) = state_with(Config::default());
        let _ = router(state.gateway.clone());
    }

    #[tokio::test]
    async fn test_health() {
        let Json(body) = health_handler().await;
        assert_eq!(body, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn test_translate_success_envelope() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": "Hello"}}]
            })))
            .mount(&mock_server)
            .await;

        let mut config = Config::default();
        config.providers.openai.api_key = "sk-test".into();
        config.providers.openai.endpoint =
            Some(format!("{}/v1/chat/completions", mock_server.uri()));
        let (state, _) = state_with(config);

        let (status, Json(body)) =
            translate_handler(State(state), Ok(Json(translate_body("openai")))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"output": "Hello"}));
    }

    #[tokio::test]
    async fn test_translate_missing_key_is_200() {
        let (state, _) = state_with(Config::default());

        let (status, Json(body)) =
            translate_handler(State(state), Ok(Json(translate_body("openai")))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"output": "Error: API key not set for openai"}));
    }

    #[tokio::test]
    async fn test_translate_internal_fault_is_500() {
        let gateway = Arc::new(Gateway::new(Arc::new(BrokenStore)));
        let state = Arc::new(AppState { gateway });

        let (status, Json(body)) =
            translate_handler(State(state), Ok(Json(translate_body("openai")))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["output"]
            .as_str()
            .unwrap()
            .starts_with("A critical server error occurred:"));
    }

    #[tokio::test]
    async fn test_models_status_codes() {
        let (state, _) = state_with(Config::default());

        let (status, Json(body)) =
            list_models_handler(State(state.clone()), Query(ModelsQuery::default())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "missing_provider");

        let query = ModelsQuery {
            provider: Some("openai".into()),
            temp_key: None,
        };
        let (status, Json(body)) = list_models_handler(State(state.clone()), Query(query)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "missing_api_key");
        assert_eq!(body["message"], "API key not set for openai");

        // Nothing listens on port 1.
        let mut config = Config::default();
        config.providers.ollama.endpoint = Some("http://127.0.0.1:1/api/chat".into());
        let (state, _) = state_with(config);
        let query = ModelsQuery {
            provider: Some("ollama".into()),
            temp_key: None,
        };
        let (status, Json(body)) = list_models_handler(State(state), Query(query)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "provider_error");
        assert!(body["text"].as_str().unwrap().contains("Ollama"));
    }

    #[test]
    fn test_models_query_accepts_legacy_names() {
        let uri: axum::http::Uri = "http://localhost/get-models?engine=gemini&tempKey=abc"
            .parse()
            .unwrap();
        let Query(query) = Query::<ModelsQuery>::try_from_uri(&uri).unwrap();
        assert_eq!(query.provider.as_deref(), Some("gemini"));
        assert_eq!(query.temp_key.as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn test_save_model_and_read_back() {
        let (state, store) = state_with(Config::default());

        let body = SaveModelBody {
            provider: Some("openrouter".into()),
            model_id: Some("openrouter/auto".into()),
            api_key: Some("or-key".into()),
        };
        let (status, Json(resp)) = save_model_handler(State(state.clone()), Ok(Json(body))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(resp, json!({"success": true}));

        let (status, Json(saved)) = saved_models_handler(State(state.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(saved[0]["display_name"], "OpenRouter · openrouter/auto");
        assert_eq!(saved[0]["model_id"], "openrouter/auto");
        assert!(saved[0].get("displayName").is_none());

        assert_eq!(store.load().unwrap().default_provider, "openrouter");

        let body = SaveModelBody {
            provider: Some("gemini".into()),
            model_id: Some("gemini-1.5-pro".into()),
            api_key: None,
        };
        let (status, Json(resp)) = save_model_handler(State(state), Ok(Json(body))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(resp["success"], false);
        assert_eq!(resp["message"], "API key is required for gemini.");
    }

    #[tokio::test]
    async fn test_modes_round_trip_through_handlers() {
        let (state, _) = state_with(Config::default());

        let update = ModeUpdate {
            default_mode: Some("prompt_translator".into()),
            ..Default::default()
        };
        let (status, _) = update_modes_handler(State(state.clone()), Ok(Json(update))).await;
        assert_eq!(status, StatusCode::OK);

        let (status, Json(modes)) = get_modes_handler(State(state.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(modes["default_mode"], "prompt_translator");
        assert!(modes["presets"]["only_translate"].is_string());

        let (status, Json(config)) = config_handler(State(state)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(config["translation_modes"]["default_mode"], "prompt_translator");
        assert_eq!(config["default_provider"], "openai");
        assert_eq!(config["providers"]["openai"]["api_key"], "");
        assert_eq!(config["network"]["max_attempts"], 3);
    }

    #[tokio::test]
    async fn test_modes_read_shape_is_accepted_by_update() {
        let (state, store) = state_with(Config::default());

        let (_, Json(mut modes)) = get_modes_handler(State(state.clone())).await;
        let keys: Vec<&str> = modes.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec!["custom_overrides", "default_mode", "presets", "thinking_enabled"]
        );

        modes["default_mode"] = json!("master_translate");
        modes["thinking_enabled"] = json!(true);
        let update: ModeUpdate = serde_json::from_value(modes).unwrap();
        let (status, Json(resp)) = update_modes_handler(State(state), Ok(Json(update))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(resp, json!({"success": true}));

        let stored = store.load().unwrap().translation_modes;
        assert_eq!(stored.default_mode, "master_translate");
        assert!(stored.thinking_enabled);
    }

    #[tokio::test]
    async fn test_config_failure_is_500() {
        let gateway = Arc::new(Gateway::new(Arc::new(BrokenStore)));
        let state = Arc::new(AppState { gateway });
        let (status, Json(body)) = config_handler(State(state)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "config_error");
    }
}
