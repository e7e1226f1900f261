//! Config loader: reads `~/.lingogate/config.json` and merges env vars.
//!
//! # Loading precedence
//! 1. Defaults (from `Config::default()`)
//! 2. JSON file at `~/.lingogate/config.json`
//! 3. Environment variables `LINGOGATE_<SECTION>__<FIELD>` (override JSON)

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::schema::{Config, ProviderConfig};
use crate::utils::atomic_write;

/// Errors from reading or writing the config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config store lock poisoned")]
    Poisoned,
}

/// Default config file path.
pub fn get_config_path() -> PathBuf {
    crate::utils::get_data_path().join("config.json")
}

/// Load configuration from the default path + env vars.
///
/// Falls back to `Config::default()` if the file can't be read or parsed.
/// A missing file is created with defaults so users have something to edit.
/// Only for display; anything that writes config back uses
/// [`try_load_config`] so a broken file is never overwritten.
pub fn load_config(path: Option<&Path>) -> Config {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    match try_load_config(&config_path) {
        Ok(config) => config,
        Err(e) => {
            warn!("Failed to load config {}: {}", config_path.display(), e);
            apply_env_overrides(Config::default())
        }
    }
}

/// Load the file at `path` and apply env overrides.
///
/// A missing file is created with defaults. An unreadable or unparsable
/// file is an error.
pub fn try_load_config(path: &Path) -> Result<Config, ConfigError> {
    Ok(apply_env_overrides(read_config_file(path)?))
}

/// The config exactly as stored on disk, without env overrides.
///
/// This is what read-modify-write cycles start from, so values that only
/// exist in the environment never reach the file.
pub fn read_config_file(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        info!("No config file found at {}, writing defaults", path.display());
        let config = Config::default();
        if let Err(e) = save_config(&config, Some(path)) {
            warn!("Failed to write default config to {}: {}", path.display(), e);
        }
        return Ok(config);
    }

    debug!("Loading config from {}", path.display());
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Save configuration to disk (pretty-printed JSON with camelCase keys).
///
/// Written to a sibling temp file and renamed into place, so concurrent
/// readers see either the old or the new file.
pub fn save_config(config: &Config, path: Option<&Path>) -> Result<(), ConfigError> {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(config)?;
    atomic_write(&config_path, &json)?;
    debug!("Config saved to {}", config_path.display());
    Ok(())
}

/// Apply environment variable overrides on top of a loaded config.
///
/// Env var format: `LINGOGATE_<SECTION>__<FIELD>` (double underscore as delimiter).
///
/// Supported overrides:
/// - `LINGOGATE_DEFAULT_PROVIDER` → `default_provider`
/// - `LINGOGATE_DEFAULT_MODEL` → `default_model`
/// - `LINGOGATE_PROVIDERS__<NAME>__API_KEY` → `providers.<name>.api_key`
/// - `LINGOGATE_PROVIDERS__<NAME>__ENDPOINT` → `providers.<name>.endpoint`
/// - `LINGOGATE_SERVER__HOST` → `server.host`
/// - `LINGOGATE_SERVER__PORT` → `server.port`
fn apply_env_overrides(mut config: Config) -> Config {
    if let Ok(val) = std::env::var("LINGOGATE_DEFAULT_PROVIDER") {
        config.default_provider = val;
    }
    if let Ok(val) = std::env::var("LINGOGATE_DEFAULT_MODEL") {
        config.default_model = val;
    }

    apply_provider_env(&mut config.providers.openai, "OPENAI");
    apply_provider_env(&mut config.providers.gemini, "GEMINI");
    apply_provider_env(&mut config.providers.openrouter, "OPENROUTER");
    apply_provider_env(&mut config.providers.ollama, "OLLAMA");
    apply_provider_env(&mut config.providers.lmstudio, "LMSTUDIO");

    if let Ok(val) = std::env::var("LINGOGATE_SERVER__HOST") {
        config.server.host = val;
    }
    if let Ok(val) = std::env::var("LINGOGATE_SERVER__PORT") {
        match val.parse::<u16>() {
            Ok(p) => config.server.port = p,
            Err(_) => warn!("Ignoring invalid LINGOGATE_SERVER__PORT={}", val),
        }
    }

    config
}

/// Apply env var overrides for a single provider.
fn apply_provider_env(provider: &mut ProviderConfig, name: &str) {
    if let Ok(val) = std::env::var(format!("LINGOGATE_PROVIDERS__{name}__API_KEY")) {
        provider.api_key = val;
    }
    if let Ok(val) = std::env::var(format!("LINGOGATE_PROVIDERS__{name}__ENDPOINT")) {
        provider.endpoint = Some(val);
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
