//! Shared CLI helpers: path resolution, output printing, version banner.

use std::path::{Path, PathBuf};

use colored::Colorize;
use serde_json::Value;

use lingogate_core::config::get_config_path;

/// Expand `~` at the start of a path to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
    let Some(raw) = path.to_str() else {
        return path.to_path_buf();
    };
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = dirs_next::home_dir() {
            return home.join(rest);
        }
    }
    if raw == "~" {
        if let Some(home) = dirs_next::home_dir() {
            return home;
        }
    }
    path.to_path_buf()
}

/// `--config` value, or the default location.
pub fn resolve_config_path(arg: Option<PathBuf>) -> PathBuf {
    arg.map(|p| expand_tilde(&p)).unwrap_or_else(get_config_path)
}

/// Model ids from a `{data: [{id}]}` listing, in order.
pub fn model_ids(models: &Value) -> Vec<&str> {
    models
        .get("data")
        .and_then(Value::as_array)
        .map(|data| {
            data.iter()
                .filter_map(|m| m.get("id").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default()
}

/// Print a translation result to stdout.
pub fn print_translation(output: &str) {
    if output.is_empty() {
        println!("{}", "(empty response)".dimmed());
    } else {
        println!("{output}");
    }
}

/// Print a model listing, one id per line.
pub fn print_models(provider: &str, models: &Value) {
    let ids = model_ids(models);
    if ids.is_empty() {
        // Unknown shape: show it raw.
        println!("{models:#}");
        return;
    }
    println!("{} ({})", provider.cyan().bold(), ids.len());
    for id in ids {
        println!("  {id}");
    }
}

/// Print the banner shown at server start.
pub fn print_banner() {
    let version = env!("CARGO_PKG_VERSION");
    println!();
    println!("{}  v{}", "🌐 Lingogate".cyan().bold(), version.dimmed());
    println!();
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
