//! `lingogate status`: show configuration and provider status.

use std::path::Path;

use anyhow::Result;
use colored::Colorize;

use lingogate_core::config::load_config;
use lingogate_providers::registry::PROVIDERS;

/// Run the status command.
pub fn run(config_path: &Path) -> Result<()> {
    let config_exists = config_path.exists();
    let config = load_config(Some(config_path));

    println!();
    println!("{}", "🌐 Lingogate Status".cyan().bold());
    println!();

    // Config
    println!(
        "  {:<18} {} {}",
        "Config:".bold(),
        config_path.display(),
        if config_exists {
            "✓".green().to_string()
        } else {
            "(created with defaults)".yellow().to_string()
        }
    );

    // Defaults
    let model = if config.default_model.is_empty() {
        "(provider default)".dimmed().to_string()
    } else {
        config.default_model.clone()
    };
    println!(
        "  {:<18} {} / {}",
        "Default:".bold(),
        config.default_provider,
        model
    );
    println!(
        "  {:<18} {}{}",
        "Mode:".bold(),
        config.translation_modes.default_mode,
        if config.translation_modes.thinking_enabled {
            " (thinking)".dimmed().to_string()
        } else {
            String::new()
        }
    );
    println!(
        "  {:<18} {}:{}",
        "Server:".bold(),
        config.server.host,
        config.server.port
    );
    println!(
        "  {:<18} {}",
        "Saved models:".bold(),
        config.saved_models.len()
    );

    // Providers
    println!();
    println!("  {}", "Providers:".bold());
    let providers_map = config.providers.to_map();

    for spec in PROVIDERS {
        let prov_config = providers_map.get(spec.name);
        let status = if !spec.requires_api_key() {
            format!("{}", "· local, no key needed".dimmed())
        } else if prov_config.is_some_and(|c| c.is_configured()) {
            format!("{} (key set)", "✓".green())
        } else {
            format!("{}", "· not configured".dimmed())
        };
        let endpoint =
            spec.resolve_endpoint(prov_config.and_then(|c| c.endpoint.as_deref()));
        println!("    {:<14} {:<26} {}", spec.display_name, status, endpoint.dimmed());
    }

    println!();

    Ok(())
}
