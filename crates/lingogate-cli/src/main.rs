//! Lingogate CLI: entry point.
//!
//! # Commands
//!
//! - `lingogate serve [--host H] [--port P]`: run the HTTP gateway
//! - `lingogate translate TEXT --to LANG [--provider P] [--model M]`: one-shot translation
//! - `lingogate models PROVIDER [--key K]`: list a provider's models
//! - `lingogate status`: show configuration and provider status

mod helpers;
mod serve;
mod status;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;

use lingogate_core::config::FileConfigStore;
use lingogate_gateway::{Gateway, TranslateRequest, TranslationOutcome};

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// 🌐 Lingogate: translation gateway for LLM providers
#[derive(Parser)]
#[command(name = "lingogate", version, about, long_about = None)]
struct Cli {
    /// Config file (default: ~/.lingogate/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway
    Serve {
        /// Listen address (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Listen port (overrides config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Translate a piece of text once and print the result
    Translate {
        /// Text to translate
        text: String,

        /// Target language, e.g. "English"
        #[arg(short, long)]
        to: String,

        /// Provider id (openai, gemini, openrouter, ollama, lmstudio)
        #[arg(long)]
        provider: Option<String>,

        /// Model id
        #[arg(short, long)]
        model: Option<String>,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// List the models a provider offers
    Models {
        /// Provider id
        provider: String,

        /// API key to use instead of the configured one
        #[arg(long)]
        key: Option<String>,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Show configuration and provider status
    Status,
}

impl Commands {
    /// Whether `--logs` was passed. Commands without the flag log warnings only.
    fn logs(&self) -> bool {
        match self {
            Commands::Serve { logs, .. }
            | Commands::Translate { logs, .. }
            | Commands::Models { logs, .. } => *logs,
            Commands::Status => false,
        }
    }
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = helpers::resolve_config_path(cli.config);
    init_logging(cli.command.logs());

    match cli.command {
        Commands::Serve { host, port, .. } => serve::run(config_path, host, port).await,
        Commands::Translate {
            text,
            to,
            provider,
            model,
            ..
        } => run_translate(config_path, text, to, provider, model).await,
        Commands::Models { provider, key, .. } => run_models(config_path, provider, key).await,
        Commands::Status => status::run(&config_path),
    }
}

// ─────────────────────────────────────────────
// One-shot commands
// ─────────────────────────────────────────────

async fn run_translate(
    config_path: PathBuf,
    text: String,
    target_lang: String,
    provider: Option<String>,
    model: Option<String>,
) -> Result<()> {
    let gateway = Gateway::new(Arc::new(FileConfigStore::new(config_path)));
    let request = TranslateRequest {
        text,
        target_lang,
        provider,
        model,
    };

    let outcome = gateway
        .translate(&request)
        .await
        .context("translation failed")?;

    match outcome {
        TranslationOutcome::Translated { output } => {
            helpers::print_translation(&output);
            Ok(())
        }
        TranslationOutcome::Failed { category, message } => {
            eprintln!("{} {}", format!("[{category}]").red().bold(), message);
            std::process::exit(1);
        }
    }
}

async fn run_models(config_path: PathBuf, provider: String, key: Option<String>) -> Result<()> {
    let gateway = Gateway::new(Arc::new(FileConfigStore::new(config_path)));

    let models = gateway
        .list_models(Some(&provider), key.as_deref())
        .await
        .with_context(|| format!("failed to list models for {provider}"))?;

    helpers::print_models(&provider, &models);
    Ok(())
}

/// Initialize tracing/logging.
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("lingogate=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
