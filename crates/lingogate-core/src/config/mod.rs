//! Configuration system: schema, loading, env var overrides, and stores.
//!
//! # Usage
//! ```no_run
//! use lingogate_core::config;
//!
//! let cfg = config::load_config(None);
//! println!("Default provider: {}", cfg.default_provider);
//! ```

pub mod loader;
pub mod schema;
pub mod store;

// Re-export key types
pub use loader::{
    get_config_path, load_config, read_config_file, save_config, try_load_config, ConfigError,
};
pub use schema::{Config, ProviderConfig, SavedModel, TranslationModes};
pub use store::{ConfigStore, FileConfigStore, MemoryConfigStore};
