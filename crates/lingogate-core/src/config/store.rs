//! Config store: the seam between the gateway and wherever config lives.
//!
//! The gateway reads one immutable snapshot per call via [`ConfigStore::load`]
//! and only writes through [`ConfigStore::save`]. Nothing holds a global
//! mutable `Config`.
//!
//! Updates start from [`ConfigStore::load_stored`], not `load`: the file
//! store layers env overrides on top of the file when reading, and those
//! must never be written back.

use std::path::{Path, PathBuf};
use std::sync::RwLock;

use super::loader::{read_config_file, save_config, try_load_config, ConfigError};
use super::schema::Config;

/// Source of configuration snapshots.
pub trait ConfigStore: Send + Sync {
    /// Current configuration. Callers treat the result as read-only.
    fn load(&self) -> Result<Config, ConfigError>;

    /// The persisted layer only, as the base for a load → modify → save cycle.
    fn load_stored(&self) -> Result<Config, ConfigError> {
        self.load()
    }

    /// Persist a new configuration.
    fn save(&self, config: &Config) -> Result<(), ConfigError>;
}

/// JSON file on disk, re-read on every call so hand edits are picked up.
///
/// A file that exists but cannot be read or parsed is an error, so a typo
/// fails the request instead of being replaced with defaults.
#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `~/.lingogate/config.json`.
    pub fn default_location() -> Self {
        Self::new(super::loader::get_config_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Result<Config, ConfigError> {
        try_load_config(&self.path)
    }

    fn load_stored(&self) -> Result<Config, ConfigError> {
        read_config_file(&self.path)
    }

    fn save(&self, config: &Config) -> Result<(), ConfigError> {
        save_config(config, Some(&self.path))
    }
}

/// In-process store, used by tests and one-shot CLI commands.
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    inner: RwLock<Config>,
}

impl MemoryConfigStore {
    pub fn new(config: Config) -> Self {
        Self {
            inner: RwLock::new(config),
        }
    }
}

impl ConfigStore for MemoryConfigStore {
    fn load(&self) -> Result<Config, ConfigError> {
        self.inner
            .read()
            .map(|c| c.clone())
            .map_err(|_| ConfigError::Poisoned)
    }

    fn save(&self, config: &Config) -> Result<(), ConfigError> {
        let mut guard = self.inner.write().map_err(|_| ConfigError::Poisoned)?;
        *guard = config.clone();
        Ok(())
    }
}
