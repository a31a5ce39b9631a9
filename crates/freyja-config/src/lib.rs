//! Configuration management for FreyjaDB.
//!
//! Provides hierarchical configuration loading from multiple sources, in
//! ascending precedence:
//!
//! 1. Built-in defaults (lowest precedence)
//! 2. `~/.config/freyjadb/config.toml` (user defaults)
//! 3. `./freyjadb.toml` (git-tracked, project config)
//! 4. `./freyjadb.local.toml` (gitignored, local overrides)
//! 5. `FREYJA_*` environment variables
//! 6. CLI arguments (applied by the `freyja` binary after loading)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

mod error;
mod loader;
mod paths;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use paths::Paths;

/// Top-level FreyjaDB configuration, merged from every source `ConfigLoader`
/// knows about.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FreyjaConfig {
    pub storage: StorageConfig,
    pub server: ServerConfig,
    pub system: SystemConfig,
}

/// Settings consumed directly by `freyja_core::store::Config`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    /// Milliseconds between periodic fsyncs; `0` means fsync on every put.
    pub fsync_interval_ms: u64,
    pub max_record_size: usize,
}

impl StorageConfig {
    pub fn fsync_interval(&self) -> Duration {
        Duration::from_millis(self.fsync_interval_ms)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".freyjadb/data"),
            fsync_interval_ms: 0,
            max_record_size: 64 * 1024 * 1024,
        }
    }
}

/// Settings consumed by the `freyja-server` REST facade.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    /// When set, requests must present this value as a bearer token or
    /// `X-Api-Key` header. `None` disables authentication (development mode).
    pub api_key: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            api_key: None,
        }
    }
}

/// Settings consumed by the `freyja-system` encrypted secrets service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub enabled: bool,
    pub key_path: PathBuf,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            key_path: PathBuf::from(".freyjadb/system.key"),
        }
    }
}

impl FreyjaConfig {
    /// Loads configuration from the default locations, rooted at the
    /// current working directory.
    pub fn load() -> Result<Self> {
        ConfigLoader::new().load()
    }

    /// Loads configuration rooted at a specific project directory.
    pub fn load_from_dir(project_dir: impl AsRef<Path>) -> Result<Self> {
        ConfigLoader::new().with_project_dir(project_dir).load()
    }

    /// Resolves `storage.data_dir` and `system.key_path` to absolute paths
    /// relative to `base_dir`, if they were given as relative paths.
    pub fn resolve_paths(&mut self, base_dir: impl AsRef<Path>) {
        let base = base_dir.as_ref();

        if self.storage.data_dir.is_relative() {
            self.storage.data_dir = base.join(&self.storage.data_dir);
        }
        if self.system.key_path.is_relative() {
            self.system.key_path = base.join(&self.system.key_path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sensible_values() {
        let config = FreyjaConfig::default();
        assert_eq!(config.server.bind_address, "127.0.0.1:8080");
        assert_eq!(config.storage.fsync_interval_ms, 0);
        assert!(config.server.api_key.is_none());
        assert!(!config.system.enabled);
    }

    #[test]
    fn path_resolution() {
        let mut config = FreyjaConfig::default();
        config.resolve_paths("/home/user/project");

        assert_eq!(
            config.storage.data_dir,
            PathBuf::from("/home/user/project/.freyjadb/data")
        );
        assert_eq!(
            config.system.key_path,
            PathBuf::from("/home/user/project/.freyjadb/system.key")
        );
    }
}
