//! Configuration loader with multi-source merging.

use crate::{FreyjaConfig, Paths};
use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};

/// Configuration loader with builder pattern.
pub struct ConfigLoader {
    project_dir: PathBuf,
    env_prefix: String,
}

impl ConfigLoader {
    /// Creates a new loader rooted at the current working directory.
    pub fn new() -> Self {
        Self {
            project_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            env_prefix: "FREYJA".to_string(),
        }
    }

    /// Sets the project directory `freyjadb.toml`/`freyjadb.local.toml` are
    /// read from.
    pub fn with_project_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.project_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Sets the environment variable prefix (default: `FREYJA`).
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Loads configuration from every source, in ascending precedence:
    /// defaults, user config, project config, local config, environment.
    pub fn load(self) -> Result<FreyjaConfig> {
        let mut builder = config::Config::builder();

        let defaults = FreyjaConfig::default();
        builder = builder.add_source(config::Config::try_from(&defaults)?);

        let paths = Paths::new();
        if let Ok(user_config_file) = paths.user_config_file() {
            if user_config_file.exists() {
                builder = builder.add_source(
                    config::File::from(user_config_file)
                        .required(false)
                        .format(config::FileFormat::Toml),
                );
            }
        }

        let project_config_file = Paths::project_config_file(&self.project_dir);
        if project_config_file.exists() {
            builder = builder.add_source(
                config::File::from(project_config_file)
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        let local_config_file = Paths::local_config_file(&self.project_dir);
        if local_config_file.exists() {
            builder = builder.add_source(
                config::File::from(local_config_file)
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        builder = builder.add_source(
            config::Environment::with_prefix(&self.env_prefix)
                .separator("_")
                .try_parsing(true),
        );

        let built = builder.build().context("failed to build configuration")?;

        let mut freyja_config: FreyjaConfig = built
            .try_deserialize()
            .context("failed to deserialize configuration")?;

        freyja_config.resolve_paths(&self.project_dir);

        Ok(freyja_config)
    }

    /// Loads configuration, falling back to defaults on any error.
    pub fn load_or_default(self) -> FreyjaConfig {
        self.load().unwrap_or_default()
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn load_defaults() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let config = ConfigLoader::new()
            .with_project_dir(temp_dir.path())
            .load()
            .expect("failed to load config");

        assert_eq!(config.server.bind_address, "127.0.0.1:8080");
        assert_eq!(config.storage.max_record_size, 64 * 1024 * 1024);
    }

    #[test]
    fn project_config_overrides_defaults() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let project_dir = temp_dir.path();

        let config_content = r#"
[storage]
fsync_interval_ms = 500

[server]
bind_address = "0.0.0.0:3000"
"#;
        fs::write(project_dir.join("freyjadb.toml"), config_content)
            .expect("failed to write config");

        let config = ConfigLoader::new()
            .with_project_dir(project_dir)
            .load()
            .expect("failed to load config");

        assert_eq!(config.server.bind_address, "0.0.0.0:3000");
        assert_eq!(config.storage.fsync_interval_ms, 500);
    }

    #[test]
    fn local_overrides_project() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let project_dir = temp_dir.path();

        fs::write(
            project_dir.join("freyjadb.toml"),
            "[server]\nbind_address = \"127.0.0.1:8080\"\n",
        )
        .expect("failed to write project config");

        fs::write(
            project_dir.join("freyjadb.local.toml"),
            "[server]\nbind_address = \"localhost:9999\"\n",
        )
        .expect("failed to write local config");

        let config = ConfigLoader::new()
            .with_project_dir(project_dir)
            .load()
            .expect("failed to load config");

        assert_eq!(config.server.bind_address, "localhost:9999");
    }

    #[test]
    fn malformed_toml_is_an_error() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let project_dir = temp_dir.path();

        fs::write(project_dir.join("freyjadb.toml"), "not valid toml {{{")
            .expect("failed to write config");

        let result = ConfigLoader::new().with_project_dir(project_dir).load();
        assert!(result.is_err());
    }

    #[test]
    fn path_resolution_is_absolute() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let project_dir = temp_dir.path();

        let config = ConfigLoader::new()
            .with_project_dir(project_dir)
            .load()
            .expect("failed to load config");

        assert!(config.storage.data_dir.is_absolute());
        assert!(config.system.key_path.is_absolute());
    }
}
