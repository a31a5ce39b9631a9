//! Path utilities and XDG directory discovery.

use crate::ConfigError;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// XDG-compliant paths for FreyjaDB.
pub struct Paths {
    project_dirs: Option<ProjectDirs>,
}

impl Paths {
    /// Creates a new `Paths` instance with XDG discovery.
    pub fn new() -> Self {
        Self {
            project_dirs: ProjectDirs::from("com", "FreyjaDB", "freyjadb"),
        }
    }

    /// User config directory (`~/.config/freyjadb/`).
    pub fn user_config_dir(&self) -> Result<PathBuf, ConfigError> {
        self.project_dirs
            .as_ref()
            .map(|p| p.config_dir().to_path_buf())
            .ok_or_else(|| {
                ConfigError::XdgError("failed to determine user config directory".to_string())
            })
    }

    /// User cache directory (`~/.cache/freyjadb/`).
    pub fn user_cache_dir(&self) -> Result<PathBuf, ConfigError> {
        self.project_dirs
            .as_ref()
            .map(|p| p.cache_dir().to_path_buf())
            .ok_or_else(|| {
                ConfigError::XdgError("failed to determine user cache directory".to_string())
            })
    }

    /// User config file path (`~/.config/freyjadb/config.toml`).
    pub fn user_config_file(&self) -> Result<PathBuf, ConfigError> {
        Ok(self.user_config_dir()?.join("config.toml"))
    }

    /// Project config file path (`freyjadb.toml`).
    pub fn project_config_file(project_dir: impl AsRef<Path>) -> PathBuf {
        project_dir.as_ref().join("freyjadb.toml")
    }

    /// Local config file path (`freyjadb.local.toml`, gitignored).
    pub fn local_config_file(project_dir: impl AsRef<Path>) -> PathBuf {
        project_dir.as_ref().join("freyjadb.local.toml")
    }

    /// State directory (`.freyjadb/`) holding the active log and system file.
    pub fn state_dir(project_dir: impl AsRef<Path>) -> PathBuf {
        project_dir.as_ref().join(".freyjadb")
    }

    /// Whether a project has been initialized (has `freyjadb.toml`).
    pub fn is_initialized(project_dir: impl AsRef<Path>) -> bool {
        Self::project_config_file(project_dir).exists()
    }
}

impl Default for Paths {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn xdg_paths_mention_freyjadb() {
        let paths = Paths::new();

        if let Ok(config_dir) = paths.user_config_dir() {
            assert!(config_dir.to_string_lossy().contains("freyjadb"));
        }
        if let Ok(cache_dir) = paths.user_cache_dir() {
            assert!(cache_dir.to_string_lossy().contains("freyjadb"));
        }
    }

    #[test]
    fn project_paths() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let project_dir = temp_dir.path();

        let config_file = Paths::project_config_file(project_dir);
        assert_eq!(config_file, project_dir.join("freyjadb.toml"));

        let local_file = Paths::local_config_file(project_dir);
        assert_eq!(local_file, project_dir.join("freyjadb.local.toml"));

        let state_dir = Paths::state_dir(project_dir);
        assert_eq!(state_dir, project_dir.join(".freyjadb"));

        assert!(!Paths::is_initialized(project_dir));
        std::fs::write(&config_file, "[server]\nbind_address = \"x\"\n").unwrap();
        assert!(Paths::is_initialized(project_dir));
    }
}
