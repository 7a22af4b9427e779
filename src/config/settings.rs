use std::{
    fs,
    path::{Path, PathBuf}
};

use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::adapter::{history::DEFAULT_HISTORY_CAPACITY, pool::DEFAULT_WORKER_POOL_SIZE};

pub const DEFAULT_LOG_FILTER: &str = "info";

/// Engine settings read from `config.yaml`
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Capacity of the undo/redo ledger
    pub history_capacity: usize,
    /// Concurrent bodies the invoker's worker pool runs
    pub worker_pool_size: usize,
    /// `tracing` filter used when `RUST_LOG` is unset
    pub log_filter:       String
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            worker_pool_size: DEFAULT_WORKER_POOL_SIZE,
            log_filter:       DEFAULT_LOG_FILTER.to_string()
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.history_capacity == 0 {
            bail!("history_capacity must be greater than zero");
        }
        if self.worker_pool_size == 0 {
            bail!("worker_pool_size must be greater than zero");
        }
        if self.log_filter.trim().is_empty() {
            bail!("log_filter must not be blank");
        }
        Ok(())
    }
}

/// Get the project directories for cross-platform config path resolution
pub fn get_project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("", "", "command-engine").context("Failed to determine project directories")
}

/// Get the configuration directory path
pub fn get_config_dir() -> Result<PathBuf> {
    let project_dirs = get_project_dirs()?;
    Ok(project_dirs.config_dir().to_path_buf())
}

/// Get the config file path
pub fn get_config_file_path() -> Result<PathBuf> {
    let config_dir = get_config_dir()?;
    Ok(config_dir.join("config.yaml"))
}

/// Load configuration from the platform config directory, defaults when no file exists
pub fn load_config() -> Result<EngineConfig> {
    load_config_from(&get_config_file_path()?)
}

/// Load configuration from an explicit path, defaults when the file does not exist
pub fn load_config_from(config_path: &Path) -> Result<EngineConfig> {
    if !config_path.exists() {
        return Ok(EngineConfig::default());
    }

    let content = fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
    let config: EngineConfig = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

    config.validate().with_context(|| format!("Invalid config file: {}", config_path.display()))?;
    Ok(config)
}

/// Save configuration to an explicit path, creating parent directories
pub fn save_config_to(config: &EngineConfig, config_path: &Path) -> Result<()> {
    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
    }

    let content = serde_yaml::to_string(config).context("Failed to serialize config")?;
    fs::write(config_path, content)
        .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

    Ok(())
}

/// Write the default configuration unless a file is already there; returns the file path
pub fn init_config() -> Result<PathBuf> {
    let config_path = get_config_file_path()?;
    if !config_path.exists() {
        save_config_to(&EngineConfig::default(), &config_path)?;
    }
    Ok(config_path)
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();

        let config = load_config_from(&dir.path().join("config.yaml")).unwrap();

        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.history_capacity, 100);
        assert_eq!(config.worker_pool_size, 5);
    }

    #[test]
    fn test_partial_file_keeps_remaining_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "worker_pool_size: 2\n").unwrap();

        let config = load_config_from(&path).unwrap();

        assert_eq!(config.worker_pool_size, 2);
        assert_eq!(config.history_capacity, DEFAULT_HISTORY_CAPACITY);
        assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
    }

    #[test]
    fn test_zero_capacity_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "history_capacity: 0\n").unwrap();

        let error = load_config_from(&path).unwrap_err();

        assert!(format!("{:#}", error).contains("history_capacity"));
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.yaml");
        let config = EngineConfig { history_capacity: 7, worker_pool_size: 3, log_filter: "debug".to_string() };

        save_config_to(&config, &path).unwrap();

        assert_eq!(load_config_from(&path).unwrap(), config);
    }
}
