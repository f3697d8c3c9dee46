//! Configuration loading and management
//!
//! Handles parsing of `.kanban.toml` configuration files.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::lock::DEFAULT_LOCK_TIMEOUT_MS;
use crate::storage::{DATA_DIR, TASKS_FILE};

/// Configuration file name looked up in the working directory
pub const CONFIG_FILE: &str = ".kanban.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// View history configuration
    #[serde(default)]
    pub history: HistoryConfig,

    /// Persistence configuration
    #[serde(default)]
    pub storage: StorageConfig,
}

/// View history configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Maximum number of entries kept; unbounded when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,

    /// Replace a viewed entry's snapshot when the entity is updated
    #[serde(default)]
    pub refresh_on_update: bool,
}

/// Persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Task file, relative to the working directory unless absolute
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,

    /// How long to wait for the task file lock
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

fn default_storage_path() -> PathBuf {
    Path::new(DATA_DIR).join(TASKS_FILE)
}

fn default_lock_timeout_ms() -> u64 {
    DEFAULT_LOCK_TIMEOUT_MS
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

impl Config {
    /// Load configuration from a `.kanban.toml` file
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `.kanban.toml` from `dir`, or return defaults when it is missing
    pub fn load_from_dir(dir: &Path) -> crate::error::Result<Self> {
        let config_path = dir.join(CONFIG_FILE);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> crate::error::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Task file location resolved against `base_dir`
    pub fn storage_path(&self, base_dir: &Path) -> PathBuf {
        if self.storage.path.is_absolute() {
            self.storage.path.clone()
        } else {
            base_dir.join(&self.storage.path)
        }
    }

    fn validate(&self) -> crate::error::Result<()> {
        self.history.validate()?;
        self.storage.validate()?;
        Ok(())
    }
}

impl HistoryConfig {
    fn validate(&self) -> crate::error::Result<()> {
        if self.limit == Some(0) {
            return Err(crate::error::Error::InvalidConfig(
                "history.limit must be >= 1 (omit it for an unbounded history)".to_string(),
            ));
        }
        Ok(())
    }
}

impl StorageConfig {
    fn validate(&self) -> crate::error::Result<()> {
        if self.path.as_os_str().is_empty() {
            return Err(crate::error::Error::InvalidConfig(
                "storage.path cannot be empty".to_string(),
            ));
        }
        if self.lock_timeout_ms == 0 {
            return Err(crate::error::Error::InvalidConfig(
                "storage.lock_timeout_ms must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn defaults_are_expected() {
        let cfg = Config::default();
        assert_eq!(cfg.history.limit, None);
        assert!(!cfg.history.refresh_on_update);
        assert_eq!(cfg.storage.path, PathBuf::from(".kanban/tasks.jsonl"));
        assert_eq!(cfg.storage.lock_timeout_ms, 5000);
    }

    #[test]
    fn load_parses_overrides() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        let content = r#"
[history]
limit = 10
refresh_on_update = true

[storage]
path = "board.jsonl"
lock_timeout_ms = 250
"#;
        fs::write(&path, content.trim()).expect("write config");

        let cfg = Config::load(&path).expect("load config");
        assert_eq!(cfg.history.limit, Some(10));
        assert!(cfg.history.refresh_on_update);
        assert_eq!(cfg.storage.path, PathBuf::from("board.jsonl"));
        assert_eq!(cfg.storage.lock_timeout_ms, 250);
        assert_eq!(cfg.storage_path(dir.path()), dir.path().join("board.jsonl"));
    }

    #[test]
    fn zero_history_limit_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "[history]\nlimit = 0\n").expect("write config");

        let err = Config::load(&path).expect_err("invalid config");
        match err {
            crate::error::Error::InvalidConfig(_) => {}
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn load_from_dir_defaults_when_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = Config::load_from_dir(dir.path()).expect("defaults");
        assert_eq!(cfg.storage.lock_timeout_ms, 5000);
    }

    #[test]
    fn load_from_dir_surfaces_parse_errors() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join(CONFIG_FILE), "[history\n").expect("write config");

        let err = Config::load_from_dir(dir.path()).expect_err("parse error");
        assert!(matches!(err, crate::error::Error::TomlParse(_)));
    }

    #[test]
    fn absolute_storage_path_is_kept() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut cfg = Config::default();
        cfg.storage.path = dir.path().join("abs.jsonl");
        assert_eq!(cfg.storage_path(Path::new("/elsewhere")), dir.path().join("abs.jsonl"));
    }

    #[test]
    fn save_writes_toml() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.toml");
        let cfg = Config::default();
        cfg.save(&path).expect("save config");

        let written = fs::read_to_string(&path).expect("read config");
        assert!(written.contains("lock_timeout_ms = 5000"));
        assert!(written.contains("refresh_on_update = false"));
    }
}
