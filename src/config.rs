use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tokio::fs;

/// Default config file name, looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = "vmfleet.yaml";

/// Default workspace directory holding data and logs.
pub const DEFAULT_WORKSPACE: &str = ".vmfleet";

// ============================================================================
// Config (root)
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub journal: JournalConfig,
    #[serde(default)]
    pub shell: ShellConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Yaml(#[from] serde_saphyr::Error),
}

impl Config {
    /// Load the config file; a missing file yields the defaults.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = match fs::read_to_string(path).await {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(ConfigError::Io(e)),
        };
        Ok(serde_saphyr::from_str(&contents)?)
    }
}

// ============================================================================
// StorageConfig
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StorageConfig {
    /// Primary instances document.
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
    /// Explicit backup path; defaults to a `_backup` sibling of `path`.
    #[serde(default)]
    pub backup_path: Option<PathBuf>,
    /// Treat a missing data file as an empty collection instead of an error.
    #[serde(default)]
    pub missing_as_empty: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
            backup_path: None,
            missing_as_empty: false,
        }
    }
}

impl StorageConfig {
    /// Resolved backup path: the explicit setting, or `<stem>_backup.<ext>`
    /// next to the primary document.
    pub fn backup_path(&self) -> PathBuf {
        if let Some(path) = &self.backup_path {
            return path.clone();
        }
        let stem = self
            .path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("instances");
        let name = match self.path.extension().and_then(|e| e.to_str()) {
            Some(ext) => format!("{stem}_backup.{ext}"),
            None => format!("{stem}_backup"),
        };
        self.path.with_file_name(name)
    }
}

fn default_storage_path() -> PathBuf {
    PathBuf::from(".vmfleet/instances.json")
}

// ============================================================================
// JournalConfig
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct JournalConfig {
    #[serde(default = "default_journal_path")]
    pub path: PathBuf,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            path: default_journal_path(),
        }
    }
}

fn default_journal_path() -> PathBuf {
    PathBuf::from(".vmfleet/logs/app.log")
}

// ============================================================================
// ShellConfig
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct ShellConfig {
    /// Pause between interactive steps, for feel. Zero disables it.
    #[serde(default)]
    pub step_delay_ms: u64,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[tokio::test]
    async fn default_config() {
        let config = Config::default();
        assert_eq!(config.storage.path, PathBuf::from(".vmfleet/instances.json"));
        assert_eq!(
            config.storage.backup_path(),
            PathBuf::from(".vmfleet/instances_backup.json")
        );
        assert!(!config.storage.missing_as_empty);
        assert_eq!(config.journal.path, PathBuf::from(".vmfleet/logs/app.log"));
        assert_eq!(config.shell.step_delay_ms, 0);
    }

    #[tokio::test]
    async fn load_missing_file_returns_defaults() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("missing.yaml");
        let config = Config::load(&missing).await.unwrap();
        assert_eq!(config.storage.path, PathBuf::from(".vmfleet/instances.json"));
    }

    #[tokio::test]
    async fn load_valid_yaml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
storage:
  path: data/machines.json
  backup_path: data/machines.bak
  missing_as_empty: true
journal:
  path: data/activity.log
shell:
  step_delay_ms: 250
"#
        )
        .unwrap();

        let config = Config::load(file.path()).await.unwrap();
        assert_eq!(config.storage.path, PathBuf::from("data/machines.json"));
        assert_eq!(config.storage.backup_path(), PathBuf::from("data/machines.bak"));
        assert!(config.storage.missing_as_empty);
        assert_eq!(config.journal.path, PathBuf::from("data/activity.log"));
        assert_eq!(config.shell.step_delay_ms, 250);
    }

    #[tokio::test]
    async fn load_partial_yaml_uses_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
storage:
  path: elsewhere.json
"#
        )
        .unwrap();

        let config = Config::load(file.path()).await.unwrap();
        assert_eq!(config.storage.path, PathBuf::from("elsewhere.json"));
        assert_eq!(
            config.storage.backup_path(),
            PathBuf::from("elsewhere_backup.json")
        );
        assert_eq!(config.journal.path, PathBuf::from(".vmfleet/logs/app.log"));
    }

    #[tokio::test]
    async fn load_invalid_yaml_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "storage: [not: a: mapping").unwrap();

        assert!(Config::load(file.path()).await.is_err());
    }

    #[test]
    fn backup_path_without_extension() {
        let storage = StorageConfig {
            path: PathBuf::from("data/machines"),
            backup_path: None,
            missing_as_empty: false,
        };
        assert_eq!(storage.backup_path(), PathBuf::from("data/machines_backup"));
    }
}
