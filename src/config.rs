//! Data directory resolution and optional `config.toml` settings.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::db::DEFAULT_STORAGE_KEY;
use crate::error::{BoardError, Result};
use crate::fields::Priority;

/// Directory under the home directory used when none is given.
pub const DEFAULT_DIR_NAME: &str = ".taskboard";
pub const CONFIG_FILE: &str = "config.toml";

/// User settings read from `<data_dir>/config.toml`. Every key is optional.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Storage key under which the project list is persisted.
    pub storage_key: String,
    /// Seconds between elapsed-time refreshes on the board view.
    pub refresh_interval_secs: u64,
    /// Priority preselected when the task editor opens.
    pub default_priority: Priority,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            refresh_interval_secs: 10,
            default_priority: Priority::Low,
        }
    }
}

impl Settings {
    /// Load settings from `dir`, using defaults when the file does not exist.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        match fs::read_to_string(&path) {
            Ok(text) => Ok(toml::from_str(&text)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Settings::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }
}

/// Pick the data directory: explicit path first, then `~/.taskboard`.
/// The directory is created if missing.
pub fn resolve_data_dir(explicit: Option<&Path>) -> Result<PathBuf> {
    let dir = match explicit {
        Some(p) => p.to_path_buf(),
        None => dirs::home_dir()
            .ok_or(BoardError::NoDataDir)?
            .join(DEFAULT_DIR_NAME),
    };
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_config_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let settings = Settings::load(tmp.path()).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.refresh_interval(), Duration::from_secs(10));
    }

    #[test]
    fn test_partial_config_overrides_given_keys() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILE),
            "refresh_interval_secs = 3\ndefault_priority = \"high\"\n",
        )
        .unwrap();
        let settings = Settings::load(tmp.path()).unwrap();
        assert_eq!(settings.refresh_interval_secs, 3);
        assert_eq!(settings.default_priority, Priority::High);
        assert_eq!(settings.storage_key, "projects");
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE), "refresh_interval_secs = \"soon\"").unwrap();
        assert!(matches!(Settings::load(tmp.path()), Err(BoardError::ConfigParse(_))));
    }

    #[test]
    fn test_explicit_data_dir_is_created() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("boards");
        assert_eq!(resolve_data_dir(Some(&dir)).unwrap(), dir);
        assert!(dir.is_dir());
    }
}
