//! Application settings loaded from a TOML file.
//!
//! ```toml
//! [logging]
//! enabled = true
//! level = "info"
//! max-files = 3
//! directory = "logs"
//!
//! [navigation]
//! max-depth = 0
//! ```
//!
//! Every field has a default, so a partial file (or no file at all) is valid.

use crate::helpers::{load_toml, save_toml};
use anyhow::Error;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const SETTINGS_FILE: &str = "Settings.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LoggingSettings {
    pub enabled: bool,
    pub level: String,
    /// Number of run logs kept in `directory` (0 keeps all of them).
    pub max_files: usize,
    pub directory: PathBuf,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            enabled: true,
            level: "info".to_string(),
            max_files: 3,
            directory: PathBuf::from("logs"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct NavigationSettings {
    /// Maximum number of contexts on the stack; 0 means unlimited.
    pub max_depth: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Settings {
    pub logging: LoggingSettings,
    pub navigation: NavigationSettings,
}

impl Settings {
    /// Loads settings from `path`, falling back to defaults.
    ///
    /// Never fails: a missing file is silently replaced by defaults and an
    /// unreadable one is reported on stderr. Logging is configured from the
    /// result of this call, so diagnostics here can't go through `tracing`.
    pub fn load<P: AsRef<Path>>(path: P) -> Settings {
        let path = path.as_ref();
        if !path.exists() {
            return Settings::default();
        }

        match load_toml::<Settings, _>(path) {
            Ok(settings) => settings,
            Err(e) => {
                eprintln!(
                    "failed to load settings file {}: {:#}; using defaults",
                    path.display(),
                    e
                );
                Settings::default()
            }
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        save_toml(self, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_loads_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let settings = Settings::load(temp_dir.path().join(SETTINGS_FILE));

        assert_eq!(settings, Settings::default());
        assert_eq!(settings.navigation.max_depth, 0);
        assert_eq!(settings.logging.level, "info");
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(SETTINGS_FILE);
        fs::write(&path, "[navigation]\nmax-depth = 12\n").unwrap();

        let settings = Settings::load(&path);

        assert_eq!(settings.navigation.max_depth, 12);
        assert_eq!(settings.logging, LoggingSettings::default());
    }

    #[test]
    fn test_kebab_case_logging_keys() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(SETTINGS_FILE);
        fs::write(
            &path,
            "[logging]\nenabled = false\nlevel = \"debug\"\nmax-files = 7\ndirectory = \"var/log\"\n",
        )
        .unwrap();

        let logging = Settings::load(&path).logging;

        assert!(!logging.enabled);
        assert_eq!(logging.level, "debug");
        assert_eq!(logging.max_files, 7);
        assert_eq!(logging.directory, PathBuf::from("var/log"));
    }

    #[test]
    fn test_malformed_file_falls_back_to_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(SETTINGS_FILE);
        fs::write(&path, "[navigation\nmax-depth = ").unwrap();

        assert_eq!(Settings::load(&path), Settings::default());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join(SETTINGS_FILE);
        let settings = Settings {
            navigation: NavigationSettings { max_depth: 5 },
            ..Settings::default()
        };

        settings.save(&path).unwrap();

        assert!(path.exists());
        assert_eq!(Settings::load(&path), settings);
    }
}
