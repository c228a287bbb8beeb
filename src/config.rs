//! Configuration management for gcode-reorder

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

/// Default suffix appended to the file name of the backup copy
pub const DEFAULT_BACKUP_SUFFIX: &str = ".backup";

/// Environment variable pointing at a configuration file
pub const CONFIG_ENV_VAR: &str = "GCODE_REORDER_CONFIG";

/// Tool configuration
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Backup configuration
    pub backup: BackupConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Backup configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct BackupConfig {
    /// Write a copy of the original file before overwriting it
    pub enabled: bool,
    /// Suffix appended to the file name of the copy
    pub suffix: String,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            suffix: DEFAULT_BACKUP_SUFFIX.to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is not set
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        toml::from_str(content).context("invalid configuration")
    }

    /// Read and parse a configuration file
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("in {}", path.display()))
    }

    /// Resolve which configuration file applies, if any.
    ///
    /// An explicit path wins, then [`CONFIG_ENV_VAR`], then
    /// `<config dir>/gcode-reorder/config.toml` when that file exists.
    pub fn locate(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }
        if let Some(path) = std::env::var_os(CONFIG_ENV_VAR).filter(|p| !p.is_empty()) {
            return Some(PathBuf::from(path));
        }
        dirs::config_dir()
            .map(|dir| dir.join("gcode-reorder").join("config.toml"))
            .filter(|path| path.is_file())
    }

    /// Replace settings that cannot be honoured with their defaults.
    ///
    /// Returns one message per replaced setting.
    pub fn sanitize(&mut self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.backup.suffix.is_empty() {
            warnings.push(format!(
                "backup.suffix is empty, which would overwrite the file itself; using \"{DEFAULT_BACKUP_SUFFIX}\""
            ));
            self.backup.suffix = DEFAULT_BACKUP_SUFFIX.to_string();
        }
        warnings
    }

    /// Load the configuration, falling back to defaults when the file is
    /// missing or malformed.
    ///
    /// Returns the configuration together with warnings about rejected
    /// files or settings, so the caller can report them once logging is up.
    pub fn load(explicit: Option<&Path>) -> (Self, Vec<String>) {
        let Some(path) = Self::locate(explicit) else {
            return (Self::default(), Vec::new());
        };
        match Self::from_file(&path) {
            Ok(mut config) => {
                let warnings = config.sanitize();
                (config, warnings)
            }
            Err(e) => (
                Self::default(),
                vec![format!("ignoring configuration, using defaults: {e:#}")],
            ),
        }
    }
}
