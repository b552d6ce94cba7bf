// SPDX-License-Identifier: GPL-3.0-only

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

const APP_DIR: &str = "cosmic-ext-ejecter";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {}", path.display())]
    Missing { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for {name}: {value:?}")]
    Env { name: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LoggingLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LoggingLevel {
    pub fn as_directive(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct NotificationConfig {
    pub app_name: String,
    /// Milliseconds; -1 leaves it to the notification server.
    pub expire_timeout_ms: i32,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            app_name: "Ejecter".to_string(),
            expire_timeout_ms: -1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Hide the panel icon while no drive can be ejected.
    pub autohide: bool,
    pub log_level: LoggingLevel,
    pub log_to_disk: bool,
    pub notifications: NotificationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            autohide: true,
            log_level: LoggingLevel::default(),
            log_to_disk: true,
            notifications: NotificationConfig::default(),
        }
    }
}

impl Config {
    pub fn default_path() -> PathBuf {
        if let Some(xdg_config) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg_config).join(APP_DIR).join("config.toml");
        }

        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join(".config")
                .join(APP_DIR)
                .join("config.toml");
        }

        PathBuf::from("/etc").join(APP_DIR).join("config.toml")
    }

    /// Load configuration.
    ///
    /// An explicit path must exist. The default path may be absent, in which
    /// case defaults apply. Environment overrides are applied last.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);

        let mut config = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| ConfigError::Io {
                path: path_buf.clone(),
                source,
            })?;
            Self::parse(&raw).map_err(|source| ConfigError::Parse {
                path: path_buf.clone(),
                source,
            })?
        } else if path.is_some() {
            return Err(ConfigError::Missing { path: path_buf });
        } else {
            Self::default()
        };

        config.apply_env_overrides(std::env::var("EJECTER_AUTOHIDE").ok().as_deref())?;
        Ok(config)
    }

    pub fn parse(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    fn apply_env_overrides(&mut self, autohide: Option<&str>) -> Result<(), ConfigError> {
        if let Some(value) = autohide {
            self.autohide = parse_bool(value).ok_or_else(|| ConfigError::Env {
                name: "EJECTER_AUTOHIDE",
                value: value.to_string(),
            })?;
        }
        Ok(())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_file_yields_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config, Config::default());
        assert!(config.autohide);
        assert_eq!(config.notifications.expire_timeout_ms, -1);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = Config::parse(
            r#"
            autohide = false
            log_level = "debug"

            [notifications]
            app_name = "Drives"
            "#,
        )
        .unwrap();

        assert!(!config.autohide);
        assert_eq!(config.log_level, LoggingLevel::Debug);
        assert!(config.log_to_disk);
        assert_eq!(config.notifications.app_name, "Drives");
        assert_eq!(config.notifications.expire_timeout_ms, -1);
    }

    #[test]
    fn unknown_log_level_is_rejected() {
        assert!(Config::parse("log_level = \"loud\"").is_err());
    }

    #[test]
    fn load_reads_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "log_to_disk = false").unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert!(!config.log_to_disk);
    }

    #[test]
    fn load_returns_error_for_explicit_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load(Some(&dir.path().join("missing.toml")));
        assert!(matches!(result, Err(ConfigError::Missing { .. })));
    }

    #[test]
    fn autohide_env_override() {
        let mut config = Config::default();
        config.apply_env_overrides(Some("0")).unwrap();
        assert!(!config.autohide);

        config.apply_env_overrides(None).unwrap();
        assert!(!config.autohide);

        assert!(config.apply_env_overrides(Some("sometimes")).is_err());
    }
}
