//! Configuration module
//!
//! Handles loading and saving the waylayout configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::{Screenshooter, WlrRandrBackend};
use crate::layout::SNAP_DISTANCE;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Config file not found: {0}")]
    NotFound(PathBuf),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// External tool settings
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Layout editing settings
    #[serde(default)]
    pub layout: LayoutConfig,
}

/// External tool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Display configuration command
    #[serde(default = "default_wlr_randr")]
    pub wlr_randr: String,
    /// Screenshot command used for previews
    #[serde(default = "default_grim")]
    pub grim: String,
    /// Subprocess timeout in ms
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_wlr_randr() -> String {
    WlrRandrBackend::PROGRAM.to_string()
}

fn default_grim() -> String {
    Screenshooter::PROGRAM.to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            wlr_randr: default_wlr_randr(),
            grim: default_grim(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// Layout editing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Snap threshold in canvas units
    #[serde(default = "default_snap_distance")]
    pub snap_distance: i32,
}

fn default_snap_distance() -> i32 {
    SNAP_DISTANCE
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            snap_distance: default_snap_distance(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from the default location
    pub fn load_default() -> ConfigResult<Self> {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("waylayout/config.toml")),
            Some(PathBuf::from("./waylayout.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                return Self::load(path);
            }
        }

        Ok(Self::default())
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let contents = toml::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.tools.timeout_ms)
    }

    /// Randr backend configured from this file
    pub fn randr_backend(&self) -> WlrRandrBackend {
        WlrRandrBackend::new(self.tools.wlr_randr.clone(), self.command_timeout())
    }

    /// Screenshot tool configured from this file
    pub fn screenshooter(&self) -> Screenshooter {
        Screenshooter::new(self.tools.grim.clone(), self.command_timeout())
    }
}

/// Generate a sample configuration file
pub fn generate_sample_config() -> String {
    toml::to_string_pretty(&Config::default()).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.tools.wlr_randr, "wlr-randr");
        assert_eq!(config.layout.snap_distance, SNAP_DISTANCE);
    }

    #[test]
    fn test_save_and_load() {
        let config = Config {
            layout: LayoutConfig { snap_distance: 25 },
            ..Default::default()
        };
        let file = NamedTempFile::new().unwrap();

        config.save(file.path()).unwrap();

        let loaded = Config::load(file.path()).unwrap();
        assert_eq!(loaded.layout.snap_distance, 25);
        assert_eq!(loaded.tools.grim, config.tools.grim);
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let err = Config::load(Path::new("/nonexistent/waylayout.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_sample_config_round_trips() {
        let sample = generate_sample_config();
        let parsed: Config = toml::from_str(&sample).unwrap();
        assert_eq!(parsed.tools.timeout_ms, default_timeout_ms());
    }
}
