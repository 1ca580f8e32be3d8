//! Configuration file loading.
//!
//! Settings come from `varchess.toml` in the working directory. A missing
//! file yields the defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur when loading or parsing configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse the configuration file as valid TOML.
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    /// A value is out of range.
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Engine settings.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Setup used for new games. Defaults to "classic".
    #[serde(default = "default_setup")]
    pub default_setup: String,
    /// Whether new games use the atomic capture rule.
    #[serde(default)]
    pub atomic: bool,
    /// Strength level of White in new games (0 is human).
    #[serde(default)]
    pub white_level: u32,
    /// Strength level of Black in new games. Defaults to 3.
    #[serde(default = "default_black_level")]
    pub black_level: u32,
    /// Extra directory of variant definitions.
    #[serde(default)]
    pub variants_dir: Option<PathBuf>,
    /// Deepest search any level may use. Defaults to 5.
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,
}

fn default_setup() -> String {
    "classic".to_string()
}

fn default_black_level() -> u32 {
    3
}

fn default_max_depth() -> u32 {
    5
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            default_setup: default_setup(),
            atomic: false,
            white_level: 0,
            black_level: default_black_level(),
            variants_dir: None,
            max_depth: default_max_depth(),
        }
    }
}

impl EngineConfig {
    /// Loads the configuration from [`Self::config_path()`].
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Loads the configuration from `path`, or the defaults if the file does
    /// not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Self::parse(&content)
        } else {
            Ok(Self::default())
        }
    }

    /// Parses and validates a configuration document.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(content)?;
        if config.max_depth == 0 {
            return Err(ConfigError::Invalid("max_depth must be at least 1".into()));
        }
        Ok(config)
    }

    /// Returns the path to the configuration file.
    pub fn config_path() -> PathBuf {
        PathBuf::from("varchess.toml")
    }

    /// Search depth for a strength level, `None` for a human player.
    pub fn depth_for_level(&self, level: u32) -> Option<u32> {
        (level > 0).then(|| level.min(self.max_depth))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_a_fresh_game() {
        let config = EngineConfig::default();
        assert_eq!(config.default_setup, "classic");
        assert!(!config.atomic);
        assert_eq!(config.white_level, 0);
        assert_eq!(config.black_level, 3);
        assert_eq!(config.max_depth, 5);
        assert_eq!(EngineConfig::parse("").unwrap(), config);
    }

    #[test]
    fn parses_all_fields() {
        let config = EngineConfig::parse(
            r#"
default_setup = "gardner"
atomic = true
white_level = 2
black_level = 4
variants_dir = "variants"
max_depth = 3
"#,
        )
        .unwrap();
        assert_eq!(config.default_setup, "gardner");
        assert!(config.atomic);
        assert_eq!(config.white_level, 2);
        assert_eq!(config.variants_dir, Some(PathBuf::from("variants")));
        assert_eq!(config.depth_for_level(4), Some(3));
    }

    #[test]
    fn rejects_bad_documents() {
        assert!(matches!(
            EngineConfig::parse("colour = \"blue\""),
            Err(ConfigError::ParseError(_))
        ));
        assert!(matches!(
            EngineConfig::parse("max_depth = 0"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn levels_map_to_depths() {
        let config = EngineConfig::default();
        assert_eq!(config.depth_for_level(0), None);
        assert_eq!(config.depth_for_level(1), Some(1));
        assert_eq!(config.depth_for_level(5), Some(5));
        assert_eq!(config.depth_for_level(9), Some(5));
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::load_from(&dir.path().join("varchess.toml")).unwrap();
        assert_eq!(config, EngineConfig::default());

        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "black_level = 1\n").unwrap();
        assert_eq!(EngineConfig::load_from(&path).unwrap().black_level, 1);
    }
}
