//! Configuration management for clipsift.
//!
//! Configuration is loaded from the platform config directory with sensible
//! defaults. Every section implements `Default`, so a partial file is fine.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for clipsift.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Default run parameters
    pub classify: ClassifyConfig,

    /// Discovery settings
    pub processing: ProcessingConfig,

    /// Resource limits
    pub limits: LimitsConfig,

    /// CLIP model settings
    pub model: ModelConfig,

    /// Gallery thumbnail settings
    pub thumbnail: ThumbnailConfig,

    /// Output settings
    pub output: OutputConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/com.clipsift.clipsift/config.toml
    /// - Linux: ~/.config/clipsift/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\clipsift\config\config.toml
    ///
    /// Falls back to ~/.clipsift/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "clipsift", "clipsift")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".clipsift").join("config.toml")
            })
    }

    /// Get the resolved model directory path (with ~ expansion).
    pub fn model_dir(&self) -> PathBuf {
        let path_str = self.general.model_dir.to_string_lossy();
        let expanded = shellexpand::tilde(&path_str);
        PathBuf::from(expanded.into_owned())
    }

    /// Directory holding the files of the configured CLIP model.
    pub fn model_path(&self) -> PathBuf {
        self.model_dir().join(&self.model.name)
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.classify.min_probability, 50.0);
        assert_eq!(config.thumbnail.size, 100);
        assert_eq!(config.model.image_size, 224);
        assert_eq!(config.limits.max_file_size_mb, 100);
    }

    #[test]
    fn test_config_to_toml() {
        let config = Config::default();
        let toml = config.to_toml().unwrap();
        assert!(toml.contains("[general]"));
        assert!(toml.contains("[classify]"));
        assert!(toml.contains("[model]"));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[classify]\nlabels = \"cat, dog\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.classify.labels, "cat, dog");
        assert_eq!(config.classify.min_probability, 50.0);
        assert_eq!(config.processing.supported_formats.len(), 5);
    }

    #[test]
    fn test_load_from_rejects_out_of_range_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[classify]\nmin_probability = 140.0\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("min_probability"));
    }

    #[test]
    fn test_model_path_joins_model_name() {
        let mut config = Config::default();
        config.general.model_dir = PathBuf::from("/opt/models");
        assert_eq!(
            config.model_path(),
            PathBuf::from("/opt/models/clip-vit-base-patch32")
        );
    }
}
