//! Sub-configuration structs and their defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory where models are stored
    pub model_dir: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("~/.clipsift/models"),
        }
    }
}

/// Default run parameters, used when a flag or prompt is left empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifyConfig {
    /// Comma-separated label text
    pub labels: String,

    /// Minimum probability of the top label, as a percentage (0-100)
    pub min_probability: f32,
}

impl Default for ClassifyConfig {
    fn default() -> Self {
        Self {
            labels: "dancers, singers, protesters".to_string(),
            min_probability: 50.0,
        }
    }
}

/// Discovery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// File extensions picked up from the target directory (case-insensitive)
    pub supported_formats: Vec<String>,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            supported_formats: vec![
                "png".to_string(),
                "jpg".to_string(),
                "jpeg".to_string(),
                "gif".to_string(),
                "bmp".to_string(),
            ],
        }
    }
}

/// Resource limits to protect against problematic inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum file size in megabytes
    pub max_file_size_mb: u64,

    /// Maximum image dimension (width or height)
    pub max_image_dimension: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 100,
            max_image_dimension: 10000,
        }
    }
}

/// Execution device for the ONNX sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    /// CUDA when compiled in, CPU otherwise
    #[default]
    Auto,
    /// Always CPU
    Cpu,
    /// CUDA; loading fails if it is not compiled in
    Cuda,
}

/// CLIP model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Model directory name under `general.model_dir`
    pub name: String,

    /// Square input resolution of the vision encoder
    pub image_size: u32,

    /// Multiplier applied to cosine similarities before softmax
    pub logit_scale: f32,

    /// Execution device
    pub device: Device,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: "clip-vit-base-patch32".to_string(),
            image_size: 224,
            logit_scale: 100.0,
            device: Device::Auto,
        }
    }
}

/// Gallery thumbnail settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThumbnailConfig {
    /// Whether to embed thumbnails in exported results
    pub enabled: bool,

    /// Thumbnail size in pixels (longest edge)
    pub size: u32,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            size: 100,
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default export format ("json", "jsonl" or "html")
    pub format: String,

    /// Pretty-print JSON output
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "json".to_string(),
            pretty: true,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
