//! Error types for clipsift.
//!
//! Errors are split by blast radius: a [`ValidationError`] stops a run before
//! any background work exists, a [`PipelineError`] only costs the one image it
//! was raised for.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for clipsift operations.
#[derive(Error, Debug)]
pub enum ClipsiftError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A run could not be started
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Pipeline processing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Errors that abort a run before the worker is spawned.
///
/// These are the only errors a presenter ever sees through
/// `on_validation_error`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// The label text contained no non-blank labels
    #[error("No labels given: enter at least one label (comma separated)")]
    EmptyLabelSet,

    /// The minimum probability was not a number in [0, 100]
    #[error("Invalid minimum probability {input:?}: expected a percentage between 0 and 100")]
    InvalidThreshold { input: String },

    /// The target directory is missing, not a directory, or unreadable
    #[error("Cannot read directory {path:?}: {message}")]
    DirectoryUnavailable { path: PathBuf, message: String },

    /// The inference backend failed to load
    #[error("Inference backend unavailable: {message}")]
    BackendUnavailable { message: String },
}

impl ValidationError {
    /// Stable machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EmptyLabelSet => "empty_label_set",
            Self::InvalidThreshold { .. } => "invalid_threshold",
            Self::DirectoryUnavailable { .. } => "directory_unavailable",
            Self::BackendUnavailable { .. } => "backend_unavailable",
        }
    }
}

/// Per-image and model errors raised inside the pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Image decoding failed
    #[error("Decode error for {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// File exceeds size limit
    #[error("File too large: {path} ({size_mb}MB > {max_mb}MB)")]
    FileTooLarge {
        path: PathBuf,
        size_mb: u64,
        max_mb: u64,
    },

    /// Image dimensions exceed limit
    #[error("Image too large: {path} ({width}x{height} > {max_dim})")]
    ImageTooLarge {
        path: PathBuf,
        width: u32,
        height: u32,
        max_dim: u32,
    },

    /// Unsupported image format
    #[error("Unsupported format for {path}: {format}")]
    UnsupportedFormat { path: PathBuf, format: String },

    /// The backend failed on one image
    #[error("Inference failed for {path}: {message}")]
    Inference { path: PathBuf, message: String },

    /// Model files missing or unloadable
    #[error("Model error: {message}")]
    Model { message: String },
}

impl PipelineError {
    /// Whether the error came from reading or decoding the image file.
    pub fn is_decode_failure(&self) -> bool {
        matches!(
            self,
            Self::Decode { .. }
                | Self::FileTooLarge { .. }
                | Self::ImageTooLarge { .. }
                | Self::UnsupportedFormat { .. }
        )
    }
}

/// Convenience type alias for clipsift results.
pub type Result<T> = std::result::Result<T, ClipsiftError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_kinds_are_distinct() {
        let kinds = [
            ValidationError::EmptyLabelSet.kind(),
            ValidationError::InvalidThreshold {
                input: "x".into(),
            }
            .kind(),
            ValidationError::DirectoryUnavailable {
                path: PathBuf::from("/nope"),
                message: "missing".into(),
            }
            .kind(),
            ValidationError::BackendUnavailable {
                message: "no model".into(),
            }
            .kind(),
        ];
        let unique: std::collections::HashSet<_> = kinds.iter().collect();
        assert_eq!(unique.len(), 4);
    }

    #[test]
    fn test_decode_failure_classification() {
        let decode = PipelineError::Decode {
            path: PathBuf::from("a.jpg"),
            message: "truncated".into(),
        };
        let inference = PipelineError::Inference {
            path: PathBuf::from("a.jpg"),
            message: "shape".into(),
        };
        assert!(decode.is_decode_failure());
        assert!(!inference.is_decode_failure());
    }

    #[test]
    fn test_threshold_message_includes_input() {
        let err = ValidationError::InvalidThreshold {
            input: "150".into(),
        };
        assert!(err.to_string().contains("150"));
    }
}
