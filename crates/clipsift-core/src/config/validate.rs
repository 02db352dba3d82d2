//! Configuration validation with range checks.

use crate::error::ConfigError;
use crate::output::OutputFormat;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=100.0).contains(&self.classify.min_probability) {
            return Err(ConfigError::ValidationError(
                "classify.min_probability must be between 0 and 100".into(),
            ));
        }
        if self.processing.supported_formats.is_empty() {
            return Err(ConfigError::ValidationError(
                "processing.supported_formats must not be empty".into(),
            ));
        }
        if self.limits.max_file_size_mb == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_file_size_mb must be > 0".into(),
            ));
        }
        if self.limits.max_image_dimension == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_image_dimension must be > 0".into(),
            ));
        }
        if self.model.image_size == 0 {
            return Err(ConfigError::ValidationError(
                "model.image_size must be > 0".into(),
            ));
        }
        if !(self.model.logit_scale.is_finite() && self.model.logit_scale > 0.0) {
            return Err(ConfigError::ValidationError(
                "model.logit_scale must be a positive number".into(),
            ));
        }
        if self.thumbnail.size == 0 {
            return Err(ConfigError::ValidationError(
                "thumbnail.size must be > 0".into(),
            ));
        }
        if OutputFormat::parse(&self.output.format).is_none() {
            return Err(ConfigError::ValidationError(format!(
                "output.format must be json, jsonl or html (got {:?})",
                self.output.format
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_passes_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_invalid_min_probability() {
        let mut config = Config::default();
        config.classify.min_probability = 100.5;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("min_probability"));

        config.classify.min_probability = -1.0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("min_probability"));
    }

    #[test]
    fn test_validate_rejects_empty_formats() {
        let mut config = Config::default();
        config.processing.supported_formats.clear();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("supported_formats"));
    }

    #[test]
    fn test_validate_rejects_zero_thumbnail_size() {
        let mut config = Config::default();
        config.thumbnail.size = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("thumbnail.size"));
    }

    #[test]
    fn test_validate_rejects_non_positive_logit_scale() {
        let mut config = Config::default();
        config.model.logit_scale = 0.0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("logit_scale"));
    }

    #[test]
    fn test_validate_rejects_unknown_output_format() {
        let mut config = Config::default();
        config.output.format = "xml".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("output.format"));
    }
}
