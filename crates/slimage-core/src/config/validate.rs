//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    ///
    /// Called on every loaded file; callers that apply overrides afterwards
    /// should call it again.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.transcode.max_width == 0 {
            return Err(ConfigError::ValidationError(
                "transcode.max_width must be > 0".into(),
            ));
        }
        if self.transcode.quality > 100 {
            return Err(ConfigError::ValidationError(
                "transcode.quality must be between 0 and 100".into(),
            ));
        }
        if self.pipeline.batch_size == 0 {
            return Err(ConfigError::ValidationError(
                "pipeline.batch_size must be > 0".into(),
            ));
        }
        if self.pipeline.parallel_workers == 0 {
            return Err(ConfigError::ValidationError(
                "pipeline.parallel_workers must be > 0".into(),
            ));
        }
        if self.pipeline.report_interval == 0 {
            return Err(ConfigError::ValidationError(
                "pipeline.report_interval must be > 0".into(),
            ));
        }
        if self.limits.max_image_pixels == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_image_pixels must be > 0".into(),
            ));
        }
        if self.limits.transcode_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.transcode_timeout_ms must be > 0".into(),
            ));
        }
        if self.records.image_field.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "records.image_field must not be empty".into(),
            ));
        }
        if self.discovery.supported_formats.is_empty() {
            return Err(ConfigError::ValidationError(
                "discovery.supported_formats must list at least one extension".into(),
            ));
        }
        if self.discovery.output_extension.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "discovery.output_extension must not be empty".into(),
            ));
        }
        Ok(())
    }
}
