//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};

/// Resize and re-encode settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscodeConfig {
    /// Images wider than this are scaled down to exactly this width
    pub max_width: u32,

    /// JPEG quality (0-100, higher = larger/better)
    pub quality: u8,
}

impl Default for TranscodeConfig {
    fn default() -> Self {
        Self {
            max_width: 800,
            quality: 85,
        }
    }
}

/// Batching and concurrency settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Records read and fully drained per batch
    pub batch_size: usize,

    /// Number of concurrent transcode workers
    pub parallel_workers: usize,

    /// Completed records between batch update lines
    pub report_interval: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            parallel_workers: 4,
            report_interval: 10,
        }
    }
}

/// Resource limits to protect against problematic inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum decoded area (width x height) in pixels
    pub max_image_pixels: u64,

    /// Watchdog for a single transcode in milliseconds
    pub transcode_timeout_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_image_pixels: 178_956_970,
            transcode_timeout_ms: 60000,
        }
    }
}

/// Tabular record store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordsConfig {
    /// Column holding the base64-encoded image
    pub image_field: String,
}

impl Default for RecordsConfig {
    fn default() -> Self {
        Self {
            image_field: "imagen_base64".to_string(),
        }
    }
}

/// Settings for the directory-of-files variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Recognized input extensions (case-insensitive)
    pub supported_formats: Vec<String>,

    /// Extension given to every output file
    pub output_extension: String,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            supported_formats: ["jpg", "jpeg", "png", "webp", "bmp", "gif", "tif", "tiff"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            output_extension: "jpg".to_string(),
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
