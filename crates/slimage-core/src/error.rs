//! Error types for the slimage transcoding pipeline.
//!
//! Errors are split by blast radius: setup and record-store failures end the
//! run, while [`TranscodeError`] is confined to a single image and recovered by
//! keeping the original payload.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for slimage operations.
#[derive(Error, Debug)]
pub enum SlimageError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Input or output could not be prepared
    #[error("Setup error: {0}")]
    Setup(#[from] SetupError),

    /// The record store failed mid-stream
    #[error("Record store error: {0}")]
    Record(#[from] RecordError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
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

/// Fatal conditions detected before any record is written.
#[derive(Error, Debug)]
pub enum SetupError {
    /// The input file or directory does not exist
    #[error("Input not found: {0}")]
    InputNotFound(PathBuf),

    /// The input exists but cannot be opened or listed
    #[error("Cannot read input {path}: {message}")]
    InputUnreadable { path: PathBuf, message: String },

    /// The CSV input has no header row
    #[error("Input {0} has no header row")]
    MissingHeader(PathBuf),

    /// The output file or directory cannot be created
    #[error("Cannot create output {path}: {message}")]
    OutputUncreatable { path: PathBuf, message: String },

    /// Output and input resolve to the same location
    #[error("Output {0} would overwrite the input")]
    OutputIsInput(PathBuf),
}

/// Failures of the tabular store.
#[derive(Error, Debug)]
pub enum RecordError {
    /// The stream is empty, so there is no header to take a schema from
    #[error("Input has no header row")]
    MissingHeader,

    /// A row could not be read
    #[error("Failed to read row {position}: {message}")]
    Read { position: u64, message: String },

    /// A row could not be written
    #[error("Failed to write row {position}: {message}")]
    Write { position: u64, message: String },
}

/// Per-image failures. Never fatal: the record keeps its original payload.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranscodeError {
    /// The inline payload is not valid base64
    #[error("Invalid inline payload: {message}")]
    Payload { message: String },

    /// Image decoding failed
    #[error("Decode error: {message}")]
    Decode { message: String },

    /// The bytes are not in a recognized image encoding
    #[error("Unsupported image format")]
    UnsupportedFormat,

    /// Image dimensions exceed the decoder limits
    #[error("Image too large: {message}")]
    ImageTooLarge { message: String },

    /// Resize was impossible (zero-sized source)
    #[error("Resize error: {message}")]
    Resize { message: String },

    /// JPEG encoding failed
    #[error("Encode error: {message}")]
    Encode { message: String },

    /// Reading the source file or writing the output file failed
    #[error("IO error on {path}: {message}")]
    Io { path: PathBuf, message: String },

    /// The worker did not finish within the watchdog
    #[error("Timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// The worker saw its cancel flag and dropped its result
    #[error("Cancelled")]
    Cancelled,

    /// The worker panicked or was cancelled
    #[error("Worker failure: {message}")]
    Worker { message: String },
}

/// Convenience type alias for slimage results.
pub type Result<T> = std::result::Result<T, SlimageError>;

/// Convenience type alias for per-image results.
pub type TranscodeResult<T> = std::result::Result<T, TranscodeError>;
