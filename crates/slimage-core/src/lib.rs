//! Slimage Core - batch image transcoding library.
//!
//! Slimage shrinks images embedded in record stores. It reads records that
//! carry a base64-encoded image in one column, bounds each image to a maximum
//! width, re-encodes it as JPEG, and writes every record back out in order
//! with the image replaced. A second mode does the same for a directory of
//! image files.
//!
//! # Architecture
//!
//! ```text
//! CSV → batch → [base64 → decode → resize → JPEG → base64] x N workers → CSV
//! ```
//!
//! A record whose image cannot be transcoded keeps its original payload and
//! is counted as an error; only setup problems abort a run.
//!
//! # Usage
//!
//! ```rust,ignore
//! use slimage_core::{Config, NoopObserver, PipelineDriver};
//!
//! #[tokio::main]
//! async fn main() -> slimage_core::Result<()> {
//!     let driver = PipelineDriver::new(Config::load()?);
//!     let summary = driver
//!         .run_csv("baches.csv".as_ref(), "baches_optimized.csv".as_ref(), &mut NoopObserver)
//!         .await?;
//!     println!("{} images transcoded", summary.processed);
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod config;
pub mod error;
pub mod pipeline;
pub mod types;

// Re-exports for convenient access
pub use config::Config;
pub use error::{
    ConfigError, RecordError, Result, SetupError, SlimageError, TranscodeError, TranscodeResult,
};
pub use pipeline::{
    BatchUpdate, NoopObserver, PipelineDriver, ProgressObserver, RunStage, RunSummary,
};
pub use types::{Record, RecordOutcome, Schema, TranscodeStats, TranscodedImage};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_driver_uses_config() {
        let driver = PipelineDriver::new(Config::default());
        assert_eq!(driver.config().pipeline.parallel_workers, 4);
        assert_eq!(driver.config().transcode.max_width, 800);
    }
}
