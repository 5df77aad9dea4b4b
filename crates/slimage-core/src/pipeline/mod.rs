//! Image transcoding pipeline components.
//!
//! - **payload**: Inline base64 image payloads
//! - **transcode**: Decode, bound to a maximum width, re-encode as JPEG
//! - **records**: Record sources and sinks over CSV
//! - **discovery**: Find image files in a directory
//! - **scheduler**: Bounded parallel execution with a per-batch barrier
//! - **accounting**: Counters, batch updates, run summary
//! - **progress**: Observer hooks for presenting progress
//! - **driver**: Orchestrates a full run

pub mod accounting;
pub mod discovery;
pub mod driver;
pub mod payload;
pub mod progress;
pub mod records;
pub mod scheduler;
pub mod transcode;

// Re-exports for convenient access
pub use accounting::{Accounting, BatchUpdate, RunSummary};
pub use discovery::{DiscoveredFile, FileDiscovery};
pub use driver::{PipelineDriver, RunStage};
pub use progress::{NoopObserver, ProgressObserver};
pub use records::{count_records, CsvRecordSink, CsvRecordSource, RecordSink, RecordSource};
pub use scheduler::{BatchScheduler, CancelFlag};
pub use transcode::{target_dimensions, ImageTranscoder};
