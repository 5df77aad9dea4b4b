//! Hooks for presenting pipeline progress.

use super::accounting::{BatchUpdate, RunSummary};
use crate::types::RecordOutcome;

/// Receives progress events from the driver, on the driver's task.
///
/// Every method has a no-op default so implementors pick what they show.
pub trait ProgressObserver {
    /// Streaming is about to start; `total` comes from the pre-scan.
    fn started(&mut self, _total: u64) {}

    /// One record or file finished. `label` identifies it.
    fn record_completed(&mut self, _label: &str, _outcome: &RecordOutcome) {}

    /// A periodic batch update is due.
    fn batch_update(&mut self, _update: &BatchUpdate) {}

    /// The run is complete and all output is committed.
    fn finished(&mut self, _summary: &RunSummary) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {}
