//! Run-wide counters, periodic batch updates, and the final summary.
//!
//! Only the driver mutates an [`Accounting`]; workers hand their results back
//! first, so the counters never race.

use serde::Serialize;
use std::fmt;
use std::time::Duration;

use crate::types::{RecordOutcome, TranscodeStats};

const KIB: f64 = 1024.0;
const MIB: f64 = 1024.0 * 1024.0;

/// Bytes as kilobytes (1024-based).
pub fn kilobytes(bytes: u64) -> f64 {
    bytes as f64 / KIB
}

/// Bytes as megabytes (1024-based).
pub fn megabytes(bytes: u64) -> f64 {
    bytes as f64 / MIB
}

/// `(original - new) / original * 100`, or `None` when `original` is zero.
pub fn reduction_percent(original: u64, new: u64) -> Option<f64> {
    if original == 0 {
        return None;
    }
    Some((original as f64 - new as f64) / original as f64 * 100.0)
}

/// Counters for one pipeline run.
#[derive(Debug, Clone)]
pub struct Accounting {
    total: u64,
    report_interval: u64,
    completed: u64,
    processed: u64,
    errors: u64,
    skipped: u64,
    passed_through: u64,
    original_bytes: u64,
    optimized_bytes: u64,
    last_success: Option<TranscodeStats>,
}

impl Accounting {
    /// `total` is the pre-counted number of items; a batch update is due every
    /// `report_interval` completions and at the last one.
    pub fn new(total: u64, report_interval: u64) -> Self {
        Self {
            total,
            report_interval: report_interval.max(1),
            completed: 0,
            processed: 0,
            errors: 0,
            skipped: 0,
            passed_through: 0,
            original_bytes: 0,
            optimized_bytes: 0,
            last_success: None,
        }
    }

    /// Count one completed item. Returns a batch update when one is due and a
    /// successful transcode has been seen.
    pub fn observe(&mut self, outcome: &RecordOutcome) -> Option<BatchUpdate> {
        self.completed += 1;
        match outcome {
            RecordOutcome::Transcoded(stats) => {
                self.processed += 1;
                self.original_bytes += stats.original_size;
                self.optimized_bytes += stats.new_size;
                self.last_success = Some(*stats);
            }
            RecordOutcome::Failed { .. } => self.errors += 1,
            RecordOutcome::PassedThrough => self.passed_through += 1,
            RecordOutcome::Skipped => self.skipped += 1,
        }

        let due = self.completed % self.report_interval == 0 || self.completed == self.total;
        if !due {
            return None;
        }
        self.last_success.map(|last| BatchUpdate {
            completed: self.completed,
            total: self.total,
            original_size: last.original_size,
            new_size: last.new_size,
        })
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn completed(&self) -> u64 {
        self.completed
    }

    pub fn processed(&self) -> u64 {
        self.processed
    }

    pub fn errors(&self) -> u64 {
        self.errors
    }

    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    pub fn passed_through(&self) -> u64 {
        self.passed_through
    }

    pub fn original_bytes(&self) -> u64 {
        self.original_bytes
    }

    pub fn optimized_bytes(&self) -> u64 {
        self.optimized_bytes
    }

    /// Overall reduction; only defined once something was processed.
    pub fn reduction_percent(&self) -> Option<f64> {
        if self.processed == 0 {
            return None;
        }
        reduction_percent(self.original_bytes, self.optimized_bytes)
    }

    /// Freeze the counters into a summary.
    pub fn summary(&self, elapsed: Duration) -> RunSummary {
        let seconds = elapsed.as_secs_f64();
        RunSummary {
            total: self.total,
            completed: self.completed,
            processed: self.processed,
            errors: self.errors,
            skipped: self.skipped,
            passed_through: self.passed_through,
            original_bytes: self.original_bytes,
            optimized_bytes: self.optimized_bytes,
            saved_bytes: self.original_bytes as i64 - self.optimized_bytes as i64,
            reduction_percent: self.reduction_percent(),
            elapsed_seconds: seconds,
            records_per_second: if seconds > 0.0 {
                self.completed as f64 / seconds
            } else {
                0.0
            },
        }
    }
}

/// Periodic report naming the most recent successful transcode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchUpdate {
    pub completed: u64,
    pub total: u64,
    pub original_size: u64,
    pub new_size: u64,
}

impl BatchUpdate {
    pub fn reduction_percent(&self) -> Option<f64> {
        reduction_percent(self.original_size, self.new_size)
    }
}

impl fmt::Display for BatchUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Batch update: {}/{} | last image: {:.1}KB -> {:.1}KB",
            self.completed,
            self.total,
            kilobytes(self.original_size),
            kilobytes(self.new_size)
        )?;
        if let Some(pct) = self.reduction_percent() {
            write!(f, " ({:.1}% reduction)", pct)?;
        }
        Ok(())
    }
}

/// Final accounting of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub total: u64,
    pub completed: u64,
    pub processed: u64,
    pub errors: u64,
    pub skipped: u64,
    pub passed_through: u64,
    pub original_bytes: u64,
    pub optimized_bytes: u64,
    /// Negative when re-encoding grew the images
    pub saved_bytes: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reduction_percent: Option<f64>,
    pub elapsed_seconds: f64,
    pub records_per_second: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn success(original: u64, new: u64) -> RecordOutcome {
        RecordOutcome::Transcoded(TranscodeStats {
            original_size: original,
            new_size: new,
            source_dimensions: (1600, 1200),
            output_dimensions: (800, 600),
        })
    }

    fn failure() -> RecordOutcome {
        RecordOutcome::Failed {
            reason: "corrupt".to_string(),
        }
    }

    #[test]
    fn test_totals_are_sums_of_successes() {
        let mut acc = Accounting::new(5, 10);
        acc.observe(&success(1000, 200));
        acc.observe(&failure());
        acc.observe(&success(3000, 500));
        acc.observe(&RecordOutcome::PassedThrough);
        acc.observe(&RecordOutcome::Skipped);

        assert_eq!(acc.completed(), 5);
        assert_eq!(acc.processed(), 2);
        assert_eq!(acc.errors(), 1);
        assert_eq!(acc.passed_through(), 1);
        assert_eq!(acc.skipped(), 1);
        assert_eq!(acc.original_bytes(), 4000);
        assert_eq!(acc.optimized_bytes(), 700);
        let pct = acc.reduction_percent().unwrap();
        assert!((pct - 82.5).abs() < 1e-9);
    }

    #[test]
    fn test_zero_processed_has_no_reduction() {
        let mut acc = Accounting::new(2, 10);
        acc.observe(&failure());
        acc.observe(&RecordOutcome::PassedThrough);

        assert_eq!(acc.reduction_percent(), None);
        let summary = acc.summary(Duration::ZERO);
        assert_eq!(summary.processed, 0);
        assert_eq!(summary.reduction_percent, None);
        assert_eq!(summary.records_per_second, 0.0);
    }

    #[test]
    fn test_batch_update_every_interval_and_at_end() {
        let mut acc = Accounting::new(5, 2);
        assert!(acc.observe(&success(100, 50)).is_none());
        let update = acc.observe(&success(200, 50)).unwrap();
        assert_eq!(update.completed, 2);
        assert_eq!(update.original_size, 200);
        assert!(acc.observe(&failure()).is_none());
        // Due, and reports the latest success even though this item failed
        let update = acc.observe(&failure()).unwrap();
        assert_eq!(update.completed, 4);
        assert_eq!(update.original_size, 200);
        // Last item is always due
        let update = acc.observe(&RecordOutcome::PassedThrough).unwrap();
        assert_eq!(update.completed, 5);
    }

    #[test]
    fn test_no_batch_update_before_any_success() {
        let mut acc = Accounting::new(4, 1);
        assert!(acc.observe(&failure()).is_none());
        assert!(acc.observe(&RecordOutcome::Skipped).is_none());
    }

    #[test]
    fn test_batch_update_display() {
        let update = BatchUpdate {
            completed: 10,
            total: 25,
            original_size: 2048,
            new_size: 512,
        };
        assert_eq!(
            update.to_string(),
            "Batch update: 10/25 | last image: 2.0KB -> 0.5KB (75.0% reduction)"
        );
    }

    #[test]
    fn test_saved_bytes_can_be_negative() {
        let mut acc = Accounting::new(1, 1);
        acc.observe(&success(100, 150));
        let summary = acc.summary(Duration::from_secs(1));
        assert_eq!(summary.saved_bytes, -50);
        assert_eq!(summary.reduction_percent, Some(-50.0));
    }

    #[test]
    fn test_summary_serializes_without_missing_reduction() {
        let summary = Accounting::new(0, 1).summary(Duration::from_secs(2));
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"processed\":0"));
        assert!(!json.contains("reduction_percent"));
    }

    #[test]
    fn test_unit_helpers() {
        assert_eq!(kilobytes(1536), 1.5);
        assert_eq!(megabytes(3 * 1024 * 1024), 3.0);
        assert_eq!(reduction_percent(0, 0), None);
    }
}
