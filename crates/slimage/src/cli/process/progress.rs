//! Terminal progress for a pipeline run.

use indicatif::{ProgressBar, ProgressStyle};
use slimage_core::{BatchUpdate, ProgressObserver, RecordOutcome, RunSummary};

/// Drives an `indicatif` bar from pipeline events.
///
/// Batch updates are printed above the bar so they stay in the scrollback.
pub struct ProgressBarObserver {
    bar: Option<ProgressBar>,
    unit: &'static str,
    errors: u64,
}

impl ProgressBarObserver {
    pub fn new(unit: &'static str) -> Self {
        Self {
            bar: None,
            unit,
            errors: 0,
        }
    }

    fn message(&self) -> String {
        match self.errors {
            0 => self.unit.to_string(),
            n => format!("{} ({} errors)", self.unit, n),
        }
    }
}

impl ProgressObserver for ProgressBarObserver {
    fn started(&mut self, total: u64) {
        let bar = create_progress_bar(total);
        bar.set_message(self.message());
        self.bar = Some(bar);
    }

    fn record_completed(&mut self, _label: &str, outcome: &RecordOutcome) {
        if matches!(outcome, RecordOutcome::Failed { .. }) {
            self.errors += 1;
        }
        let message = self.message();
        if let Some(bar) = &self.bar {
            bar.inc(1);
            if self.errors > 0 {
                bar.set_message(message);
            }
        }
    }

    fn batch_update(&mut self, update: &BatchUpdate) {
        match &self.bar {
            Some(bar) => bar.println(update.to_string()),
            None => eprintln!("{}", update),
        }
    }

    fn finished(&mut self, _summary: &RunSummary) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}

/// Create a progress bar for a run of `total` items.
fn create_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {per_sec} {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");
    pb.set_style(style);
    pb
}
