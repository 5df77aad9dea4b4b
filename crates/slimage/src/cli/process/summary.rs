//! End-of-run summary table.

use slimage_core::pipeline::accounting::megabytes;
use slimage_core::RunSummary;
use std::path::Path;

/// Print a formatted summary table on stderr.
pub fn print_summary(summary: &RunSummary, output: &Path) {
    eprintln!();
    eprint!("{}", format_summary(summary));
    eprintln!("  Output: {}", output.display());
}

fn format_summary(summary: &RunSummary) -> String {
    let mut lines = vec![
        "  ====================================".to_string(),
        "               Summary".to_string(),
        "  ====================================".to_string(),
        format!("    Processed:    {:>8}", summary.processed),
        format!("    Errors:       {:>8}", summary.errors),
    ];
    if summary.skipped > 0 {
        lines.push(format!("    Skipped:      {:>8}", summary.skipped));
    }
    if summary.passed_through > 0 {
        lines.push(format!("    No image:     {:>8}", summary.passed_through));
    }
    lines.push("  ------------------------------------".to_string());

    if summary.processed > 0 {
        lines.push(format!(
            "    Original:     {:>8.2} MB",
            megabytes(summary.original_bytes)
        ));
        lines.push(format!(
            "    Optimized:    {:>8.2} MB",
            megabytes(summary.optimized_bytes)
        ));
        let saved = summary.saved_bytes as f64 / (1024.0 * 1024.0);
        match summary.reduction_percent {
            Some(pct) => lines.push(format!("    Saved:        {:>8.2} MB ({:.1}%)", saved, pct)),
            None => lines.push(format!("    Saved:        {:>8.2} MB", saved)),
        }
        lines.push("  ------------------------------------".to_string());
    }

    lines.push(format!("    Total:        {:>8}", summary.completed));
    lines.push(format!("    Duration:     {:>7.1}s", summary.elapsed_seconds));
    lines.push(format!(
        "    Rate:         {:>7.1} /sec",
        summary.records_per_second
    ));
    lines.push("  ====================================".to_string());

    let mut text = lines.join("\n");
    text.push('\n');
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(processed: u64, errors: u64) -> RunSummary {
        RunSummary {
            total: processed + errors,
            completed: processed + errors,
            processed,
            errors,
            skipped: 0,
            passed_through: 0,
            original_bytes: 4 * 1024 * 1024,
            optimized_bytes: 1024 * 1024,
            saved_bytes: 3 * 1024 * 1024,
            reduction_percent: (processed > 0).then_some(75.0),
            elapsed_seconds: 2.0,
            records_per_second: 12.5,
        }
    }

    #[test]
    fn test_summary_reports_sizes_and_reduction() {
        let text = format_summary(&summary(23, 2));
        assert!(text.contains("Processed:          23"));
        assert!(text.contains("Errors:              2"));
        assert!(text.contains("Original:         4.00 MB"));
        assert!(text.contains("Optimized:        1.00 MB"));
        assert!(text.contains("3.00 MB (75.0%)"));
        assert!(!text.contains("Skipped"));
    }

    #[test]
    fn test_summary_omits_sizes_when_nothing_processed() {
        let mut nothing = summary(0, 3);
        nothing.passed_through = 4;
        let text = format_summary(&nothing);
        assert!(!text.contains("Saved"));
        assert!(text.contains("No image:            4"));
    }
}
