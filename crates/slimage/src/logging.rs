//! Logging initialization and configuration.
//!
//! Uses the `tracing` ecosystem for structured logging with support for
//! both human-readable and JSON output formats. Everything goes to stderr so
//! `--json-summary` output on stdout stays machine-readable.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the logging subsystem.
///
/// # Arguments
///
/// * `verbose` - If true, enables DEBUG level logging; otherwise INFO level.
/// * `json_format` - If true, outputs structured JSON logs; otherwise pretty-printed.
///
/// # Notes
///
/// - Log output goes to stderr
/// - The RUST_LOG environment variable can override the log level
pub fn init(verbose: bool, json_format: bool) {
    // Build the filter, respecting RUST_LOG if set
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if json_format {
        // JSON format for machine parsing
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        // Pretty format for humans
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .with_ansi(true),
            )
            .init();
    }
}

/// Initialize logging with configuration from Config.
///
/// `logging.level` of "debug" or "trace" turns on verbose output and
/// `logging.format = "json"` selects JSON; the CLI flags win over both.
pub fn init_from_config(
    config: &slimage_core::Config,
    verbose_override: bool,
    json_logs_override: bool,
) {
    let (verbose, json_format) = effective_settings(config, verbose_override, json_logs_override);
    init(verbose, json_format);
}

/// Resolve the effective (verbose, json) pair without installing a subscriber.
fn effective_settings(
    config: &slimage_core::Config,
    verbose_override: bool,
    json_logs_override: bool,
) -> (bool, bool) {
    (
        verbose_override || matches!(config.logging.level.as_str(), "debug" | "trace"),
        json_logs_override || config.logging.format == "json",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let config = slimage_core::Config::default();
        assert_eq!(effective_settings(&config, false, false), (false, false));
        assert_eq!(effective_settings(&config, true, true), (true, true));
    }

    #[test]
    fn test_config_selects_debug_and_json() {
        let mut config = slimage_core::Config::default();
        config.logging.level = "trace".to_string();
        config.logging.format = "json".to_string();
        assert_eq!(effective_settings(&config, false, false), (true, true));
    }
}
