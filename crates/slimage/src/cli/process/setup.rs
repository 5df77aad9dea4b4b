//! Run setup: input classification, config overrides, default output location.

use slimage_core::Config;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use super::ProcessArgs;

/// Which pipeline variant an input selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// A CSV file with an inline image column
    Csv,
    /// A directory of image files
    Directory,
}

impl InputKind {
    /// What one unit of work is called in progress output.
    pub fn unit(self) -> &'static str {
        match self {
            InputKind::Csv => "rows",
            InputKind::Directory => "images",
        }
    }
}

/// Classify the input by what it is on disk.
pub fn input_kind(input: &Path) -> anyhow::Result<InputKind> {
    if !input.exists() {
        anyhow::bail!(
            "Input path does not exist: {:?}\n\n  Hint: Check the file path and try again.",
            input
        );
    }
    Ok(if input.is_dir() {
        InputKind::Directory
    } else {
        InputKind::Csv
    })
}

/// Apply CLI overrides on top of the loaded config, then validate the result.
pub fn apply_overrides(config: &mut Config, args: &ProcessArgs) -> anyhow::Result<()> {
    if let Some(max_width) = args.max_width {
        config.transcode.max_width = max_width;
    }
    if let Some(quality) = args.quality {
        config.transcode.quality = quality;
    }
    if let Some(batch_size) = args.batch_size {
        config.pipeline.batch_size = batch_size;
    }
    if let Some(parallel) = args.parallel {
        config.pipeline.parallel_workers = parallel;
    }
    if let Some(report_every) = args.report_every {
        config.pipeline.report_interval = report_every;
    }
    if let Some(field) = &args.image_field {
        config.records.image_field = field.clone();
    }

    config.validate()?;
    Ok(())
}

/// `<stem>_optimized.csv` beside a CSV input, `<dir>_optimized` beside a directory.
pub fn default_output(input: &Path, kind: InputKind) -> PathBuf {
    // "." and "dir/.." have no file name until resolved
    let resolved = if input.file_name().is_some() {
        input.to_path_buf()
    } else {
        input.canonicalize().unwrap_or_else(|_| input.to_path_buf())
    };

    let mut name = match kind {
        InputKind::Csv => resolved.file_stem(),
        InputKind::Directory => resolved.file_name(),
    }
    .map(|s| s.to_os_string())
    .unwrap_or_else(|| OsString::from("output"));
    name.push("_optimized");
    if kind == InputKind::Csv {
        name.push(".csv");
    }
    resolved.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_for_csv() {
        assert_eq!(
            default_output(Path::new("data/baches.csv"), InputKind::Csv),
            PathBuf::from("data/baches_optimized.csv")
        );
        assert_eq!(
            default_output(Path::new("baches"), InputKind::Csv),
            PathBuf::from("baches_optimized.csv")
        );
    }

    #[test]
    fn test_default_output_for_directory() {
        assert_eq!(
            default_output(Path::new("shots/images"), InputKind::Directory),
            PathBuf::from("shots/images_optimized")
        );
        assert_eq!(
            default_output(Path::new("shots/images/"), InputKind::Directory),
            PathBuf::from("shots/images_optimized")
        );
    }

    #[test]
    fn test_input_kind() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("in.csv");
        std::fs::write(&file, "a\n").unwrap();

        assert_eq!(input_kind(&file).unwrap(), InputKind::Csv);
        assert_eq!(input_kind(dir.path()).unwrap(), InputKind::Directory);
        assert!(input_kind(&dir.path().join("absent")).is_err());
    }

    #[test]
    fn test_overrides_replace_config_values() {
        let mut config = Config::default();
        let args = ProcessArgs {
            max_width: Some(1024),
            quality: Some(70),
            batch_size: Some(25),
            parallel: Some(8),
            report_every: Some(5),
            image_field: Some("photo".to_string()),
            ..Default::default()
        };
        apply_overrides(&mut config, &args).unwrap();

        assert_eq!(config.transcode.max_width, 1024);
        assert_eq!(config.transcode.quality, 70);
        assert_eq!(config.pipeline.batch_size, 25);
        assert_eq!(config.pipeline.parallel_workers, 8);
        assert_eq!(config.pipeline.report_interval, 5);
        assert_eq!(config.records.image_field, "photo");
    }

    #[test]
    fn test_unset_overrides_keep_config() {
        let mut config = Config::default();
        apply_overrides(&mut config, &ProcessArgs::default()).unwrap();
        assert_eq!(config.transcode.max_width, 800);
        assert_eq!(config.pipeline.batch_size, 10);
    }

    #[test]
    fn test_zero_workers_rejected() {
        let mut config = Config::default();
        let args = ProcessArgs {
            parallel: Some(0),
            ..Default::default()
        };
        assert!(apply_overrides(&mut config, &args).is_err());
    }
}
