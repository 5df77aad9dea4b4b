//! The `slimage process` command for transcoding images.

mod progress;
mod setup;
mod summary;

use clap::Args;
use slimage_core::{Config, PipelineDriver};
use std::path::PathBuf;

use progress::ProgressBarObserver;
use setup::{apply_overrides, default_output, input_kind, InputKind};
use summary::print_summary;

/// Arguments for the `process` command.
///
/// Every tuning flag is optional; unset ones fall back to the config file.
#[derive(Args, Debug)]
pub struct ProcessArgs {
    /// CSV file or image directory to process
    #[arg(required = true)]
    pub input: PathBuf,

    /// Output CSV file or directory (defaults to `<input>_optimized` next to the input)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Maximum output width in pixels
    #[arg(long, env = "SLIMAGE_MAX_WIDTH")]
    pub max_width: Option<u32>,

    /// JPEG quality (0-100)
    #[arg(long, env = "SLIMAGE_QUALITY")]
    pub quality: Option<u8>,

    /// Records per batch
    #[arg(long, env = "SLIMAGE_BATCH_SIZE")]
    pub batch_size: Option<usize>,

    /// Number of parallel workers
    #[arg(short, long, env = "SLIMAGE_PARALLEL")]
    pub parallel: Option<usize>,

    /// Print a batch update every N completed records
    #[arg(long, env = "SLIMAGE_REPORT_EVERY")]
    pub report_every: Option<u64>,

    /// Name of the column holding the base64 image
    #[arg(long, env = "SLIMAGE_IMAGE_FIELD")]
    pub image_field: Option<String>,

    /// Print the run summary as JSON on stdout
    #[arg(long)]
    pub json_summary: bool,
}

/// Manual Default impl for constructing ProcessArgs outside of clap.
impl Default for ProcessArgs {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            output: None,
            max_width: None,
            quality: None,
            batch_size: None,
            parallel: None,
            report_every: None,
            image_field: None,
            json_summary: false,
        }
    }
}

/// Execute the process command.
pub async fn execute(args: ProcessArgs, mut config: Config) -> anyhow::Result<()> {
    let kind = input_kind(&args.input)?;
    apply_overrides(&mut config, &args)?;
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output(&args.input, kind));

    tracing::info!(
        "Max width: {}px, JPEG quality: {}",
        config.transcode.max_width,
        config.transcode.quality
    );

    let driver = PipelineDriver::new(config);
    let mut observer = ProgressBarObserver::new(kind.unit());
    let summary = match kind {
        InputKind::Csv => {
            tracing::info!("Processing {:?} -> {:?}", args.input, output);
            driver.run_csv(&args.input, &output, &mut observer).await?
        }
        InputKind::Directory => {
            tracing::info!("Processing images in {:?} -> {:?}", args.input, output);
            driver
                .run_directory(&args.input, &output, &mut observer)
                .await?
        }
    };

    print_summary(&summary, &output);
    if args.json_summary {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_execute_writes_default_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("baches.csv");
        std::fs::write(&input, "id,imagen_base64\n1,\n2,\n").unwrap();

        let args = ProcessArgs {
            input: input.clone(),
            json_summary: true,
            ..Default::default()
        };
        execute(args, Config::default()).await.unwrap();

        let output = dir.path().join("baches_optimized.csv");
        assert_eq!(
            std::fs::read_to_string(output).unwrap(),
            "id,imagen_base64\n1,\n2,\n"
        );
    }

    #[tokio::test]
    async fn test_execute_rejects_invalid_override() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.csv");
        std::fs::write(&input, "id\n").unwrap();

        let args = ProcessArgs {
            input,
            quality: Some(101),
            ..Default::default()
        };
        let err = execute(args, Config::default()).await.unwrap_err();
        assert!(err.to_string().contains("quality"));
        assert!(!dir.path().join("in_optimized.csv").exists());
    }

    #[tokio::test]
    async fn test_execute_missing_input_fails() {
        let dir = tempfile::tempdir().unwrap();
        let args = ProcessArgs {
            input: dir.path().join("absent.csv"),
            ..Default::default()
        };
        assert!(execute(args, Config::default()).await.is_err());
        assert!(!dir.path().join("absent_optimized.csv").exists());
    }
}
