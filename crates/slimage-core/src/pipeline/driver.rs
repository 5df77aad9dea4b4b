//! Pipeline orchestration - wires source, scheduler, transcoder, sink, and accounting.
//!
//! A run moves through [`RunStage`]s in order. Only setup problems end it early;
//! a record whose image cannot be transcoded is written with its original
//! payload and counted as an error.

use std::collections::HashSet;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::error::{Result, SetupError, TranscodeError, TranscodeResult};
use crate::types::{RecordOutcome, TranscodeStats};

use super::accounting::{kilobytes, reduction_percent, Accounting, RunSummary};
use super::discovery::{DiscoveredFile, FileDiscovery};
use super::payload;
use super::progress::ProgressObserver;
use super::records::{count_records, CsvRecordSink, CsvRecordSource, RecordSink, RecordSource};
use super::scheduler::{BatchScheduler, CancelFlag};
use super::transcode::ImageTranscoder;

/// Stages of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    /// Validating input and output locations
    Init,
    /// Pre-scanning the input for a total
    Counting,
    /// Reading, transcoding, and writing batches
    Streaming,
    /// Committing the sink
    Draining,
    /// Producing the final summary
    Summarizing,
    Done,
}

fn enter(stage: RunStage) {
    tracing::debug!("Pipeline stage: {:?}", stage);
}

/// Transcoded inline image, ready to go back into its record.
struct InlineImage {
    payload: String,
    stats: TranscodeStats,
}

/// One file of the directory variant and where its output goes.
struct FileJob {
    input: PathBuf,
    output: PathBuf,
}

/// Drives records or files through the transcoder.
pub struct PipelineDriver {
    config: Config,
    transcoder: Arc<ImageTranscoder>,
    scheduler: BatchScheduler,
    discovery: FileDiscovery,
}

impl PipelineDriver {
    /// Create a driver. The worker pool is created once and reused for every batch.
    pub fn new(config: Config) -> Self {
        Self {
            transcoder: Arc::new(ImageTranscoder::from_config(&config)),
            scheduler: BatchScheduler::from_config(&config),
            discovery: FileDiscovery::new(config.discovery.clone()),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Transcode every inline image of a CSV file into a new CSV file.
    ///
    /// The output is only created once the input has been opened and its
    /// header read.
    pub async fn run_csv<O>(
        &self,
        input: &Path,
        output: &Path,
        observer: &mut O,
    ) -> Result<RunSummary>
    where
        O: ProgressObserver + ?Sized,
    {
        enter(RunStage::Init);
        if !input.exists() {
            return Err(SetupError::InputNotFound(input.to_path_buf()).into());
        }
        if !input.is_file() {
            return Err(SetupError::InputUnreadable {
                path: input.to_path_buf(),
                message: "not a file".to_string(),
            }
            .into());
        }
        ensure_distinct(input, output)?;
        let mut source = CsvRecordSource::open(input, &self.config.records.image_field)?;

        enter(RunStage::Counting);
        tracing::info!("Counting rows in {:?}...", input);
        let total = count_records(input)?;
        tracing::info!("Found {} rows to process", total);

        create_parent_dir(output)?;
        let mut sink = CsvRecordSink::create(output, source.schema())?;

        let summary = self
            .run_records(&mut source, &mut sink, total, observer)
            .await?;
        tracing::info!("Optimized CSV saved to {:?}", output);
        Ok(summary)
    }

    /// Stream records from `source` to `sink`, transcoding image payloads batch by batch.
    ///
    /// Every record is written exactly once and in input order. `total` is the
    /// expected record count, used for progress only.
    pub async fn run_records<S, K, O>(
        &self,
        source: &mut S,
        sink: &mut K,
        total: u64,
        observer: &mut O,
    ) -> Result<RunSummary>
    where
        S: RecordSource + ?Sized,
        K: RecordSink + ?Sized,
        O: ProgressObserver + ?Sized,
    {
        let start = Instant::now();
        let batch_size = self.config.pipeline.batch_size.max(1);
        let mut accounting = Accounting::new(total, self.config.pipeline.report_interval);

        enter(RunStage::Streaming);
        tracing::info!(
            "Processing in batches of {} using {} parallel workers",
            batch_size,
            self.scheduler.workers()
        );
        observer.started(total);

        let transcoder = Arc::clone(&self.transcoder);
        let job = Arc::new(move |encoded: Vec<u8>, cancel: &CancelFlag| {
            transcode_inline(&transcoder, encoded, cancel)
        });

        loop {
            // Rows read before a read error are still written before it is returned.
            let mut batch = Vec::with_capacity(batch_size);
            let read = source.read_batch(batch_size, &mut batch);
            if batch.is_empty() {
                read?;
                break;
            }

            let (slots, payloads): (Vec<usize>, Vec<Vec<u8>>) = batch
                .iter()
                .enumerate()
                .filter_map(|(i, record)| record.image_payload().map(|p| (i, p.to_vec())))
                .unzip();
            tracing::debug!(
                "Batch of {} record(s), {} with images",
                batch.len(),
                payloads.len()
            );

            let mut results: Vec<Option<TranscodeResult<InlineImage>>> =
                batch.iter().map(|_| None).collect();
            let finished = self.scheduler.run_batch(payloads, Arc::clone(&job)).await;
            for (slot, result) in slots.into_iter().zip(finished) {
                results[slot] = Some(result);
            }

            for (mut record, result) in batch.into_iter().zip(results) {
                let label = record.label();
                let outcome = match result {
                    None => RecordOutcome::PassedThrough,
                    Some(Ok(image)) => {
                        record.set_image_payload(image.payload);
                        RecordOutcome::Transcoded(image.stats)
                    }
                    Some(Err(e)) => {
                        tracing::warn!("Error processing {}: {}", label, e);
                        RecordOutcome::Failed {
                            reason: e.to_string(),
                        }
                    }
                };
                sink.write(&record)?;
                complete(&mut accounting, observer, &label, &outcome);
            }

            // Output ends on a batch boundary even if the run is interrupted.
            sink.flush()?;
            read?;
        }

        enter(RunStage::Draining);
        sink.finish()?;

        Ok(summarize(&accounting, start, observer))
    }

    /// Transcode every supported image directly inside `input` into `output`.
    ///
    /// Inputs whose output file already exists are skipped, which makes a
    /// rerun over the same directories a no-op.
    pub async fn run_directory<O>(
        &self,
        input: &Path,
        output: &Path,
        observer: &mut O,
    ) -> Result<RunSummary>
    where
        O: ProgressObserver + ?Sized,
    {
        let start = Instant::now();

        enter(RunStage::Init);
        if !input.exists() {
            return Err(SetupError::InputNotFound(input.to_path_buf()).into());
        }
        if !input.is_dir() {
            return Err(SetupError::InputUnreadable {
                path: input.to_path_buf(),
                message: "not a directory".to_string(),
            }
            .into());
        }
        ensure_distinct(input, output)?;

        enter(RunStage::Counting);
        let files = self.discovery.discover(input)?;
        let total = files.len() as u64;
        if files.is_empty() {
            tracing::info!("No images found to process in {:?}", input);
        } else {
            tracing::info!(
                "Found {} images to process ({:.1} MB)",
                total,
                FileDiscovery::total_size(&files) as f64 / (1024.0 * 1024.0)
            );
        }

        if !output.is_dir() {
            std::fs::create_dir_all(output).map_err(|e| SetupError::OutputUncreatable {
                path: output.to_path_buf(),
                message: e.to_string(),
            })?;
            tracing::info!("Created directory: {:?}", output);
        }

        enter(RunStage::Streaming);
        let batch_size = self.config.pipeline.batch_size.max(1);
        let batch_count = files.len().div_ceil(batch_size);
        tracing::info!(
            "Processing in batches of {} using {} parallel workers",
            batch_size,
            self.scheduler.workers()
        );
        observer.started(total);

        let mut accounting = Accounting::new(total, self.config.pipeline.report_interval);
        let mut claimed: HashSet<PathBuf> = HashSet::new();
        let transcoder = Arc::clone(&self.transcoder);
        let job = Arc::new(move |file: FileJob, cancel: &CancelFlag| {
            transcode_file(&transcoder, &file, cancel)
        });

        for (index, batch) in files.chunks(batch_size).enumerate() {
            tracing::debug!("Processing batch {}/{}", index + 1, batch_count);

            let mut slots = Vec::new();
            let mut jobs = Vec::new();
            for (i, file) in batch.iter().enumerate() {
                let target = self.discovery.output_path(&file.path, output);
                if !claimed.insert(target.clone()) {
                    tracing::warn!(
                        "{:?} maps to {:?}, which another input already produced; skipping",
                        file.path,
                        target
                    );
                    continue;
                }
                if target.exists() {
                    continue;
                }
                slots.push(i);
                jobs.push(FileJob {
                    input: file.path.clone(),
                    output: target,
                });
            }

            let mut results: Vec<Option<TranscodeResult<TranscodeStats>>> =
                batch.iter().map(|_| None).collect();
            let finished = self.scheduler.run_batch(jobs, Arc::clone(&job)).await;
            for (slot, result) in slots.into_iter().zip(finished) {
                results[slot] = Some(result);
            }

            for (file, result) in batch.iter().zip(results) {
                let label = file_label(file);
                let outcome = match result {
                    None => {
                        tracing::debug!("Skipped (already exists): {}", label);
                        RecordOutcome::Skipped
                    }
                    Some(Ok(stats)) => {
                        tracing::debug!(
                            "Optimized: {} - {:.1}KB -> {:.1}KB ({:.1}% reduction)",
                            label,
                            kilobytes(stats.original_size),
                            kilobytes(stats.new_size),
                            reduction_percent(stats.original_size, stats.new_size).unwrap_or(0.0)
                        );
                        RecordOutcome::Transcoded(stats)
                    }
                    Some(Err(e)) => {
                        tracing::warn!("Error processing {}: {}", label, e);
                        RecordOutcome::Failed {
                            reason: e.to_string(),
                        }
                    }
                };
                complete(&mut accounting, observer, &label, &outcome);
            }
        }

        // Workers rename each output into place before their batch returns.
        enter(RunStage::Draining);

        Ok(summarize(&accounting, start, observer))
    }
}

fn complete<O>(accounting: &mut Accounting, observer: &mut O, label: &str, outcome: &RecordOutcome)
where
    O: ProgressObserver + ?Sized,
{
    let update = accounting.observe(outcome);
    observer.record_completed(label, outcome);
    if let Some(update) = update {
        tracing::debug!("{}", update);
        observer.batch_update(&update);
    }
}

fn summarize<O>(accounting: &Accounting, start: Instant, observer: &mut O) -> RunSummary
where
    O: ProgressObserver + ?Sized,
{
    enter(RunStage::Summarizing);
    let summary = accounting.summary(start.elapsed());
    observer.finished(&summary);
    enter(RunStage::Done);
    summary
}

fn transcode_inline(
    transcoder: &ImageTranscoder,
    encoded: Vec<u8>,
    cancel: &CancelFlag,
) -> TranscodeResult<InlineImage> {
    let raw = payload::decode_inline(&encoded)?;
    drop(encoded);
    let image = transcoder.transcode(&raw)?;
    if cancel.is_cancelled() {
        return Err(TranscodeError::Cancelled);
    }
    Ok(InlineImage {
        payload: payload::encode_inline(&image.bytes),
        stats: image.stats,
    })
}

fn transcode_file(
    transcoder: &ImageTranscoder,
    job: &FileJob,
    cancel: &CancelFlag,
) -> TranscodeResult<TranscodeStats> {
    let raw = std::fs::read(&job.input).map_err(|e| io_failure(&job.input, e))?;
    let image = transcoder.transcode(&raw)?;
    if cancel.is_cancelled() {
        return Err(TranscodeError::Cancelled);
    }

    // Only complete files ever carry the final name.
    let partial = partial_path(&job.output);
    std::fs::write(&partial, &image.bytes).map_err(|e| io_failure(&partial, e))?;
    if cancel.is_cancelled() {
        let _ = std::fs::remove_file(&partial);
        return Err(TranscodeError::Cancelled);
    }
    if let Err(e) = std::fs::rename(&partial, &job.output) {
        let _ = std::fs::remove_file(&partial);
        return Err(io_failure(&job.output, e));
    }
    Ok(image.stats)
}

fn io_failure(path: &Path, error: std::io::Error) -> TranscodeError {
    TranscodeError::Io {
        path: path.to_path_buf(),
        message: error.to_string(),
    }
}

fn partial_path(output: &Path) -> PathBuf {
    let mut name = output
        .file_name()
        .map(OsStr::to_os_string)
        .unwrap_or_default();
    name.push(".part");
    output.with_file_name(name)
}

fn file_label(file: &DiscoveredFile) -> String {
    file.path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.path.display().to_string())
}

fn ensure_distinct(input: &Path, output: &Path) -> std::result::Result<(), SetupError> {
    let same = match (input.canonicalize(), output.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => input == output,
    };
    if same {
        return Err(SetupError::OutputIsInput(output.to_path_buf()));
    }
    Ok(())
}

fn create_parent_dir(output: &Path) -> std::result::Result<(), SetupError> {
    match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => {
            std::fs::create_dir_all(parent).map_err(|e| SetupError::OutputUncreatable {
                path: output.to_path_buf(),
                message: e.to_string(),
            })
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_path_appends_suffix() {
        assert_eq!(
            partial_path(Path::new("/out/a.jpg")),
            PathBuf::from("/out/a.jpg.part")
        );
    }

    #[test]
    fn test_ensure_distinct_rejects_same_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        std::fs::write(&path, "a\n").unwrap();
        assert!(matches!(
            ensure_distinct(&path, &path),
            Err(SetupError::OutputIsInput(_))
        ));
        assert!(ensure_distinct(&path, &dir.path().join("other.csv")).is_ok());
    }

    #[test]
    fn test_transcode_inline_rejects_bad_base64() {
        let transcoder = ImageTranscoder::from_config(&Config::default());
        let err = transcode_inline(&transcoder, b"%%%".to_vec(), &CancelFlag::default()).err();
        assert!(matches!(err, Some(TranscodeError::Payload { .. })));
    }

    #[test]
    fn test_cancelled_file_job_leaves_no_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("a.png");
        let image = image::RgbImage::from_pixel(40, 30, image::Rgb([10, 20, 30]));
        image.save(&input).unwrap();
        let job = FileJob {
            input,
            output: dir.path().join("a.jpg"),
        };

        let cancel = CancelFlag::default();
        cancel.cancel();
        let transcoder = ImageTranscoder::from_config(&Config::default());
        let err = transcode_file(&transcoder, &job, &cancel).err();

        assert_eq!(err, Some(TranscodeError::Cancelled));
        assert!(!job.output.exists());
        assert!(!partial_path(&job.output).exists());
    }
}
