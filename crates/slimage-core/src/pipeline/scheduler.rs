//! Bounded fan-out of CPU-bound jobs with a join barrier per batch.
//!
//! Jobs run on tokio's blocking pool. A semaphore shared across batches caps
//! how many run at once, and `run_batch` only returns once every job of the
//! batch has stopped running, with results in input order.
//!
//! Blocking threads cannot be interrupted, so a job that outlives its timeout
//! is told to stop through its [`CancelFlag`] and then waited for. Jobs check
//! the flag before any step with an effect that outlives them.

use futures_util::future::join_all;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinError;
use tokio::time::timeout;

use crate::config::Config;
use crate::error::{TranscodeError, TranscodeResult};

/// Set once a job has outlived its timeout; its result will be discarded.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }
}

/// Runs batches of jobs on at most `workers` blocking threads at a time.
pub struct BatchScheduler {
    permits: Arc<Semaphore>,
    workers: usize,
    job_timeout: Duration,
}

impl BatchScheduler {
    /// Create a scheduler. `workers` is clamped to at least one.
    pub fn new(workers: usize, job_timeout: Duration) -> Self {
        let workers = workers.max(1);
        Self {
            permits: Arc::new(Semaphore::new(workers)),
            workers,
            job_timeout,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.pipeline.parallel_workers,
            Duration::from_millis(config.limits.transcode_timeout_ms),
        )
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run `job` over every item and return one result per item, in order.
    ///
    /// A failing, panicking, or timed-out job yields an `Err` in its own slot
    /// and leaves its siblings alone. A timed-out job has its flag cancelled
    /// and is still awaited, so nothing it does can overlap the next batch.
    /// It reports `Timeout` unless it had already committed its result.
    pub async fn run_batch<I, O, F>(&self, items: Vec<I>, job: Arc<F>) -> Vec<TranscodeResult<O>>
    where
        I: Send + 'static,
        O: Send + 'static,
        F: Fn(I, &CancelFlag) -> TranscodeResult<O> + Send + Sync + 'static,
    {
        let job_timeout = self.job_timeout;
        let timeout_ms = job_timeout.as_millis() as u64;

        let handles: Vec<_> = items
            .into_iter()
            .map(|item| {
                let permits = Arc::clone(&self.permits);
                let job = Arc::clone(&job);
                tokio::spawn(async move {
                    let permit =
                        permits
                            .acquire_owned()
                            .await
                            .map_err(|e| TranscodeError::Worker {
                                message: e.to_string(),
                            })?;
                    let cancel = CancelFlag::default();
                    let worker_cancel = cancel.clone();
                    let mut task = tokio::task::spawn_blocking(move || {
                        let _permit = permit;
                        job(item, &worker_cancel)
                    });
                    match timeout(job_timeout, &mut task).await {
                        Ok(Ok(result)) => result,
                        Ok(Err(e)) => Err(worker_failure(e)),
                        Err(_) => {
                            cancel.cancel();
                            tracing::debug!("Job exceeded {}ms, waiting for it to stop", timeout_ms);
                            match task.await {
                                Ok(Ok(committed)) => Ok(committed),
                                Ok(Err(_)) => Err(TranscodeError::Timeout { timeout_ms }),
                                Err(e) => Err(worker_failure(e)),
                            }
                        }
                    }
                })
            })
            .collect();

        join_all(handles)
            .await
            .into_iter()
            .map(|joined| joined.unwrap_or_else(|e| Err(worker_failure(e))))
            .collect()
    }
}

fn worker_failure(error: JoinError) -> TranscodeError {
    let message = if error.is_panic() {
        let payload = error.into_panic();
        if let Some(s) = payload.downcast_ref::<&str>() {
            format!("panicked: {s}")
        } else if let Some(s) = payload.downcast_ref::<String>() {
            format!("panicked: {s}")
        } else {
            "panicked".to_string()
        }
    } else {
        error.to_string()
    };
    TranscodeError::Worker { message }
}
