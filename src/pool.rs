//! Worker pool: runs one batch of jobs and decides whether originals go.
//!
//! Each worker is a tokio task driving its own ffmpeg processes, so the
//! CPU-heavy encoding happens in separate OS processes. The batch is
//! fail-fast: the first failure or a cancellation aborts every outstanding
//! task, and aborting a task kills the child processes it owns.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::ConversionRequest;
use crate::convert::{ConvertReport, Converter};
use crate::error::ConvertError;
use crate::job::ConversionJob;

/// How a batch ended.
#[derive(Debug)]
pub enum BatchOutcome {
    /// Discovery found nothing to convert.
    NothingToDo,
    /// Every job succeeded.
    Completed {
        converted: usize,
        /// Source files removed afterwards (zero unless deletion was requested).
        deleted: usize,
    },
    /// The user interrupted the batch.
    Cancelled,
    /// A job failed and the rest of the batch was abandoned.
    Failed { job: String, error: ConvertError },
}

impl BatchOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, BatchOutcome::Failed { .. })
    }
}

/// Result of one job as reported by a pool worker.
#[derive(Debug)]
pub struct JobOutcome {
    pub job: String,
    pub result: Result<ConvertReport, ConvertError>,
}

/// Why a batch stopped early.
enum Halt {
    Cancelled,
    Failed { job: String, error: ConvertError },
}

impl Halt {
    fn from_error(job: &str, error: ConvertError) -> Self {
        if error.is_cancelled() {
            Halt::Cancelled
        } else {
            Halt::Failed {
                job: job.to_string(),
                error,
            }
        }
    }
}

/// Convert `jobs` with at most `min(pool_size, jobs.len())` concurrent workers.
///
/// Sources are deleted only when every job succeeded and the request asks
/// for it. Image bundles delete every image they consumed.
pub async fn run_batch(
    request: &ConversionRequest,
    jobs: Vec<ConversionJob>,
    converter: Arc<dyn Converter>,
    cancel: &CancellationToken,
) -> BatchOutcome {
    if jobs.is_empty() {
        info!("Nothing to do");
        return BatchOutcome::NothingToDo;
    }
    if cancel.is_cancelled() {
        return BatchOutcome::Cancelled;
    }

    let workers = request.effective_pool_size(jobs.len());
    info!("Converting {} file(s) with {} worker(s)", jobs.len(), workers);

    let result = if workers == 1 {
        run_sequential(&jobs, converter.as_ref(), cancel).await
    } else {
        run_pooled(&jobs, converter, workers, cancel).await
    };

    match result {
        Ok(converted) => {
            let deleted = if request.delete_originals() {
                delete_sources(&jobs)
            } else {
                0
            };
            info!("Converted {} file(s)", converted);
            BatchOutcome::Completed { converted, deleted }
        }
        Err(Halt::Cancelled) => {
            info!("Conversion terminated by user");
            BatchOutcome::Cancelled
        }
        Err(Halt::Failed { job, error }) => {
            error!(job = %job, "Conversion failed: {}", error);
            BatchOutcome::Failed { job, error }
        }
    }
}

/// One job at a time, in discovery order, with per-frame progress.
async fn run_sequential(
    jobs: &[ConversionJob],
    converter: &dyn Converter,
    cancel: &CancellationToken,
) -> Result<usize, Halt> {
    let mut converted = 0;
    for job in jobs {
        if cancel.is_cancelled() {
            return Err(Halt::Cancelled);
        }
        converter
            .convert(job, cancel, true)
            .await
            .map_err(|e| Halt::from_error(job.name(), e))?;
        converted += 1;
    }
    Ok(converted)
}

async fn run_pooled(
    jobs: &[ConversionJob],
    converter: Arc<dyn Converter>,
    workers: usize,
    cancel: &CancellationToken,
) -> Result<usize, Halt> {
    let semaphore = Arc::new(Semaphore::new(workers));
    let batch = cancel.child_token();
    let mut set = JoinSet::new();

    for job in jobs.iter().cloned() {
        let sem = semaphore.clone();
        let converter = converter.clone();
        let token = batch.clone();
        set.spawn(async move {
            let result = match sem.acquire_owned().await {
                Ok(_permit) if token.is_cancelled() => Err(ConvertError::Cancelled),
                Ok(_permit) => {
                    let result = converter.convert(&job, &token, false).await;
                    // Stop queued jobs before this permit frees a slot.
                    if result.as_ref().is_err_and(|e| !e.is_cancelled()) {
                        token.cancel();
                    }
                    result
                }
                Err(_) => Err(ConvertError::Cancelled),
            };
            JobOutcome {
                job: job.name().to_string(),
                result,
            }
        });
    }

    let mut converted = 0;
    let halt = loop {
        tokio::select! {
            joined = set.join_next() => match joined {
                None => break None,
                Some(Ok(JobOutcome { result: Ok(_), .. })) => converted += 1,
                Some(Ok(JobOutcome { job, result: Err(e) })) => {
                    // A sibling's failure stopped this job; wait for that failure.
                    if e.is_cancelled() && !cancel.is_cancelled() {
                        continue;
                    }
                    break Some(Halt::from_error(&job, e));
                }
                Some(Err(e)) => {
                    break Some(Halt::Failed {
                        job: "worker".to_string(),
                        error: ConvertError::Worker(e.to_string()),
                    })
                }
            },
            _ = cancel.cancelled() => break Some(Halt::Cancelled),
        }
    };

    match halt {
        None => Ok(converted),
        Some(halt) => {
            debug!("Terminating {} outstanding worker(s)", set.len());
            batch.cancel();
            set.abort_all();
            while set.join_next().await.is_some() {}
            Err(halt)
        }
    }
}

fn delete_sources(jobs: &[ConversionJob]) -> usize {
    let mut deleted = 0;
    for path in jobs.iter().flat_map(|job| job.sources()) {
        match std::fs::remove_file(path) {
            Ok(()) => {
                debug!("Deleted {:?}", path);
                deleted += 1;
            }
            Err(e) => warn!("Failed to delete {:?}: {}", path, e),
        }
    }
    info!("Deleted {} original file(s)", deleted);
    deleted
}
