//! Polling loop: discovery and conversion, repeated until interrupted.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ConversionRequest;
use crate::convert::Converter;
use crate::discovery::discover_jobs;
use crate::error::Result;
use crate::pool::{run_batch, BatchOutcome};

/// How [`run`] returned.
#[derive(Debug)]
pub enum DaemonExit {
    /// Single-pass mode ran its one batch.
    Finished(BatchOutcome),
    /// The cancellation token fired, either mid-batch or while sleeping.
    Interrupted,
}

/// Run one pass, or keep polling when the request has a poll interval.
///
/// A failed batch ends single-pass mode with [`DaemonExit::Finished`]; in
/// polling mode it is logged and the next pass tries again. Cancellation
/// always ends the loop cleanly with [`DaemonExit::Interrupted`].
///
/// # Errors
///
/// Discovery errors, such as the input directory disappearing.
pub async fn run(
    request: &ConversionRequest,
    converter: Arc<dyn Converter>,
    cancel: &CancellationToken,
) -> Result<DaemonExit> {
    let mut pass = 0u64;
    let mut streak = FailureStreak::default();
    loop {
        if cancel.is_cancelled() {
            info!("Interrupted, stopping");
            return Ok(DaemonExit::Interrupted);
        }

        pass += 1;
        debug!(pass, "Checking {:?} for new files", request.input_dir());
        let jobs = discover_jobs(request)?;
        let outcome = run_batch(request, jobs, converter.clone(), cancel).await;

        if matches!(outcome, BatchOutcome::Cancelled) {
            return Ok(DaemonExit::Interrupted);
        }
        let Some(interval) = request.poll_interval() else {
            return Ok(DaemonExit::Finished(outcome));
        };
        match &outcome {
            BatchOutcome::Failed { job, error } => {
                warn!(job = %job, "Batch failed ({}), retrying in {:?}", error, interval);
                let passes = streak.record(job);
                if passes > 1 {
                    warn!(
                        job = %job,
                        passes,
                        "Same file failed again; files after it are not converted until it is fixed or removed"
                    );
                }
            }
            _ => streak.clear(),
        }

        info!("Rechecking in {}s", interval.as_secs());
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = cancel.cancelled() => {
                info!("Interrupted while waiting, stopping");
                return Ok(DaemonExit::Interrupted);
            }
        }
    }
}

/// Consecutive passes failing on the same job.
#[derive(Debug, Default)]
struct FailureStreak {
    job: Option<String>,
    passes: u32,
}

impl FailureStreak {
    /// Count a failed pass; returns how many passes in a row `job` has failed.
    fn record(&mut self, job: &str) -> u32 {
        if self.job.as_deref() == Some(job) {
            self.passes += 1;
        } else {
            self.job = Some(job.to_string());
            self.passes = 1;
        }
        self.passes
    }

    fn clear(&mut self) {
        self.job = None;
        self.passes = 0;
    }
}
