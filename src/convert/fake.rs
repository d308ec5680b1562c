//! Scripted converter for pool and daemon tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::{ConvertReport, Converter};
use crate::error::{ConvertError, Result};
use crate::job::ConversionJob;

/// Writes a placeholder output after `delay`, or fails for the job named in
/// `fail_on`.
#[derive(Default)]
pub struct FakeConverter {
    pub delay: Duration,
    pub fail_on: Option<String>,
    pub calls: AtomicUsize,
    active: AtomicUsize,
    pub peak: AtomicUsize,
    pub verbose_calls: AtomicUsize,
    pub converted: Mutex<Vec<String>>,
}

impl FakeConverter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing_on(mut self, name: &str) -> Self {
        self.fail_on = Some(name.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn converted(&self) -> Vec<String> {
        let mut names = self.converted.lock().unwrap().clone();
        names.sort();
        names
    }
}

#[async_trait]
impl Converter for FakeConverter {
    async fn convert(
        &self,
        job: &ConversionJob,
        cancel: &CancellationToken,
        verbose: bool,
    ) -> Result<ConvertReport> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if verbose {
            self.verbose_calls.fetch_add(1, Ordering::SeqCst);
        }
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let finished = tokio::select! {
            _ = tokio::time::sleep(self.delay) => true,
            _ = cancel.cancelled() => false,
        };
        self.active.fetch_sub(1, Ordering::SeqCst);

        if !finished {
            return Err(ConvertError::Cancelled);
        }
        if self.fail_on.as_deref() == Some(job.name()) {
            return Err(fieldconv_av::Error::tool_failed("ffmpeg", "exit status: 1").into());
        }

        std::fs::write(job.output(), b"mp4")?;
        self.converted.lock().unwrap().push(job.name().to_string());
        Ok(ConvertReport {
            frames: Some(job.sources().len() as u64),
        })
    }
}
