//! Single-item conversion.
//!
//! The pool talks to conversions only through the [`Converter`] trait. The
//! production implementation is [`FfmpegConverter`], which offers three
//! strategies:
//!
//! - Fast path: remux (or rescale) with the ffmpeg CLI, no frame access
//! - Annotated path: decode frame by frame and draw the frame number
//! - Image bundling: merge a still-image sequence into one video

mod ffmpeg;
#[cfg(test)]
pub(crate) mod fake;

pub use ffmpeg::FfmpegConverter;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::job::ConversionJob;

/// What a finished conversion produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConvertReport {
    /// Frames written, when the converter touched individual frames.
    pub frames: Option<u64>,
}

/// Converts one job into its output file.
#[async_trait]
pub trait Converter: Send + Sync {
    /// Convert `job`, creating or replacing its output.
    ///
    /// `verbose` enables per-item progress logging; the pool only sets it
    /// when jobs run one at a time so log lines do not interleave.
    ///
    /// Implementations must return [`ConvertError::Cancelled`] (directly or
    /// through the av error) when `cancel` fires.
    ///
    /// [`ConvertError::Cancelled`]: crate::error::ConvertError::Cancelled
    async fn convert(
        &self,
        job: &ConversionJob,
        cancel: &CancellationToken,
        verbose: bool,
    ) -> Result<ConvertReport>;
}
