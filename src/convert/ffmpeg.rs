use std::path::Path;
use std::time::Instant;

use async_trait::async_trait;
use fieldconv_av::frames::{fit_frame, load_image, resize_frame, scaled_dimensions};
use fieldconv_av::overlay::draw_frame_number;
use fieldconv_av::{probe_video, transcode, FrameReader, FrameWriter, TranscodeOptions};
use image::RgbImage;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{ConvertReport, Converter};
use crate::config::ConversionRequest;
use crate::error::{ConvertError, Result};
use crate::job::{ConversionJob, MediaKind};

/// Converter backed by the ffmpeg and ffprobe command line tools.
#[derive(Debug, Clone)]
pub struct FfmpegConverter {
    with_frame: bool,
    resize: f64,
    frame_rate: Option<f64>,
    image_frame_rate: f64,
    progress_interval: u64,
}

impl FfmpegConverter {
    pub fn from_request(request: &ConversionRequest) -> Self {
        Self {
            with_frame: request.with_frame(),
            resize: request.resize(),
            frame_rate: request.frame_rate(),
            image_frame_rate: request.image_frame_rate(),
            progress_interval: request.progress_interval(),
        }
    }

    /// Remux or rescale through a single ffmpeg run.
    async fn convert_fast(
        &self,
        job: &ConversionJob,
        cancel: &CancellationToken,
    ) -> Result<ConvertReport> {
        let opts = TranscodeOptions {
            resize: self.resize,
            frame_rate: self.frame_rate,
        };
        transcode(job.input(), job.output(), &opts, cancel).await?;
        Ok(ConvertReport::default())
    }

    /// Re-encode frame by frame, drawing the 1-based frame number.
    async fn convert_annotated(
        &self,
        job: &ConversionJob,
        cancel: &CancellationToken,
        verbose: bool,
    ) -> Result<ConvertReport> {
        let params = probe_video(job.input(), cancel).await?;
        let frame_rate = self.frame_rate.unwrap_or(params.frame_rate);
        let (width, height) = scaled_dimensions(params.width, params.height, self.resize);

        debug!(
            job = %job.name(),
            "Source {}x{} @ {:.3} fps, writing {}x{} @ {:.3} fps",
            params.width,
            params.height,
            params.frame_rate,
            width,
            height,
            frame_rate
        );

        let mut reader = FrameReader::spawn(job.input(), params.width, params.height)?;
        let mut writer = FrameWriter::spawn(job.output(), width, height, frame_rate)?;
        let mut frame_number = 0u64;

        loop {
            let frame = tokio::select! {
                frame = reader.read_frame() => frame?,
                _ = cancel.cancelled() => return Err(ConvertError::Cancelled),
            };
            let Some(frame) = frame else {
                break;
            };

            frame_number += 1;
            let resize = self.resize;
            let frame = blocking(move || annotate(frame, resize, frame_number)).await?;
            writer.write_frame(&frame).await?;

            if verbose && frame_number % self.progress_interval == 0 {
                info!(job = %job.name(), frame = frame_number, "Converting");
            }
        }

        reader.finish().await?;
        let written = writer.finish().await?;
        Ok(ConvertReport {
            frames: Some(written),
        })
    }

    /// Merge a sorted still-image sequence into one video.
    async fn convert_images(
        &self,
        job: &ConversionJob,
        cancel: &CancellationToken,
        verbose: bool,
    ) -> Result<ConvertReport> {
        let sources = job.sources();
        let first = sources
            .first()
            .ok_or_else(|| fieldconv_av::Error::InvalidInput("image bundle is empty".into()))?;

        debug!(job = %job.name(), "Bundling {} images", sources.len());

        let resize = self.resize;
        let path = first.clone();
        let first = blocking(move || load_scaled(&path, resize, None)).await??;
        let (width, height) = first.dimensions();
        let mut writer = FrameWriter::spawn(job.output(), width, height, self.image_frame_rate)?;
        writer.write_frame(&first).await?;

        for (i, path) in sources.iter().enumerate().skip(1) {
            if cancel.is_cancelled() {
                return Err(ConvertError::Cancelled);
            }

            let path = path.clone();
            let frame =
                blocking(move || load_scaled(&path, resize, Some((width, height)))).await??;
            writer.write_frame(&frame).await?;

            let done = i as u64 + 1;
            if verbose && done % self.progress_interval == 0 {
                info!(job = %job.name(), frame = done, "Converting");
            }
        }

        let written = writer.finish().await?;
        Ok(ConvertReport {
            frames: Some(written),
        })
    }
}

#[async_trait]
impl Converter for FfmpegConverter {
    async fn convert(
        &self,
        job: &ConversionJob,
        cancel: &CancellationToken,
        verbose: bool,
    ) -> Result<ConvertReport> {
        if cancel.is_cancelled() {
            return Err(ConvertError::Cancelled);
        }

        info!(job = %job.name(), "Start converting");
        let started = Instant::now();
        let mut partial = PartialOutput::new(job.output());

        let report = match (job.kind(), self.with_frame) {
            (MediaKind::Images, _) => self.convert_images(job, cancel, verbose).await?,
            (MediaKind::Video, true) => self.convert_annotated(job, cancel, verbose).await?,
            (MediaKind::Video, false) => self.convert_fast(job, cancel).await?,
        };

        partial.keep();
        match report.frames {
            Some(frames) => info!(
                job = %job.name(),
                "Finished converting {} frames in {:.1}s",
                frames,
                started.elapsed().as_secs_f64()
            ),
            None => info!(
                job = %job.name(),
                "Finished converting in {:.1}s",
                started.elapsed().as_secs_f64()
            ),
        }
        Ok(report)
    }
}

/// Run CPU-bound frame work on the blocking pool, off the async workers.
async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ConvertError::Worker(e.to_string()))
}

fn annotate(frame: RgbImage, resize: f64, frame_number: u64) -> RgbImage {
    let mut frame = resize_frame(frame, resize);
    draw_frame_number(&mut frame, frame_number);
    frame
}

/// Load one still, apply the resize multiplier and, for every image after the
/// first, stretch it to the bundle's frame size.
fn load_scaled(
    path: &Path,
    resize: f64,
    fit: Option<(u32, u32)>,
) -> fieldconv_av::Result<RgbImage> {
    let frame = resize_frame(load_image(path)?, resize);
    match fit {
        Some((width, height)) if frame.dimensions() != (width, height) => {
            debug!("Scaling {:?} to {}x{}", path, width, height);
            Ok(fit_frame(frame, width, height))
        }
        _ => Ok(frame),
    }
}

/// Removes a half-written output unless the conversion finished, so that a
/// failed or cancelled file is picked up again by the next discovery pass.
struct PartialOutput<'a> {
    path: &'a Path,
    armed: bool,
}

impl<'a> PartialOutput<'a> {
    fn new(path: &'a Path) -> Self {
        Self { path, armed: true }
    }

    fn keep(&mut self) {
        self.armed = false;
    }
}

impl Drop for PartialOutput<'_> {
    fn drop(&mut self) {
        if self.armed && self.path.exists() {
            debug!("Removing partial output {:?}", self.path);
            let _ = std::fs::remove_file(self.path);
        }
    }
}
