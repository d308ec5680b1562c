//! Validated conversion request.

use std::path::{Path, PathBuf};
use std::time::Duration;

use super::ConvertConfig;
use crate::error::{ConvertError, Result};
use crate::job::{MediaKind, OUTPUT_EXTENSION};

/// A fully validated set of conversion options.
///
/// Built once per invocation by [`ConversionRequest::from_config`]; the
/// polling daemon reuses the same request for every pass.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    input_dir: PathBuf,
    output_dir: PathBuf,
    extension: String,
    kind: MediaKind,
    with_frame: bool,
    delete_originals: bool,
    overwrite: bool,
    pool_size: usize,
    resize: f64,
    frame_rate: Option<f64>,
    image_frame_rate: f64,
    poll_interval: Option<Duration>,
    progress_interval: u64,
}

/// Lower-case the extension and make sure it carries a leading dot.
pub fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim().trim_start_matches('.').to_lowercase();
    format!(".{}", ext)
}

impl ConvertConfig {
    /// Check the options that do not touch the filesystem.
    pub fn check(&self) -> Result<()> {
        if self.pool_size == 0 {
            return Err(ConvertError::Config("pool size must be at least 1".into()));
        }
        if !(self.resize.is_finite() && self.resize > 0.0) {
            return Err(ConvertError::Config(format!(
                "resize multiplier must be positive, got {}",
                self.resize
            )));
        }
        if let Some(fps) = self.frame_rate {
            if !(fps.is_finite() && fps > 0.0) {
                return Err(ConvertError::Config(format!(
                    "frame rate must be positive, got {}",
                    fps
                )));
            }
        }
        if self.image_frame_rate == 0 {
            return Err(ConvertError::Config("image frame rate must be positive".into()));
        }
        if self.progress_interval == 0 {
            return Err(ConvertError::Config("progress interval must be positive".into()));
        }
        if MediaKind::from_extension(&self.extension).is_none() {
            return Err(ConvertError::Config(format!(
                "unsupported media type: {}",
                self.extension
            )));
        }
        Ok(())
    }
}

impl ConversionRequest {
    /// Validate `config` and resolve its directories.
    ///
    /// The input directory must exist. A missing output directory is created.
    ///
    /// # Errors
    ///
    /// - [`ConvertError::Precondition`] if the input directory does not exist
    ///   or the output directory cannot be created.
    /// - [`ConvertError::Config`] for invalid options, including a source
    ///   type of `.mp4` converted into its own directory.
    pub fn from_config(config: &ConvertConfig) -> Result<Self> {
        config.check()?;

        let input_dir = match &config.input_dir {
            Some(dir) if !dir.as_os_str().is_empty() => dir.clone(),
            _ => std::env::current_dir()?,
        };
        if !input_dir.is_dir() {
            return Err(ConvertError::Precondition(format!(
                "input directory does not exist: {}",
                input_dir.display()
            )));
        }

        let output_dir = match &config.output_dir {
            Some(dir) if !dir.as_os_str().is_empty() => dir.clone(),
            _ => input_dir.clone(),
        };
        if !output_dir.is_dir() {
            std::fs::create_dir_all(&output_dir).map_err(|e| {
                ConvertError::Precondition(format!(
                    "cannot create output directory {}: {}",
                    output_dir.display(),
                    e
                ))
            })?;
            tracing::info!("Created output directory {:?}", output_dir);
        }

        let extension = normalize_extension(&config.extension);
        let kind = MediaKind::from_extension(&extension)
            .ok_or_else(|| ConvertError::Config(format!("unsupported media type: {}", extension)))?;

        if extension.trim_start_matches('.') == OUTPUT_EXTENSION
            && same_directory(&input_dir, &output_dir)
        {
            return Err(ConvertError::Config(format!(
                "converting {} files into their own directory would overwrite the sources",
                extension
            )));
        }

        Ok(Self {
            input_dir,
            output_dir,
            extension,
            kind,
            with_frame: config.with_frame,
            delete_originals: config.delete_originals,
            overwrite: config.overwrite,
            pool_size: config.pool_size,
            resize: config.resize,
            frame_rate: config.frame_rate,
            image_frame_rate: config.image_frame_rate as f64,
            poll_interval: config
                .poll_interval_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
            progress_interval: config.progress_interval,
        })
    }

    pub fn input_dir(&self) -> &Path {
        &self.input_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Source extension including the leading dot.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn with_frame(&self) -> bool {
        self.with_frame
    }

    pub fn delete_originals(&self) -> bool {
        self.delete_originals
    }

    pub fn overwrite(&self) -> bool {
        self.overwrite
    }

    /// Number of workers for a batch of `jobs`: `min(pool_size, jobs)`, at least 1.
    pub fn effective_pool_size(&self, jobs: usize) -> usize {
        self.pool_size.min(jobs).max(1)
    }

    pub fn resize(&self) -> f64 {
        self.resize
    }

    pub fn frame_rate(&self) -> Option<f64> {
        self.frame_rate
    }

    pub fn image_frame_rate(&self) -> f64 {
        self.image_frame_rate
    }

    /// Delay between passes in polling mode; `None` runs a single pass.
    /// An interval of zero seconds also means a single pass.
    pub fn poll_interval(&self) -> Option<Duration> {
        self.poll_interval
    }

    pub fn progress_interval(&self) -> u64 {
        self.progress_interval
    }
}

fn same_directory(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
