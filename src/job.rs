//! Conversion jobs and the input → output naming contract.
//!
//! A source is "already converted" exactly when `<output_dir>/<stem>.mp4`
//! exists. Discovery and the converter both derive names through
//! [`output_name`] so they cannot disagree.

use std::path::{Path, PathBuf};

/// Extension of every converted file.
pub const OUTPUT_EXTENSION: &str = "mp4";

/// Extensions treated as video sources.
pub const VIDEO_EXTENSIONS: &[&str] = &["h264", "mp4", "avi", "mkv", "mov"];

/// Extensions treated as still images, bundled into a single video.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Content type of a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Images,
}

impl MediaKind {
    /// Classify a source extension (with or without the leading dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.trim_start_matches('.').to_lowercase();
        if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Video)
        } else if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Images)
        } else {
            None
        }
    }
}

/// Output file name for a source stem.
pub fn output_name(stem: &str) -> String {
    format!("{}.{}", stem, OUTPUT_EXTENSION)
}

/// File stem as a string, empty when the path has none.
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// One unit of conversion work.
///
/// Video jobs hold exactly one input; an image bundle holds the whole sorted
/// image sequence that is merged into one output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionJob {
    inputs: Vec<PathBuf>,
    name: String,
    output: PathBuf,
    kind: MediaKind,
}

impl ConversionJob {
    /// A single video file converted to `<output_dir>/<stem>.mp4`.
    pub fn video(input: PathBuf, output_dir: &Path) -> Self {
        let name = input
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let output = output_dir.join(output_name(&file_stem(&input)));
        Self {
            inputs: vec![input],
            name,
            output,
            kind: MediaKind::Video,
        }
    }

    /// An image sequence merged into `<output_dir>/<bundle>.mp4`.
    pub fn image_bundle(inputs: Vec<PathBuf>, bundle: &str, output_dir: &Path) -> Self {
        Self {
            inputs,
            name: bundle.to_string(),
            output: output_dir.join(output_name(bundle)),
            kind: MediaKind::Images,
        }
    }

    /// First (for videos: only) input path.
    pub fn input(&self) -> &Path {
        self.inputs
            .first()
            .map(PathBuf::as_path)
            .unwrap_or_else(|| Path::new(""))
    }

    /// Every source file consumed by this job.
    pub fn sources(&self) -> &[PathBuf] {
        &self.inputs
    }

    /// Basename used in log lines.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }
}
