use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub convert: ConvertConfig,
}

/// Conversion options as written in the config file or given on the
/// command line. Turned into a validated
/// [`ConversionRequest`](super::ConversionRequest) before use.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConvertConfig {
    /// Directory holding the recordings (default: current directory)
    #[serde(default)]
    pub input_dir: Option<PathBuf>,

    /// Directory for converted files (default: the input directory)
    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    /// Source file extension, e.g. ".h264" or ".jpg"
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Draw the running frame number on every frame
    #[serde(default)]
    pub with_frame: bool,

    /// Delete the originals once the whole batch converted successfully
    #[serde(default)]
    pub delete_originals: bool,

    /// Convert files even if an output with the same name exists
    #[serde(default)]
    pub overwrite: bool,

    /// Number of simultaneous conversions (default: 4)
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,

    /// Resize multiplier, 1.0 keeps the recorded size
    #[serde(default = "default_resize")]
    pub resize: f64,

    /// Output frame rate override
    #[serde(default)]
    pub frame_rate: Option<f64>,

    /// Frame rate used when bundling still images into a video (default: 25)
    #[serde(default = "default_image_frame_rate")]
    pub image_frame_rate: u32,

    /// Seconds between directory rechecks; unset converts once and exits
    #[serde(default)]
    pub poll_interval_secs: Option<u64>,

    /// Log progress every N frames when converting one file at a time
    #[serde(default = "default_progress_interval")]
    pub progress_interval: u64,
}

fn default_extension() -> String {
    ".h264".to_string()
}

fn default_pool_size() -> usize {
    4
}

fn default_resize() -> f64 {
    1.0
}

fn default_image_frame_rate() -> u32 {
    25
}

fn default_progress_interval() -> u64 {
    100
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            input_dir: None,
            output_dir: None,
            extension: default_extension(),
            with_frame: false,
            delete_originals: false,
            overwrite: false,
            pool_size: default_pool_size(),
            resize: default_resize(),
            frame_rate: None,
            image_frame_rate: default_image_frame_rate(),
            poll_interval_secs: None,
            progress_interval: default_progress_interval(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ConvertConfig::default();
        assert_eq!(config.extension, ".h264");
        assert_eq!(config.pool_size, 4);
        assert_eq!(config.resize, 1.0);
        assert_eq!(config.image_frame_rate, 25);
        assert_eq!(config.progress_interval, 100);
        assert!(config.poll_interval_secs.is_none());
        assert!(!config.with_frame);
        assert!(!config.delete_originals);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
[convert]
input_dir = "/home/pi/recordings"
with_frame = true
pool_size = 2
"#,
        )
        .unwrap();
        assert_eq!(
            config.convert.input_dir,
            Some(PathBuf::from("/home/pi/recordings"))
        );
        assert!(config.convert.with_frame);
        assert_eq!(config.convert.pool_size, 2);
        assert_eq!(config.convert.extension, ".h264");
        assert_eq!(config.convert.resize, 1.0);
    }

    #[test]
    fn test_empty_file_is_default() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.convert.pool_size, 4);
    }
}
