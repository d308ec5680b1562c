use clap::{Args, Parser, Subcommand};
use fieldconv::config::ConvertConfig;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fieldconv")]
#[command(author, version, about = "Batch converter for field camera recordings")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert recordings to mp4, once or by polling a directory
    Convert(ConvertArgs),

    /// Check that required external tools are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}

/// Command line overrides for the `[convert]` config table.
#[derive(Args, Debug, Default)]
pub struct ConvertArgs {
    /// Directory with the recordings (default: current directory)
    #[arg(short = 'i', long = "indir")]
    pub input_dir: Option<PathBuf>,

    /// Directory for converted files (default: the input directory)
    #[arg(short = 'o', long = "outdir")]
    pub output_dir: Option<PathBuf>,

    /// Source file type, e.g. .h264, .avi or .jpg
    #[arg(short = 't', long = "type")]
    pub extension: Option<String>,

    /// Draw the frame number on every frame
    #[arg(short = 'w', long = "withframe")]
    pub with_frame: bool,

    /// Delete the originals after a fully successful batch
    #[arg(short = 'd', long = "delete")]
    pub delete_originals: bool,

    /// Convert even when the output already exists
    #[arg(long)]
    pub overwrite: bool,

    /// Number of simultaneous conversions
    #[arg(short = 'p', long = "pools")]
    pub pool_size: Option<usize>,

    /// Resize multiplier (1.0 keeps the recorded size)
    #[arg(short = 'r', long = "resizeval")]
    pub resize: Option<f64>,

    /// Output frame rate override
    #[arg(long = "fps")]
    pub frame_rate: Option<f64>,

    /// Frame rate for videos made from still images
    #[arg(short = 'f', long = "imgfps")]
    pub image_frame_rate: Option<u32>,

    /// Recheck the input directory every N seconds until interrupted
    #[arg(short = 's', long = "sleeptime")]
    pub poll_interval_secs: Option<u64>,
}

impl ConvertArgs {
    /// Layer the flags that were given on top of `config`.
    pub fn apply(self, config: &mut ConvertConfig) {
        if let Some(dir) = self.input_dir {
            config.input_dir = Some(dir);
        }
        if let Some(dir) = self.output_dir {
            config.output_dir = Some(dir);
        }
        if let Some(ext) = self.extension {
            config.extension = ext;
        }
        config.with_frame |= self.with_frame;
        config.delete_originals |= self.delete_originals;
        config.overwrite |= self.overwrite;
        if let Some(n) = self.pool_size {
            config.pool_size = n;
        }
        if let Some(r) = self.resize {
            config.resize = r;
        }
        if self.frame_rate.is_some() {
            config.frame_rate = self.frame_rate;
        }
        if let Some(fps) = self.image_frame_rate {
            config.image_frame_rate = fps;
        }
        if self.poll_interval_secs.is_some() {
            config.poll_interval_secs = self.poll_interval_secs;
        }
    }
}
