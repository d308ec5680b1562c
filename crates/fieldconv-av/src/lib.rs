//! # fieldconv-av
//!
//! External media tool plumbing for fieldconv.
//!
//! This crate provides functionality for:
//! - Detecting ffmpeg/ffprobe
//! - Probing frame size and frame rate of recorded clips
//! - Running cancellable ffmpeg invocations (remux / rescale)
//! - Streaming raw frames through ffmpeg for per-frame editing
//! - Drawing a frame counter onto frames
//!
//! ## Features
//!
//! - `tracing` (default) - Enable tracing support

mod command;
mod error;
pub mod frames;
pub mod overlay;
pub mod probe;
pub mod tools;
pub mod transcode;

// Re-exports
pub use command::{ToolCommand, ToolOutput};
pub use error::{Error, Result};
pub use frames::{FrameReader, FrameWriter};
pub use probe::{probe_video, VideoParams};
pub use tools::{check_tool, check_tools, require_tool, ToolInfo};
pub use transcode::{transcode, TranscodeOptions};
