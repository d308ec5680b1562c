//! fieldconv - batch converter for field camera recordings
//!
//! Discovers recordings that have no `.mp4` counterpart yet, converts them
//! on a bounded pool of workers (optionally drawing a frame counter), and can
//! keep polling a directory until interrupted.

pub mod config;
pub mod convert;
pub mod daemon;
pub mod discovery;
pub mod error;
pub mod job;
pub mod pool;
pub mod shutdown;

pub use error::{ConvertError, Result};
