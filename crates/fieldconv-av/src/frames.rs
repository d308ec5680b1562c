//! Raw frame pipes to and from ffmpeg, plus per-frame resizing.
//!
//! The annotated conversion path decodes a source to packed `rgb24` frames on
//! ffmpeg's stdout, edits each frame in memory and feeds it to a second ffmpeg
//! process that encodes H.264 into an MP4 container.

use std::path::Path;
use std::process::{ExitStatus, Stdio};

use image::imageops::FilterType;
use image::RgbImage;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::task::JoinHandle;

use crate::{Error, Result};

/// Output size for a resize multiplier: `round(w * r) x round(h * r)`,
/// never smaller than one pixel.
pub fn scaled_dimensions(width: u32, height: u32, resize: f64) -> (u32, u32) {
    let scale = |v: u32| ((v as f64 * resize).round() as u32).max(1);
    (scale(width), scale(height))
}

/// Whether a multiplier actually changes the frame size.
pub fn is_identity_scale(resize: f64) -> bool {
    (resize - 1.0).abs() < f64::EPSILON
}

/// Resize `frame` by `resize`; a multiplier of 1 returns the frame untouched.
pub fn resize_frame(frame: RgbImage, resize: f64) -> RgbImage {
    if is_identity_scale(resize) {
        return frame;
    }
    let (width, height) = scaled_dimensions(frame.width(), frame.height(), resize);
    image::imageops::resize(&frame, width, height, FilterType::Triangle)
}

/// Stretch `frame` to exactly `width x height` if it is not already that size.
pub fn fit_frame(frame: RgbImage, width: u32, height: u32) -> RgbImage {
    if frame.dimensions() == (width, height) {
        return frame;
    }
    image::imageops::resize(&frame, width, height, FilterType::Triangle)
}

/// Decode a still image into an RGB frame.
pub fn load_image(path: &Path) -> Result<RgbImage> {
    if !path.exists() {
        return Err(Error::file_not_found(path));
    }
    Ok(image::open(path)?.to_rgb8())
}

/// Arguments for an ffmpeg process decoding `input` to raw rgb24 on stdout.
pub fn reader_args(input: &Path) -> Vec<String> {
    vec![
        "-v".into(),
        "error".into(),
        "-i".into(),
        input.to_string_lossy().to_string(),
        "-vsync".into(),
        "passthrough".into(),
        "-f".into(),
        "rawvideo".into(),
        "-pix_fmt".into(),
        "rgb24".into(),
        "pipe:1".into(),
    ]
}

/// Arguments for an ffmpeg process encoding raw rgb24 from stdin to `output`.
///
/// libx264 with yuv420p needs even dimensions, so odd sizes lose their last
/// row or column.
pub fn writer_args(output: &Path, width: u32, height: u32, frame_rate: f64) -> Vec<String> {
    vec![
        "-y".into(),
        "-v".into(),
        "error".into(),
        "-f".into(),
        "rawvideo".into(),
        "-pix_fmt".into(),
        "rgb24".into(),
        "-s".into(),
        format!("{}x{}", width, height),
        "-r".into(),
        format!("{}", frame_rate),
        "-i".into(),
        "pipe:0".into(),
        "-vf".into(),
        "crop=trunc(iw/2)*2:trunc(ih/2)*2".into(),
        "-c:v".into(),
        "libx264".into(),
        "-pix_fmt".into(),
        "yuv420p".into(),
        output.to_string_lossy().to_string(),
    ]
}

/// Bytes of ffmpeg's stderr kept for error messages.
const STDERR_TAIL: usize = 8 * 1024;

/// Read `child`'s stderr to the end on a separate task, keeping only the
/// last [`STDERR_TAIL`] bytes.
///
/// A damaged recording makes the decoder log a line per bad slice; an
/// undrained pipe fills up and blocks ffmpeg before its next frame.
fn drain_stderr(child: &mut Child) -> JoinHandle<String> {
    let stderr = child.stderr.take();
    tokio::spawn(async move {
        let Some(mut stderr) = stderr else {
            return String::new();
        };
        let mut tail = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            match stderr.read(&mut chunk).await {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    tail.extend_from_slice(&chunk[..n]);
                    if tail.len() > STDERR_TAIL {
                        tail.drain(..tail.len() - STDERR_TAIL);
                    }
                }
            }
        }
        String::from_utf8_lossy(&tail).trim().to_string()
    })
}

async fn exit_error(role: &str, status: ExitStatus, stderr: JoinHandle<String>) -> Error {
    let stderr = stderr.await.unwrap_or_default();
    Error::tool_failed(
        "ffmpeg",
        format!("{} exited with status {}: {}", role, status, stderr),
    )
}

/// Reads decoded frames from an ffmpeg child process.
pub struct FrameReader {
    child: Child,
    stdout: BufReader<ChildStdout>,
    stderr: JoinHandle<String>,
    width: u32,
    height: u32,
}

impl FrameReader {
    /// Spawn ffmpeg decoding `input`, whose frames are `width x height`.
    pub fn spawn(input: &Path, width: u32, height: u32) -> Result<Self> {
        if !input.exists() {
            return Err(Error::file_not_found(input));
        }

        let mut command = Command::new("ffmpeg");
        command.args(reader_args(input));
        Self::from_command(command, width, height)
    }

    fn from_command(mut command: Command, width: u32, height: u32) -> Result<Self> {
        let program = command.as_std().get_program().to_string_lossy().to_string();
        let mut child = command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::spawn(&program, e))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::tool_failed(&program, "reader stdout unavailable"))?;
        let stderr = drain_stderr(&mut child);

        Ok(Self {
            child,
            stdout: BufReader::new(stdout),
            stderr,
            width,
            height,
        })
    }

    /// Read the next frame, or `None` at end of stream.
    pub async fn read_frame(&mut self) -> Result<Option<RgbImage>> {
        let mut buf = vec![0u8; self.width as usize * self.height as usize * 3];
        match self.stdout.read_exact(&mut buf).await {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(Error::Io(e)),
        }

        RgbImage::from_raw(self.width, self.height, buf)
            .map(Some)
            .ok_or_else(|| Error::InvalidInput("frame buffer size mismatch".to_string()))
    }

    /// Wait for the decoder to exit, failing if it reported an error.
    pub async fn finish(mut self) -> Result<()> {
        drop(self.stdout);
        let status = self.child.wait().await?;
        if !status.success() {
            return Err(exit_error("decoder", status, self.stderr).await);
        }
        Ok(())
    }
}

/// Writes frames into an ffmpeg child process encoding an MP4.
pub struct FrameWriter {
    child: Child,
    stdin: BufWriter<ChildStdin>,
    stderr: JoinHandle<String>,
    width: u32,
    height: u32,
    frames: u64,
}

impl FrameWriter {
    /// Spawn ffmpeg encoding `width x height` frames at `frame_rate` to `output`.
    pub fn spawn(output: &Path, width: u32, height: u32, frame_rate: f64) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidInput(format!(
                "invalid frame size {}x{}",
                width, height
            )));
        }
        if !(frame_rate > 0.0 && frame_rate.is_finite()) {
            return Err(Error::InvalidInput(format!(
                "invalid frame rate {}",
                frame_rate
            )));
        }

        let mut command = Command::new("ffmpeg");
        command.args(writer_args(output, width, height, frame_rate));
        Self::from_command(command, width, height)
    }

    fn from_command(mut command: Command, width: u32, height: u32) -> Result<Self> {
        let program = command.as_std().get_program().to_string_lossy().to_string();
        let mut child = command
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::spawn(&program, e))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::tool_failed(&program, "writer stdin unavailable"))?;
        let stderr = drain_stderr(&mut child);

        Ok(Self {
            child,
            stdin: BufWriter::new(stdin),
            stderr,
            width,
            height,
            frames: 0,
        })
    }

    /// Append one frame.
    pub async fn write_frame(&mut self, frame: &RgbImage) -> Result<()> {
        if frame.dimensions() != (self.width, self.height) {
            return Err(Error::InvalidInput(format!(
                "frame is {}x{}, writer expects {}x{}",
                frame.width(),
                frame.height(),
                self.width,
                self.height
            )));
        }

        self.stdin
            .write_all(frame.as_raw())
            .await
            .map_err(|e| Error::tool_failed("ffmpeg", format!("encoder pipe closed: {}", e)))?;
        self.frames += 1;
        Ok(())
    }

    /// Close the input pipe and wait for the encoder; returns frames written.
    pub async fn finish(mut self) -> Result<u64> {
        self.stdin.flush().await?;
        self.stdin.shutdown().await?;
        drop(self.stdin);

        let status = self.child.wait().await?;
        if !status.success() {
            return Err(exit_error("encoder", status, self.stderr).await);
        }
        Ok(self.frames)
    }
}
