//! Fast-path conversion: container remux or rescale through the ffmpeg CLI.

use std::path::Path;

use tokio_util::sync::CancellationToken;

use crate::frames::is_identity_scale;
use crate::{Error, Result, ToolCommand};

/// Options for a fast-path conversion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TranscodeOptions {
    /// Resize multiplier; 1.0 copies the video stream untouched.
    pub resize: f64,
    /// Input frame rate override, mainly for raw H.264 which carries none.
    pub frame_rate: Option<f64>,
}

impl Default for TranscodeOptions {
    fn default() -> Self {
        Self {
            resize: 1.0,
            frame_rate: None,
        }
    }
}

/// Build the ffmpeg invocation for a fast-path conversion.
pub fn transcode_command(input: &Path, output: &Path, opts: &TranscodeOptions) -> ToolCommand {
    let mut cmd = ToolCommand::new("ffmpeg");

    if let Some(fps) = opts.frame_rate {
        cmd.arg("-r").arg(format!("{}", fps));
    }
    cmd.arg("-i").arg(input);

    if is_identity_scale(opts.resize) {
        cmd.args(["-c:v", "copy"]);
    } else {
        // Width rounded to an even number, height follows the aspect ratio.
        cmd.arg("-vf")
            .arg(format!("scale=round(iw*{}/2)*2:-2", opts.resize));
    }

    cmd.args(["-y", "-nostats", "-loglevel", "error"]).arg(output);
    cmd
}

/// Convert `input` into `output`, waiting for ffmpeg to finish.
///
/// # Errors
///
/// - [`Error::FileNotFound`] if the input is missing.
/// - [`Error::ToolFailed`] if ffmpeg exits non-zero.
/// - [`Error::Cancelled`] if `cancel` fires; ffmpeg is killed.
pub async fn transcode(
    input: &Path,
    output: &Path,
    opts: &TranscodeOptions,
    cancel: &CancellationToken,
) -> Result<()> {
    if !input.exists() {
        return Err(Error::file_not_found(input));
    }

    let cmd = transcode_command(input, output, opts);

    #[cfg(feature = "tracing")]
    tracing::debug!("FFmpeg args: {:?}", cmd.get_args());

    cmd.execute(cancel).await?;
    Ok(())
}
