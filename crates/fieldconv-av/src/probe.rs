//! FFprobe-based video parameter probing.

use crate::{Error, Result, ToolCommand};
use serde::Deserialize;
use std::path::Path;
use tokio_util::sync::CancellationToken;

/// Frame rate assumed when ffprobe cannot report one (raw H.264 streams
/// written by the camera carry no container timing).
pub const DEFAULT_FRAME_RATE: f64 = 25.0;

/// Geometry and timing of the first video stream of a file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoParams {
    pub width: u32,
    pub height: u32,
    pub frame_rate: f64,
    /// Frame count as reported by the container, if any.
    pub frame_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: String,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    nb_frames: Option<String>,
}

/// Probe the first video stream of `path` using ffprobe.
pub async fn probe_video(path: &Path, cancel: &CancellationToken) -> Result<VideoParams> {
    if !path.exists() {
        return Err(Error::file_not_found(path));
    }

    let output = ToolCommand::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-print_format",
            "json",
            "-show_streams",
        ])
        .arg(path)
        .execute(cancel)
        .await?;

    let parsed: FfprobeOutput = serde_json::from_str(&output.stdout)?;
    parse_video_params(parsed)
}

fn parse_video_params(output: FfprobeOutput) -> Result<VideoParams> {
    let stream = output
        .streams
        .into_iter()
        .find(|s| s.codec_type == "video")
        .ok_or_else(|| Error::parse_error("ffprobe", "no video stream"))?;

    let (width, height) = match (stream.width, stream.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
        _ => return Err(Error::parse_error("ffprobe", "missing frame dimensions")),
    };

    let frame_rate = stream
        .r_frame_rate
        .as_deref()
        .and_then(parse_frame_rate)
        .or_else(|| stream.avg_frame_rate.as_deref().and_then(parse_frame_rate))
        .unwrap_or(DEFAULT_FRAME_RATE);

    Ok(VideoParams {
        width,
        height,
        frame_rate,
        frame_count: stream.nb_frames.and_then(|n| n.parse().ok()),
    })
}

/// Parse an ffprobe rate such as `30000/1001` or `25`. Zero rates are `None`.
fn parse_frame_rate(rate_str: &str) -> Option<f64> {
    let rate = match rate_str.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.parse().ok()?;
            let den: f64 = den.parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => rate_str.parse().ok()?,
    };
    (rate > 0.0 && rate.is_finite()).then_some(rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_frame_rate() {
        assert_eq!(parse_frame_rate("24000/1001"), Some(23.976023976023978));
        assert_eq!(parse_frame_rate("30/1"), Some(30.0));
        assert_eq!(parse_frame_rate("25"), Some(25.0));
        assert_eq!(parse_frame_rate("0/0"), None);
        assert_eq!(parse_frame_rate("invalid"), None);
    }

    #[test]
    fn test_parse_video_params() {
        let json = r#"{"streams":[{"codec_type":"video","width":1640,"height":1232,
            "r_frame_rate":"30/1","avg_frame_rate":"0/0","nb_frames":"900"}]}"#;
        let params = parse_video_params(serde_json::from_str(json).unwrap()).unwrap();
        assert_eq!(params.width, 1640);
        assert_eq!(params.height, 1232);
        assert_eq!(params.frame_rate, 30.0);
        assert_eq!(params.frame_count, Some(900));
    }

    #[test]
    fn test_raw_stream_falls_back_to_default_rate() {
        let json = r#"{"streams":[{"codec_type":"video","width":640,"height":480,
            "r_frame_rate":"0/0"}]}"#;
        let params = parse_video_params(serde_json::from_str(json).unwrap()).unwrap();
        assert_eq!(params.frame_rate, DEFAULT_FRAME_RATE);
        assert_eq!(params.frame_count, None);
    }

    #[test]
    fn test_no_video_stream() {
        let json = r#"{"streams":[{"codec_type":"audio"}]}"#;
        let err = parse_video_params(serde_json::from_str(json).unwrap()).unwrap_err();
        assert!(matches!(err, Error::ParseError { .. }));
    }

    #[tokio::test]
    async fn test_probe_missing_file() {
        let cancel = CancellationToken::new();
        let err = probe_video(Path::new("/nonexistent/clip.h264"), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::FileNotFound { .. }));
    }
}
