//! Lookup of the ffmpeg binaries a conversion shells out to.

use crate::{Error, Result};
use std::path::PathBuf;
use std::process::Command;

/// What `check-tools` reports for one ffmpeg binary.
#[derive(Debug, Clone)]
pub struct ToolInfo {
    pub name: String,
    /// The binary ran `-version` and exited cleanly.
    pub available: bool,
    /// First line of the `-version` banner, e.g. `ffmpeg version 6.1.1`.
    pub version: Option<String>,
    /// Resolved location on `PATH`.
    pub path: Option<PathBuf>,
}

/// Run `name -version` and report whether a conversion could use it.
///
/// A binary that is on `PATH` but fails to start (missing shared libraries
/// on a half-installed Raspberry Pi image, say) counts as unavailable.
///
/// # Example
///
/// ```no_run
/// use fieldconv_av::check_tool;
///
/// if !check_tool("ffmpeg").available {
///     eprintln!("install ffmpeg before converting recordings");
/// }
/// ```
pub fn check_tool(name: &str) -> ToolInfo {
    let result = Command::new(name).arg("-version").output();

    match result {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .map(|s| s.to_string());

            ToolInfo {
                name: name.to_string(),
                available: true,
                version,
                path: which::which(name).ok(),
            }
        }
        _ => ToolInfo {
            name: name.to_string(),
            available: false,
            version: None,
            path: None,
        },
    }
}

/// Both binaries a conversion needs: ffmpeg encodes, ffprobe reads frame size and rate.
pub fn check_tools() -> Vec<ToolInfo> {
    vec![check_tool("ffmpeg"), check_tool("ffprobe")]
}

/// Path of `name` on `PATH`, or [`Error::ToolNotFound`].
pub fn require_tool(name: &str) -> Result<PathBuf> {
    which::which(name).map_err(|_| Error::tool_not_found(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_tool_not_found() {
        let info = check_tool("nonexistent_tool_12345");
        assert!(!info.available);
        assert!(info.version.is_none());
        assert!(info.path.is_none());
    }

    #[test]
    fn test_check_tool_failing_binary_is_unavailable() {
        if which::which("false").is_err() {
            return;
        }
        let info = check_tool("false");
        assert!(!info.available);
        assert!(info.path.is_none());
    }

    #[test]
    fn test_require_tool_not_found() {
        let err = require_tool("nonexistent_tool_12345").unwrap_err();
        assert!(matches!(err, Error::ToolNotFound { .. }));
        assert_eq!(err.to_string(), "tool not found: nonexistent_tool_12345");
    }

    #[test]
    fn test_check_tools_lists_ffmpeg_pair() {
        let names: Vec<String> = check_tools().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["ffmpeg", "ffprobe"]);
    }
}
