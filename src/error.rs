//! Error type shared by discovery, conversion and the worker pool.

/// Result type alias using [`ConvertError`].
pub type Result<T> = std::result::Result<T, ConvertError>;

/// Errors raised while discovering or converting media.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// A required directory is missing; raised before any job starts.
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// The conversion request is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// External tool or frame processing failure.
    #[error(transparent)]
    Av(#[from] fieldconv_av::Error),

    /// Filesystem error outside of the external tools.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A worker task died without reporting a result.
    #[error("worker failed: {0}")]
    Worker(String),

    /// The user interrupted the conversion.
    #[error("conversion cancelled")]
    Cancelled,
}

impl ConvertError {
    /// Whether this error is a user cancellation rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        match self {
            ConvertError::Cancelled => true,
            ConvertError::Av(e) => e.is_cancelled(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancellation_is_recognised_through_av() {
        assert!(ConvertError::Cancelled.is_cancelled());
        assert!(ConvertError::from(fieldconv_av::Error::Cancelled).is_cancelled());
        assert!(!ConvertError::from(fieldconv_av::Error::tool_failed("ffmpeg", "boom")).is_cancelled());
        assert!(!ConvertError::Precondition("x".into()).is_cancelled());
    }

    #[test]
    fn test_av_errors_display_transparently() {
        let err = ConvertError::from(fieldconv_av::Error::tool_not_found("ffmpeg"));
        assert_eq!(err.to_string(), "tool not found: ffmpeg");
    }
}
