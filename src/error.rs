use thiserror::Error;

/// Main error type for the quote-reel library
#[derive(Error, Debug)]
pub enum ReelError {
    #[error("Overlay processing error: {0}")]
    Overlay(#[from] OverlayError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Publishing error: {0}")]
    Publish(#[from] PublishError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Generic error: {0}")]
    Generic(String),
}

/// Which step of compositing a single frame went wrong
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameFailureKind {
    /// The frame file could not be read
    Open,
    /// The frame file was read but is not a decodable image
    Decode,
    /// The composited frame could not be written
    Save,
}

impl std::fmt::Display for FrameFailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Open => "open",
            Self::Decode => "decode",
            Self::Save => "save",
        };
        f.write_str(name)
    }
}

/// Errors raised by the overlay pipeline stages
#[derive(Error, Debug)]
pub enum OverlayError {
    #[error("Failed to decode video '{path}' into frames: {reason}")]
    DecodeFailed { path: String, reason: String },

    #[error("No frame images found in: {path}")]
    NoFramesFound { path: String },

    #[error("Frame '{frame}' failed ({kind}): {reason}")]
    FrameProcessingFailed {
        frame: String,
        kind: FrameFailureKind,
        reason: String,
    },

    #[error("Failed to encode video '{output}': {reason}")]
    EncodeFailed { output: String, reason: String },

    #[error("Failed to load overlay image '{path}': {reason}")]
    OverlayLoadFailed { path: String, reason: String },

    #[error("Worker pool could not be started: {reason}")]
    WorkerPool { reason: String },
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file: {path}")]
    ParseFailed { path: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Errors from the collaborators around the overlay pipeline
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Quote of the day unavailable: {reason}")]
    QuoteUnavailable { reason: String },

    #[error("Quote rendering failed: {reason}")]
    RenderFailed { reason: String },

    #[error("Upload failed: {reason}")]
    UploadFailed { reason: String },

    #[error("Media file missing: {path}")]
    MissingMedia { path: String },
}

/// Convenience type alias for Results using ReelError
pub type Result<T> = std::result::Result<T, ReelError>;

impl ReelError {
    /// Create a generic error with a custom message
    pub fn generic<S: Into<String>>(message: S) -> Self {
        Self::Generic(message.into())
    }

    /// Whether this error aborts an overlay run (as opposed to a per-frame failure)
    pub fn is_fatal_stage_error(&self) -> bool {
        match self {
            Self::Overlay(OverlayError::FrameProcessingFailed { .. }) => false,
            Self::Overlay(_) => true,
            _ => false,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Overlay(OverlayError::DecodeFailed { path, reason }) => {
                format!("Could not split '{}' into frames. Is ffmpeg installed? ({})", path, reason)
            }
            Self::Overlay(OverlayError::OverlayLoadFailed { path, .. }) => {
                format!("Could not load overlay image '{}'. Please check the file exists and is a PNG or JPEG.", path)
            }
            Self::Overlay(OverlayError::NoFramesFound { path }) => {
                format!("The source video produced no frames in '{}'.", path)
            }
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_failures_are_not_fatal() {
        let err: ReelError = OverlayError::FrameProcessingFailed {
            frame: "frame_000000001.png".to_string(),
            kind: FrameFailureKind::Decode,
            reason: "bad header".to_string(),
        }
        .into();
        assert!(!err.is_fatal_stage_error());

        let err: ReelError = OverlayError::NoFramesFound { path: "raw".to_string() }.into();
        assert!(err.is_fatal_stage_error());
    }

    #[test]
    fn test_messages_carry_context() {
        let err: ReelError = OverlayError::EncodeFailed {
            output: "out.mp4".to_string(),
            reason: "exit status 1: Unknown encoder".to_string(),
        }
        .into();
        let message = err.to_string();
        assert!(message.contains("out.mp4"));
        assert!(message.contains("Unknown encoder"));
    }
}
