use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Number of digits in a frame file's zero-padded index
pub const FRAME_INDEX_WIDTH: usize = 9;

/// Image extensions accepted as frames
const FRAME_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// File name of the frame at `index`, e.g. `frame_000000042.png`
pub fn frame_file_name(prefix: &str, index: u64, extension: &str) -> String {
    format!("{}{:0width$}.{}", prefix, index, extension, width = FRAME_INDEX_WIDTH)
}

/// ffmpeg image-sequence pattern matching [`frame_file_name`], e.g. `frame_%09d.png`
pub fn frame_pattern(prefix: &str, extension: &str) -> String {
    format!("{}%0{}d.{}", prefix, FRAME_INDEX_WIDTH, extension)
}

/// Check whether a path looks like a frame image (png/jpg/jpeg, any case)
pub fn is_frame_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| FRAME_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Ordering key of a frame file: the first run of digits in its name, or 0
pub fn frame_sort_key(file_name: &str) -> u64 {
    file_name
        .split(|c: char| !c.is_ascii_digit())
        .find(|run| !run.is_empty())
        .and_then(|run| run.parse().ok())
        .unwrap_or(0)
}

/// Audio source for the final video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioSelection {
    /// Audio file (may also be a video file carrying an audio stream)
    pub path: PathBuf,

    /// Optional (start, end) window in seconds
    pub section: Option<(f64, f64)>,
}

impl AudioSelection {
    /// Use the whole file
    pub fn whole<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into(), section: None }
    }

    /// Use only `start..end` seconds of the file
    pub fn section<P: Into<PathBuf>>(path: P, start: f64, end: f64) -> Self {
        Self { path: path.into(), section: Some((start, end)) }
    }
}

/// Immutable settings of one overlay run
#[derive(Debug, Clone, PartialEq)]
pub struct VideoSpec {
    /// Frame rate used for extraction and encoding
    pub fps: u32,

    /// Fade-in duration in seconds (0 disables)
    pub fade_in: f64,

    /// Fade-out duration in seconds (0 disables)
    pub fade_out: f64,

    pub audio: Option<AudioSelection>,
}

impl VideoSpec {
    /// Nominal duration of `frame_count` frames at this spec's rate
    pub fn duration_of(&self, frame_count: usize) -> f64 {
        if self.fps == 0 {
            return 0.0;
        }
        frame_count as f64 / self.fps as f64
    }
}

/// Represents an encoded video output
#[derive(Debug, Clone)]
pub struct EncodedVideo {
    pub path: PathBuf,
    pub duration: f64,
    pub frame_count: usize,
    pub file_size: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_naming() {
        assert_eq!(frame_file_name("frame_", 1, "png"), "frame_000000001.png");
        assert_eq!(frame_file_name("final_image_", 123456789, "png"), "final_image_123456789.png");
        assert_eq!(frame_pattern("final_image_", "png"), "final_image_%09d.png");
    }

    #[test]
    fn test_frame_sort_key() {
        assert_eq!(frame_sort_key("frame_000000042.png"), 42);
        assert_eq!(frame_sort_key("cover.png"), 0);
        // Only the first run of digits counts
        assert_eq!(frame_sort_key("take2_frame_000000007.png"), 2);
    }

    #[test]
    fn test_frame_image_filter() {
        assert!(is_frame_image(Path::new("frame_000000001.png")));
        assert!(is_frame_image(Path::new("a/b/FRAME.JPEG")));
        assert!(is_frame_image(Path::new("x.jpg")));
        assert!(!is_frame_image(Path::new("notes.txt")));
        assert!(!is_frame_image(Path::new("frame_000000001")));
    }

    #[test]
    fn test_duration() {
        let spec = VideoSpec { fps: 30, fade_in: 1.0, fade_out: 2.0, audio: None };
        assert_eq!(spec.duration_of(90), 3.0);

        let spec = VideoSpec { fps: 0, ..spec };
        assert_eq!(spec.duration_of(90), 0.0);
    }
}
