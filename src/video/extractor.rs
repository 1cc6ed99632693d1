use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::{error, info};

use crate::config::ExtractorConfig;
use crate::error::{OverlayError, Result};
use crate::video::ffmpeg;
use crate::video::types::frame_pattern;

/// Splits a video into numbered still frames with an external ffmpeg
pub struct FrameExtractor {
    ffmpeg: PathBuf,
    config: ExtractorConfig,
}

impl FrameExtractor {
    pub fn new<P: Into<PathBuf>>(ffmpeg: P, config: ExtractorConfig) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            config,
        }
    }

    /// Decode `video` into `output_dir` at `fps` frames per second.
    ///
    /// The rate is applied to the output, so the frame count follows the
    /// video's duration rather than its native frame rate. Frames are named
    /// `<prefix><9-digit index>.<ext>` starting at the configured start number.
    pub fn extract(&self, video: &Path, output_dir: &Path, fps: u32) -> Result<()> {
        info!("Decompressing video {:?} into frames in {:?}", video, output_dir);

        std::fs::create_dir_all(output_dir)?;

        let args = self.build_args(video, output_dir, fps);
        ffmpeg::run(&self.ffmpeg, &args).map_err(|failure| {
            error!("Frame extraction failed: {}", failure);
            OverlayError::DecodeFailed {
                path: video.display().to_string(),
                reason: failure.to_string(),
            }
        })?;

        info!("Video {:?} decompressed to frames in {:?}", video, output_dir);
        Ok(())
    }

    fn build_args(&self, video: &Path, output_dir: &Path, fps: u32) -> Vec<OsString> {
        let pattern = output_dir.join(frame_pattern(
            &self.config.frame_prefix,
            &self.config.image_extension,
        ));

        vec![
            "-i".into(),
            video.into(),
            "-r".into(),
            fps.to_string().into(),
            "-start_number".into(),
            self.config.start_number.to_string().into(),
            "-y".into(),
            pattern.into(),
        ]
    }
}
