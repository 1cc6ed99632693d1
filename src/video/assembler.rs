use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::config::AssemblerConfig;
use crate::error::{OverlayError, Result};
use crate::video::ffmpeg;
use crate::video::types::{frame_pattern, is_frame_image, AudioSelection, VideoSpec};

/// Video filter chain passed to ffmpeg's `-vf`
#[derive(Debug, Clone, PartialEq)]
pub struct FilterChain {
    filters: Vec<String>,
}

impl FilterChain {
    /// Build the chain for a video of `total_duration` seconds.
    ///
    /// The pixel-format conversion always comes first. A fade-in starts at 0
    /// when requested; a fade-out is only added when it is strictly shorter
    /// than the video.
    pub fn build(pixel_format: &str, total_duration: f64, fade_in: f64, fade_out: f64) -> Self {
        let mut filters = vec![format!("format={}", pixel_format)];

        if fade_in > 0.0 {
            filters.push(format!("fade=t=in:st=0:d={}", fade_in));
        }

        if fade_out > 0.0 && fade_out < total_duration {
            let start = (total_duration - fade_out).max(0.0);
            filters.push(format!("fade=t=out:st={}:d={}", start, fade_out));
        } else if fade_out > 0.0 {
            warn!("Fade-out duration ({}s) is not shorter than the video ({:.2}s); no fade-out applied",
                  fade_out, total_duration);
        }

        Self { filters }
    }

    pub fn filters(&self) -> &[String] {
        &self.filters
    }

    pub fn has_fade_out(&self) -> bool {
        self.filters.iter().any(|f| f.starts_with("fade=t=out"))
    }

    pub fn render(&self) -> String {
        self.filters.join(",")
    }
}

/// Encodes a directory of sequentially numbered frames, plus optional audio,
/// into the final video with an external ffmpeg
pub struct VideoAssembler {
    ffmpeg: PathBuf,
    config: AssemblerConfig,
    frame_prefix: String,
}

impl VideoAssembler {
    pub fn new<P: Into<PathBuf>>(ffmpeg: P, config: AssemblerConfig, frame_prefix: impl Into<String>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            config,
            frame_prefix: frame_prefix.into(),
        }
    }

    pub fn is_available(&self) -> bool {
        ffmpeg::is_available(&self.ffmpeg)
    }

    /// Count the frame images in `frames_dir`
    pub fn count_frames(frames_dir: &Path) -> Result<usize> {
        let mut count = 0;
        for entry in std::fs::read_dir(frames_dir)? {
            let path = entry?.path();
            if path.is_file() && is_frame_image(&path) {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Encode the frames in `frames_dir` into `output`, returning the frame count.
    pub fn assemble(&self, frames_dir: &Path, output: &Path, spec: &VideoSpec) -> Result<usize> {
        info!("Combining frames from {:?} into {:?}", frames_dir, output);

        let frame_count = Self::count_frames(frames_dir)?;
        if frame_count == 0 {
            return Err(OverlayError::EncodeFailed {
                output: output.display().to_string(),
                reason: format!("no frames to encode in {}", frames_dir.display()),
            }.into());
        }

        let total_duration = spec.duration_of(frame_count);
        let chain = FilterChain::build(&self.config.pixel_format, total_duration, spec.fade_in, spec.fade_out);

        let audio = spec.audio.as_ref().filter(|audio| {
            let exists = audio.path.exists();
            if !exists {
                warn!("Audio file not found at {:?}; video will be created without audio", audio.path);
            }
            exists
        });

        let args = self.build_args(frames_dir, output, spec.fps, &chain, audio);
        ffmpeg::run(&self.ffmpeg, &args).map_err(|failure| {
            error!("Video encoding failed: {}", failure);
            OverlayError::EncodeFailed {
                output: output.display().to_string(),
                reason: failure.to_string(),
            }
        })?;

        info!("Video {:?} created: {} frames, {:.2}s", output, frame_count, total_duration);
        Ok(frame_count)
    }

    fn build_args(
        &self,
        frames_dir: &Path,
        output: &Path,
        fps: u32,
        chain: &FilterChain,
        audio: Option<&AudioSelection>,
    ) -> Vec<OsString> {
        let pattern = frames_dir.join(frame_pattern(&self.frame_prefix, "png"));

        let mut args: Vec<OsString> = vec![
            "-framerate".into(),
            fps.to_string().into(),
            "-start_number".into(),
            "1".into(),
            "-i".into(),
            pattern.into(),
        ];

        if let Some(audio) = audio {
            if let Some((start, end)) = audio.section {
                push_all(&mut args, &["-ss", &start.to_string(), "-t", &(end - start).to_string()]);
            }
            args.push("-i".into());
            args.push(audio.path.clone().into());
        }

        push_all(&mut args, &["-vf", &chain.render()]);
        push_all(&mut args, &[
            "-c:v", &self.config.video_codec,
            "-crf", &self.config.crf.to_string(),
            "-preset", &self.config.preset,
        ]);

        if audio.is_some() {
            push_all(&mut args, &[
                "-map", "0:v:0",
                "-map", "1:a:0",
                "-shortest",
                "-c:a", &self.config.audio_codec,
                "-b:a", &self.config.audio_bitrate,
            ]);
        }

        args.push("-y".into());
        args.push(output.into());
        args
    }
}

fn push_all(args: &mut Vec<OsString>, items: &[&str]) {
    args.extend(items.iter().map(OsString::from));
}
