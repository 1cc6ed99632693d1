use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};

use crate::{
    error::{ConfigError, Result},
    reel::{AudioTrack, CaptionConfig},
    video::{AudioSelection, VideoSpec},
};

/// Main configuration for quote-reel
///
/// Resolved once per process and handed to the orchestrator at construction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// External binaries
    pub binaries: BinaryConfig,

    /// Frame extraction settings
    pub extractor: ExtractorConfig,

    /// Per-frame compositing settings
    pub compositor: CompositorConfig,

    /// Worker pool settings
    pub pipeline: PipelineConfig,

    /// Final encode settings
    pub assembler: AssemblerConfig,

    /// Temporary working directory layout
    pub workspace: WorkspaceConfig,

    /// Caption and audio library for publishing
    pub reel: ReelConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let config: Config = toml::from_str(&content)
            .map_err(|_| ConfigError::ParseFailed { path: path.display().to_string() })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidValue {
                key: "config".to_string(),
                value: e.to_string()
            })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.extractor.validate()?;
        self.compositor.validate()?;
        self.pipeline.validate()?;
        self.assembler.validate()?;
        self.workspace.validate()?;
        self.reel.validate()?;
        Ok(())
    }

    /// Build the immutable settings for one overlay run
    pub fn video_spec(&self, audio: Option<AudioSelection>) -> VideoSpec {
        VideoSpec {
            fps: self.assembler.fps,
            fade_in: self.assembler.fade_in,
            fade_out: self.assembler.fade_out,
            audio,
        }
    }
}

fn invalid(key: &str, value: impl ToString) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

/// Locations of the external tools
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BinaryConfig {
    /// ffmpeg executable, looked up on PATH when not absolute
    pub ffmpeg: PathBuf,
}

impl Default for BinaryConfig {
    fn default() -> Self {
        Self { ffmpeg: PathBuf::from("ffmpeg") }
    }
}

/// Frame extraction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// File name prefix of extracted frames
    pub frame_prefix: String,

    /// Index of the first extracted frame
    pub start_number: u32,

    /// Image format written by the decoder
    pub image_extension: String,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            frame_prefix: "frame_".to_string(),
            start_number: 1,
            image_extension: "png".to_string(),
        }
    }
}

impl ExtractorConfig {
    fn validate(&self) -> Result<()> {
        if self.frame_prefix.is_empty() {
            return Err(invalid("extractor.frame_prefix", "<empty>").into());
        }

        if !crate::video::is_frame_image(Path::new(&format!("x.{}", self.image_extension))) {
            return Err(invalid("extractor.image_extension", &self.image_extension).into());
        }

        Ok(())
    }
}

/// Background compositing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositorConfig {
    /// Box blur radius applied to the desaturated background
    pub blur_radius: u32,

    /// Relative tolerance when matching swapped background/overlay dimensions
    pub rotation_tolerance: f64,

    /// File name prefix of composited frames
    pub output_prefix: String,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            blur_radius: 10,
            rotation_tolerance: 1e-5,
            output_prefix: "final_image_".to_string(),
        }
    }
}

impl CompositorConfig {
    /// Largest accepted blur radius; keeps the running window sum within `u32`
    pub const MAX_BLUR_RADIUS: u32 = 1000;

    fn validate(&self) -> Result<()> {
        if self.blur_radius > Self::MAX_BLUR_RADIUS {
            return Err(invalid("compositor.blur_radius", self.blur_radius).into());
        }

        if !(0.0..1.0).contains(&self.rotation_tolerance) {
            return Err(invalid("compositor.rotation_tolerance", self.rotation_tolerance).into());
        }

        if self.output_prefix.is_empty() {
            return Err(invalid("compositor.output_prefix", "<empty>").into());
        }

        Ok(())
    }
}

/// Frame worker pool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Number of compositing workers
    pub workers: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { workers: num_cpus::get() }
    }
}

impl PipelineConfig {
    fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(invalid("pipeline.workers", self.workers).into());
        }
        Ok(())
    }
}

/// Final encode configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblerConfig {
    /// Frame rate used both to sample the source and to encode the output
    pub fps: u32,

    /// Fade-in duration in seconds (0 disables)
    pub fade_in: f64,

    /// Fade-out duration in seconds (0 disables)
    pub fade_out: f64,

    /// Pixel format applied at the head of the filter chain
    pub pixel_format: String,

    pub video_codec: String,

    /// Constant rate factor (0-51, lower is better)
    pub crf: u8,

    pub preset: String,

    pub audio_codec: String,

    pub audio_bitrate: String,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            fps: 30,
            fade_in: 1.0,
            fade_out: 2.0,
            pixel_format: "yuv420p".to_string(),
            video_codec: "libx264".to_string(),
            crf: 23,
            preset: "medium".to_string(),
            audio_codec: "aac".to_string(),
            audio_bitrate: "192k".to_string(),
        }
    }
}

impl AssemblerConfig {
    fn validate(&self) -> Result<()> {
        if self.fps == 0 {
            return Err(invalid("assembler.fps", self.fps).into());
        }

        if self.fade_in < 0.0 || self.fade_out < 0.0 {
            return Err(invalid("assembler.fades", format!("{}/{}", self.fade_in, self.fade_out)).into());
        }

        if self.crf > 51 {
            return Err(invalid("assembler.crf", self.crf).into());
        }

        Ok(())
    }
}

/// Temporary working directory layout
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Root of the working directory, removed after every run
    pub root: PathBuf,

    /// Subdirectory for decoded frames
    pub raw_frames: String,

    /// Subdirectory for composited frames
    pub processed_frames: String,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("temp_video_processing"),
            raw_frames: "decompressed_frames".to_string(),
            processed_frames: "processed_frames".to_string(),
        }
    }
}

impl WorkspaceConfig {
    fn validate(&self) -> Result<()> {
        if self.raw_frames.is_empty() || self.processed_frames.is_empty() {
            return Err(invalid("workspace.frame_dirs", "<empty>").into());
        }

        if self.raw_frames == self.processed_frames {
            return Err(invalid("workspace.processed_frames", &self.processed_frames).into());
        }

        Ok(())
    }
}

/// Publishing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReelConfig {
    /// Expected thumbnail aspect as (width, height)
    pub expected_aspect: (u32, u32),

    pub caption: CaptionConfig,

    /// Background tracks with the sections worth using
    pub audio_library: Vec<AudioTrack>,
}

impl Default for ReelConfig {
    fn default() -> Self {
        Self {
            expected_aspect: (9, 16),
            caption: CaptionConfig::default(),
            audio_library: Vec::new(),
        }
    }
}

impl ReelConfig {
    fn validate(&self) -> Result<()> {
        for track in &self.audio_library {
            if let Some(section) = track.sections.iter().find(|s| s[1] <= s[0] || s[0] < 0.0) {
                return Err(invalid(
                    "reel.audio_library.sections",
                    format!("{}: {}-{}", track.path.display(), section[0], section[1]),
                ).into());
            }
        }

        if self.expected_aspect.0 == 0 || self.expected_aspect.1 == 0 {
            return Err(invalid(
                "reel.expected_aspect",
                format!("{}:{}", self.expected_aspect.0, self.expected_aspect.1),
            ).into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert!(config.pipeline.workers >= 1);
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("reel.toml");

        let mut original_config = Config::default();
        original_config.assembler.fade_out = 3.5;
        original_config.reel.audio_library.push(AudioTrack {
            path: PathBuf::from("music/track.mp3"),
            sections: vec![[10.0, 30.0]],
        });

        original_config.save_to_file(&file_path).unwrap();
        let loaded_config = Config::from_file(&file_path).unwrap();

        assert_eq!(loaded_config.assembler.fade_out, 3.5);
        assert_eq!(loaded_config.extractor.frame_prefix, original_config.extractor.frame_prefix);
        assert_eq!(loaded_config.reel.audio_library.len(), 1);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("partial.toml");
        std::fs::write(&file_path, "[binaries]\nffmpeg = \"/opt/ffmpeg/bin/ffmpeg\"\n").unwrap();

        let config = Config::from_file(&file_path).unwrap();
        assert_eq!(config.binaries.ffmpeg, PathBuf::from("/opt/ffmpeg/bin/ffmpeg"));
        assert_eq!(config.compositor.blur_radius, 10);
        assert_eq!(config.workspace.processed_frames, "processed_frames");
    }

    #[test]
    fn test_missing_file() {
        let result = Config::from_file("/definitely/not/here.toml");
        assert!(matches!(
            result,
            Err(crate::ReelError::Config(ConfigError::FileNotFound { .. }))
        ));
    }

    #[test]
    fn test_invalid_values() {
        let mut config = Config::default();
        config.pipeline.workers = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.assembler.crf = 60;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.compositor.blur_radius = CompositorConfig::MAX_BLUR_RADIUS;
        assert!(config.validate().is_ok());
        config.compositor.blur_radius = CompositorConfig::MAX_BLUR_RADIUS + 1;
        assert!(matches!(
            config.validate(),
            Err(crate::ReelError::Config(ConfigError::InvalidValue { .. }))
        ));

        let mut config = Config::default();
        config.workspace.processed_frames = config.workspace.raw_frames.clone();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.reel.audio_library.push(AudioTrack {
            path: PathBuf::from("a.mp3"),
            sections: vec![[20.0, 10.0]],
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_video_spec_from_config() {
        let config = Config::default();
        let spec = config.video_spec(None);
        assert_eq!(spec.fps, 30);
        assert_eq!(spec.fade_in, 1.0);
        assert_eq!(spec.fade_out, 2.0);
        assert!(spec.audio.is_none());
    }
}
