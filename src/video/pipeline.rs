use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use image::RgbaImage;
use indicatif::ProgressBar;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::error::{OverlayError, Result};
use crate::video::compositor::BackgroundCompositor;
use crate::video::types::{frame_file_name, frame_sort_key, is_frame_image};

/// Result of compositing one frame
#[derive(Debug)]
pub struct FrameOutcome {
    /// Position in playback order, starting at 1
    pub index: u64,
    pub source: PathBuf,
    pub result: std::result::Result<PathBuf, OverlayError>,
}

impl FrameOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Per-frame outcomes of one pipeline run, in frame order
#[derive(Debug, Default)]
pub struct PipelineReport {
    pub outcomes: Vec<FrameOutcome>,
}

impl PipelineReport {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.succeeded()
    }

    /// At least one frame made it through
    pub fn is_success(&self) -> bool {
        self.succeeded() > 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &FrameOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }
}

/// Runs the background compositor over every extracted frame on a
/// fixed-size worker pool
pub struct FramePipeline {
    config: PipelineConfig,
    compositor: BackgroundCompositor,
}

impl FramePipeline {
    pub fn new(config: PipelineConfig, compositor: BackgroundCompositor) -> Self {
        Self { config, compositor }
    }

    /// List the frame images in `dir`, ordered by the number in their names.
    pub fn discover_frames(dir: &Path) -> Result<Vec<PathBuf>> {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut frames = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.is_file() && is_frame_image(&path) {
                frames.push(path);
            }
        }

        frames.sort_by(|a, b| {
            sort_key(a).cmp(&sort_key(b)).then_with(|| a.cmp(b))
        });
        Ok(frames)
    }

    /// Composite every frame in `raw_dir` into `output_dir`.
    ///
    /// Output frames are numbered 1..N in the order of the sorted inputs.
    /// Individual frame failures are logged and reported, never raised; only
    /// an empty `raw_dir` is an error, detected before any work is scheduled.
    pub fn run(
        &self,
        raw_dir: &Path,
        overlay: &RgbaImage,
        output_dir: &Path,
        progress: &ProgressBar,
    ) -> Result<PipelineReport> {
        let frames = Self::discover_frames(raw_dir)?;
        if frames.is_empty() {
            return Err(OverlayError::NoFramesFound {
                path: raw_dir.display().to_string(),
            }.into());
        }

        std::fs::create_dir_all(output_dir)?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.workers)
            .thread_name(|i| format!("frame-worker-{}", i))
            .build()
            .map_err(|e| OverlayError::WorkerPool { reason: e.to_string() })?;

        info!("Processing {} frames on {} workers into {:?}",
              frames.len(), self.config.workers, output_dir);
        progress.set_length(frames.len() as u64);

        let outcomes: Vec<FrameOutcome> = pool.install(|| {
            frames
                .par_iter()
                .enumerate()
                .map(|(position, source)| {
                    let index = position as u64 + 1;
                    let result = self.compositor.process_frame(source, index, overlay, output_dir);
                    if let Err(e) = &result {
                        warn!("{}", e);
                    }
                    progress.inc(1);

                    FrameOutcome {
                        index,
                        source: source.clone(),
                        result,
                    }
                })
                .collect()
        });
        progress.finish();

        let mut report = PipelineReport { outcomes };
        if report.failed() > 0 {
            warn!("{} of {} frames failed to process; continuing with the rest",
                  report.failed(), report.total());
            self.close_gaps(&mut report, output_dir)?;
        }
        info!("Frame processing complete: {}/{} succeeded", report.succeeded(), report.total());

        Ok(report)
    }

    /// Renumber successful outputs so the sequence has no holes where frames failed.
    ///
    /// The encoder reads frames until the first missing number, so a hole
    /// would silently truncate the video.
    fn close_gaps(&self, report: &mut PipelineReport, output_dir: &Path) -> Result<()> {
        let prefix = &self.compositor.config().output_prefix;
        let mut next = 1;
        for outcome in report.outcomes.iter_mut() {
            if let Ok(path) = &mut outcome.result {
                let target = output_dir.join(frame_file_name(prefix, next, "png"));
                if *path != target {
                    std::fs::rename(&*path, &target)?;
                    *path = target;
                }
                next += 1;
            }
        }
        Ok(())
    }
}

fn sort_key(path: &Path) -> u64 {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(frame_sort_key)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompositorConfig;
    use crate::error::ReelError;
    use image::{Rgb, RgbImage, Rgba};
    use tempfile::tempdir;

    fn pipeline(workers: usize) -> FramePipeline {
        let compositor = BackgroundCompositor::new(CompositorConfig {
            blur_radius: 1,
            ..CompositorConfig::default()
        });
        FramePipeline::new(PipelineConfig { workers }, compositor)
    }

    fn overlay() -> RgbaImage {
        RgbaImage::from_pixel(18, 32, Rgba([0, 0, 0, 0]))
    }

    fn write_frame(dir: &Path, index: u64, value: u8) {
        RgbImage::from_pixel(36, 64, Rgb([value, value, value]))
            .save(dir.join(frame_file_name("frame_", index, "png")))
            .unwrap();
    }

    #[test]
    fn test_discovery_sorts_by_number_and_filters() {
        let dir = tempdir().unwrap();
        for name in ["frame_10.png", "frame_9.png", "frame_100.JPG", "notes.txt", "cover.jpeg"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }

        let frames = FramePipeline::discover_frames(dir.path()).unwrap();
        let names: Vec<_> = frames
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(names, vec!["cover.jpeg", "frame_9.png", "frame_10.png", "frame_100.JPG"]);
    }

    #[test]
    fn test_processes_exactly_the_frames_present() {
        let dir = tempdir().unwrap();
        let raw = dir.path().join("raw");
        let processed = dir.path().join("processed");
        std::fs::create_dir(&raw).unwrap();

        // Gaps in the source numbering
        for index in [1, 2, 4, 7] {
            write_frame(&raw, index, 200);
        }

        let report = pipeline(2).run(&raw, &overlay(), &processed, &ProgressBar::hidden()).unwrap();

        assert_eq!(report.total(), 4);
        assert_eq!(report.succeeded(), 4);
        assert!(report.is_success());

        // Outputs are renumbered without gaps
        for index in 1..=4 {
            assert!(processed.join(frame_file_name("final_image_", index, "png")).is_file());
        }
        assert_eq!(FramePipeline::discover_frames(&processed).unwrap().len(), 4);
    }

    #[test]
    fn test_output_follows_numeric_order() {
        let dir = tempdir().unwrap();
        let raw = dir.path().join("raw");
        let processed = dir.path().join("processed");
        std::fs::create_dir(&raw).unwrap();

        RgbImage::from_pixel(36, 64, Rgb([255, 255, 255])).save(raw.join("frame_9.png")).unwrap();
        RgbImage::from_pixel(36, 64, Rgb([0, 0, 0])).save(raw.join("frame_10.png")).unwrap();

        pipeline(4).run(&raw, &overlay(), &processed, &ProgressBar::hidden()).unwrap();

        let first = image::open(processed.join("final_image_000000001.png")).unwrap().to_rgb8();
        let second = image::open(processed.join("final_image_000000002.png")).unwrap().to_rgb8();
        assert!(first.get_pixel(9, 16)[0] > 250);
        assert!(second.get_pixel(9, 16)[0] < 5);
    }

    #[test]
    fn test_failed_frames_do_not_abort() {
        let dir = tempdir().unwrap();
        let raw = dir.path().join("raw");
        let processed = dir.path().join("processed");
        std::fs::create_dir(&raw).unwrap();

        write_frame(&raw, 1, 100);
        std::fs::write(raw.join(frame_file_name("frame_", 2, "png")), b"broken").unwrap();
        write_frame(&raw, 3, 100);

        let report = pipeline(3).run(&raw, &overlay(), &processed, &ProgressBar::hidden()).unwrap();

        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed(), 1);
        assert!(report.is_success());
        let failed: Vec<u64> = report.failures().map(|o| o.index).collect();
        assert_eq!(failed, vec![2]);

        // The third frame moved down to close the hole
        assert!(processed.join("final_image_000000001.png").is_file());
        assert!(processed.join("final_image_000000002.png").is_file());
        assert!(!processed.join("final_image_000000003.png").exists());
        let moved = report.outcomes[2].result.as_ref().unwrap();
        assert!(moved.ends_with("final_image_000000002.png"));
    }

    #[test]
    fn test_no_frames_is_fatal_before_scheduling() {
        let dir = tempdir().unwrap();
        let raw = dir.path().join("raw");
        let processed = dir.path().join("processed");
        std::fs::create_dir(&raw).unwrap();
        std::fs::write(raw.join("ffmpeg.log"), b"nothing decoded").unwrap();

        let result = pipeline(2).run(&raw, &overlay(), &processed, &ProgressBar::hidden());

        assert!(matches!(
            result,
            Err(ReelError::Overlay(OverlayError::NoFramesFound { .. }))
        ));
        assert!(!processed.exists());
    }
}
