use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;

use image::RgbaImage;
use indicatif::ProgressBar;
use tracing::{error, info, warn};

use crate::{
    composition::workspace::WorkingDirectory,
    config::Config,
    error::{OverlayError, ReelError, Result},
    video::{
        BackgroundCompositor, EncodedVideo, FrameExtractor, FramePipeline, VideoAssembler,
        VideoSpec,
    },
};

/// Stages of one overlay run
///
/// Runs move linearly from `Start` to `Done`; any fatal error moves the run
/// to `Aborted` instead. Both terminal stages are entered only after the
/// working directory has been cleaned up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    Extracting,
    OverlayLoaded,
    Processing,
    Assembling,
    Cleanup,
    Done,
    Aborted,
}

impl Stage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Aborted)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::Extracting => "extracting",
            Self::OverlayLoaded => "overlay loaded",
            Self::Processing => "processing",
            Self::Assembling => "assembling",
            Self::Cleanup => "cleanup",
            Self::Done => "done",
            Self::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Tracks the current stage and the path taken through the run
#[derive(Debug, Clone)]
pub struct StageTrace {
    stages: Vec<Stage>,
}

impl StageTrace {
    fn new() -> Self {
        Self { stages: vec![Stage::Start] }
    }

    fn enter(&mut self, stage: Stage) {
        info!("Overlay run: {} -> {}", self.current(), stage);
        self.stages.push(stage);
    }

    pub fn current(&self) -> Stage {
        self.stages.last().copied().unwrap_or(Stage::Start)
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }
}

impl fmt::Display for StageTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path: Vec<String> = self.stages.iter().map(Stage::to_string).collect();
        f.write_str(&path.join(" -> "))
    }
}

/// Sequences frame extraction, compositing and assembly for one video
///
/// The orchestrator owns the process configuration (including the ffmpeg
/// location) and a temporary working directory per run, which is removed
/// whether the run succeeds or aborts.
#[derive(Debug, Clone)]
pub struct OverlayOrchestrator {
    config: Config,
}

impl OverlayOrchestrator {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Composite `overlay` onto every frame of `video` and encode the result to `output`.
    pub fn run(&self, video: &Path, overlay: &Path, output: &Path, spec: &VideoSpec) -> Result<EncodedVideo> {
        self.run_with_progress(video, overlay, output, spec, &ProgressBar::hidden()).0
    }

    /// Like [`run`](Self::run), reporting frame progress on `progress`.
    ///
    /// The stage trace is returned alongside the result, ending in
    /// [`Stage::Done`] or [`Stage::Aborted`].
    pub fn run_with_progress(
        &self,
        video: &Path,
        overlay: &Path,
        output: &Path,
        spec: &VideoSpec,
        progress: &ProgressBar,
    ) -> (Result<EncodedVideo>, StageTrace) {
        let started = Instant::now();
        info!("Starting overlay run for {:?}", video);

        let mut workspace = WorkingDirectory::new(&self.config.workspace);
        let mut trace = StageTrace::new();

        let result = self
            .config
            .validate()
            .and_then(|_| self.run_stages(&workspace, &mut trace, video, overlay, output, spec, progress));

        trace.enter(Stage::Cleanup);
        workspace.cleanup();

        match &result {
            Ok(encoded) => {
                trace.enter(Stage::Done);
                info!("Overlay run finished in {:.2}s: {:?}", started.elapsed().as_secs_f64(), encoded.path);
            }
            Err(e) => {
                trace.enter(Stage::Aborted);
                error!("Overlay run aborted after {}: {}", trace, e);
            }
        }
        (result, trace)
    }

    /// Run [`run`](Self::run) on the blocking thread pool of the current tokio runtime.
    pub async fn run_async(
        &self,
        video: PathBuf,
        overlay: PathBuf,
        output: PathBuf,
        spec: VideoSpec,
        progress: ProgressBar,
    ) -> Result<EncodedVideo> {
        let orchestrator = self.clone();
        tokio::task::spawn_blocking(move || {
            orchestrator
                .run_with_progress(&video, &overlay, &output, &spec, &progress)
                .0
        })
        .await
        .map_err(|e| ReelError::generic(format!("Overlay task failed: {}", e)))?
    }

    #[allow(clippy::too_many_arguments)]
    fn run_stages(
        &self,
        workspace: &WorkingDirectory,
        trace: &mut StageTrace,
        video: &Path,
        overlay: &Path,
        output: &Path,
        spec: &VideoSpec,
        progress: &ProgressBar,
    ) -> Result<EncodedVideo> {
        let ffmpeg = &self.config.binaries.ffmpeg;

        trace.enter(Stage::Extracting);
        FrameExtractor::new(ffmpeg, self.config.extractor.clone())
            .extract(video, workspace.raw_frames(), spec.fps)?;

        let overlay_image = load_overlay(overlay)?;
        trace.enter(Stage::OverlayLoaded);
        info!("Overlay {:?} loaded ({}x{})", overlay, overlay_image.width(), overlay_image.height());

        trace.enter(Stage::Processing);
        let pipeline = FramePipeline::new(
            self.config.pipeline.clone(),
            BackgroundCompositor::new(self.config.compositor.clone()),
        );
        let report = pipeline.run(workspace.raw_frames(), &overlay_image, workspace.processed_frames(), progress)?;
        if !report.is_success() {
            warn!("None of the {} frames could be processed", report.total());
        }

        trace.enter(Stage::Assembling);
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let assembler = VideoAssembler::new(
            ffmpeg,
            self.config.assembler.clone(),
            self.config.compositor.output_prefix.clone(),
        );
        let frame_count = assembler.assemble(workspace.processed_frames(), output, spec)?;

        let file_size = std::fs::metadata(output).map(|m| m.len()).unwrap_or(0);
        Ok(EncodedVideo {
            path: output.to_path_buf(),
            duration: spec.duration_of(frame_count),
            frame_count,
            file_size,
        })
    }
}

fn load_overlay(path: &Path) -> Result<RgbaImage> {
    let image = image::open(path).map_err(|e| OverlayError::OverlayLoadFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    Ok(image.to_rgba8())
}
