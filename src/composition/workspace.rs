use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::WorkspaceConfig;

/// Scoped temporary working directory for one overlay run
///
/// Holds the raw-frame and processed-frame subdirectories. The whole tree is
/// removed by [`cleanup`](Self::cleanup) or, failing that, on drop; removal
/// happens at most once.
#[derive(Debug)]
pub struct WorkingDirectory {
    root: PathBuf,
    raw_frames: PathBuf,
    processed_frames: PathBuf,
    cleaned: bool,
}

impl WorkingDirectory {
    pub fn new(config: &WorkspaceConfig) -> Self {
        Self {
            raw_frames: config.root.join(&config.raw_frames),
            processed_frames: config.root.join(&config.processed_frames),
            root: config.root.clone(),
            cleaned: false,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn raw_frames(&self) -> &Path {
        &self.raw_frames
    }

    pub fn processed_frames(&self) -> &Path {
        &self.processed_frames
    }

    /// Remove the working directory if it exists.
    ///
    /// Returns `true` when a directory was actually removed. Later calls are no-ops.
    pub fn cleanup(&mut self) -> bool {
        if self.cleaned {
            return false;
        }
        self.cleaned = true;

        if !self.root.exists() {
            return false;
        }

        info!("Cleaning up temporary directory: {:?}", self.root);
        match std::fs::remove_dir_all(&self.root) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to remove temporary directory {:?}: {}", self.root, e);
                false
            }
        }
    }
}

impl Drop for WorkingDirectory {
    fn drop(&mut self) {
        self.cleanup();
    }
}
