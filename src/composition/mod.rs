//! # Overlay Orchestration
//!
//! Drives one overlay run from source video to encoded output inside a
//! temporary working directory that never outlives the run.

pub mod orchestrator;
pub mod workspace;

// Re-exports for convenience
pub use orchestrator::{OverlayOrchestrator, Stage, StageTrace};
pub use workspace::WorkingDirectory;
