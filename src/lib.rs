//! # Quote-Reel
//!
//! Turn a background video and a transparent quote image into a short vertical
//! video reel.
//!
//! Every frame of the background is extracted, rotated to the overlay's
//! orientation, fitted or cropped to the overlay size, turned to blurred
//! grayscale and composited under the overlay. The frames are then encoded
//! back into a video with fades and an optional audio track.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use quote_reel::{
//!     config::Config,
//!     composition::OverlayOrchestrator,
//!     video::AudioSelection,
//! };
//! use std::path::Path;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = Config::default();
//! let spec = config.video_spec(Some(AudioSelection::section("music.mp3", 10.0, 25.0)));
//!
//! let orchestrator = OverlayOrchestrator::new(config);
//! let video = orchestrator.run(
//!     Path::new("background.mp4"),
//!     Path::new("quote.png"),
//!     Path::new("reel.mp4"),
//!     &spec,
//! )?;
//! println!("{} frames, {:.1}s", video.frame_count, video.duration);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`video`] - Frame extraction, compositing, the frame pipeline and assembly
//! - [`composition`] - Overlay orchestration and the temporary workspace
//! - [`reel`] - Quote, caption and audio selection around a publishing run
//! - [`config`] - Configuration management
//!
//! ## Publishing
//!
//! Quote sources, text rendering and uploading are plugged in by implementing
//! [`QuoteProvider`](reel::QuoteProvider), [`QuoteRenderer`](reel::QuoteRenderer)
//! and [`ReelUploader`](reel::ReelUploader), then handing them to a
//! [`ReelPublisher`](reel::ReelPublisher).

pub mod composition;
pub mod config;
pub mod error;
pub mod reel;
pub mod video;

// Re-export commonly used types for convenience
pub use crate::{
    composition::OverlayOrchestrator,
    config::Config,
    error::{ReelError, Result},
    video::{EncodedVideo, VideoSpec},
};
