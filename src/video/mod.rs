//! # Video Processing Module
//!
//! Frame extraction, per-frame compositing, the parallel frame pipeline and
//! final assembly. Extraction and assembly shell out to an external ffmpeg.

pub mod types;
pub mod extractor;
pub mod compositor;
pub mod pipeline;
pub mod assembler;

mod ffmpeg;

pub use types::{
    frame_file_name, frame_pattern, frame_sort_key, is_frame_image, AudioSelection, EncodedVideo,
    VideoSpec, FRAME_INDEX_WIDTH,
};
pub use extractor::FrameExtractor;
pub use compositor::{BackgroundCompositor, ResizeStrategy};
pub use pipeline::{FrameOutcome, FramePipeline, PipelineReport};
pub use assembler::{FilterChain, VideoAssembler};
