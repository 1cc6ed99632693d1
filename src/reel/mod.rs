//! # Quote Reels
//!
//! The publishing flow around the overlay pipeline: a daily quote is rendered
//! to an image, laid over a background video with a randomly chosen audio
//! section and posted with a generated caption. Fetching, rendering and
//! uploading are supplied by the caller through the traits in [`publisher`].

pub mod audio;
pub mod caption;
pub mod publisher;
pub mod quote;

pub use audio::{choose_audio, AudioTrack};
pub use caption::{compose_caption, CaptionConfig};
pub use publisher::{PublishedReel, QuoteProvider, QuoteRenderer, ReelPublisher, ReelUploader};
pub use quote::Quote;
