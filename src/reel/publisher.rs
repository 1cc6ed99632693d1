use std::path::{Path, PathBuf};

use rand::Rng;
use tracing::{info, warn};

use crate::{
    composition::OverlayOrchestrator,
    error::{PublishError, Result},
    reel::{audio::choose_audio, caption::compose_caption, quote::Quote},
    video::EncodedVideo,
};

/// Source of the daily quote
pub trait QuoteProvider {
    fn quote_of_the_day(&self) -> Result<Quote>;
}

/// Renders a quote onto an image with an alpha channel, returning its path
pub trait QuoteRenderer {
    fn render(&self, quote: &Quote) -> Result<PathBuf>;
}

/// Posts a finished reel, returning the post identifier
pub trait ReelUploader {
    fn upload(&self, video: &Path, thumbnail: &Path, caption: &str) -> Result<String>;
}

/// Everything produced by one publishing run
#[derive(Debug, Clone)]
pub struct PublishedReel {
    pub quote: Quote,
    /// Rendered quote image, used as overlay and thumbnail
    pub overlay: PathBuf,
    pub video: EncodedVideo,
    pub caption: String,
    /// `None` on a dry run
    pub post_id: Option<String>,
}

/// Sequences quote, rendering, overlay video and upload
pub struct ReelPublisher<P, R, U> {
    orchestrator: OverlayOrchestrator,
    provider: P,
    renderer: R,
    uploader: U,
}

impl<P, R, U> ReelPublisher<P, R, U>
where
    P: QuoteProvider,
    R: QuoteRenderer,
    U: ReelUploader,
{
    pub fn new(orchestrator: OverlayOrchestrator, provider: P, renderer: R, uploader: U) -> Self {
        Self {
            orchestrator,
            provider,
            renderer,
            uploader,
        }
    }

    /// Produce a reel over `background` at `output` and post it unless `dry_run`.
    pub fn publish<G: Rng + ?Sized>(
        &self,
        background: &Path,
        output: &Path,
        rng: &mut G,
        dry_run: bool,
    ) -> Result<PublishedReel> {
        let config = self.orchestrator.config();

        let quote = self.provider.quote_of_the_day()?;
        info!("Quote of the day: {} - {}", quote.quote, quote.author);

        let overlay = self.renderer.render(&quote)?;
        info!("Quote rendered at {:?}", overlay);

        let audio = choose_audio(&config.reel.audio_library, rng);
        match &audio {
            Some(selection) => info!("Selected audio {:?} ({:?})", selection.path, selection.section),
            None => info!("No audio library configured; rendering without audio"),
        }

        let spec = config.video_spec(audio);
        let video = self.orchestrator.run(background, &overlay, output, &spec)?;

        let caption = compose_caption(&quote, &config.reel.caption);

        let post_id = if dry_run {
            info!("Dry run: skipping upload of {:?}", video.path);
            None
        } else {
            Some(self.upload(&video.path, &overlay, &caption)?)
        };

        Ok(PublishedReel {
            quote,
            overlay,
            video,
            caption,
            post_id,
        })
    }

    /// Check the media files and hand them to the uploader.
    pub fn upload(&self, video: &Path, thumbnail: &Path, caption: &str) -> Result<String> {
        for path in [video, thumbnail] {
            if !path.is_file() {
                return Err(PublishError::MissingMedia { path: path.display().to_string() }.into());
            }
        }

        let (aspect_w, aspect_h) = self.orchestrator.config().reel.expected_aspect;
        match image::image_dimensions(thumbnail) {
            Ok((width, height)) if width as u64 * aspect_h as u64 != height as u64 * aspect_w as u64 => {
                warn!("Thumbnail is {}x{}, which does not match the expected {}:{} aspect",
                      width, height, aspect_w, aspect_h);
            }
            Ok(_) => {}
            Err(e) => warn!("Could not read thumbnail dimensions of {:?}: {}", thumbnail, e),
        }

        let post_id = self.uploader.upload(video, thumbnail, caption)?;
        info!("Reel uploaded: {}", post_id);
        Ok(post_id)
    }
}
