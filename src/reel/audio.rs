use std::path::PathBuf;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::video::AudioSelection;

/// A background track and the (start, end) sections that work under a reel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioTrack {
    pub path: PathBuf,

    /// Sections in seconds; empty means the whole track
    #[serde(default)]
    pub sections: Vec<[f64; 2]>,
}

impl AudioTrack {
    /// Pick one of this track's sections at random
    pub fn choose_section<R: Rng + ?Sized>(&self, rng: &mut R) -> AudioSelection {
        match self.sections.choose(rng) {
            Some([start, end]) => AudioSelection::section(&self.path, *start, *end),
            None => AudioSelection::whole(&self.path),
        }
    }
}

/// Pick a random track from `library` and a random section of it
pub fn choose_audio<R: Rng + ?Sized>(library: &[AudioTrack], rng: &mut R) -> Option<AudioSelection> {
    library.choose(rng).map(|track| track.choose_section(rng))
}
