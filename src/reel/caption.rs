use serde::{Deserialize, Serialize};

use crate::reel::quote::Quote;

/// Layout of the text posted alongside a reel
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionConfig {
    /// Filler line used to push the call to action below the fold
    pub spacer: String,

    /// Spacer lines between the attribution and the call to action
    pub spacers_before: usize,

    pub call_to_action: Vec<String>,

    /// Spacer lines between the call to action and the tags
    pub spacers_after: usize,

    pub tags: Vec<String>,
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            spacer: ".".to_string(),
            spacers_before: 7,
            call_to_action: vec!["Follow For More".to_string()],
            spacers_after: 6,
            tags: ["#instagram", "#reels", "#quotes", "#foryou", "#inspirational"]
                .iter()
                .map(|t| t.to_string())
                .collect(),
        }
    }
}

/// Build the caption for `quote`: the quote, its attribution, then the
/// configured call to action and tags.
pub fn compose_caption(quote: &Quote, config: &CaptionConfig) -> String {
    let mut lines = vec![quote.quote.clone(), format!("- {}", quote.author)];

    lines.extend(std::iter::repeat(config.spacer.clone()).take(config.spacers_before));
    lines.extend(config.call_to_action.iter().cloned());
    lines.extend(std::iter::repeat(config.spacer.clone()).take(config.spacers_after));

    if !config.tags.is_empty() {
        lines.push(config.tags.join(" "));
    }

    lines.join("\n")
}
