use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

pub const OPEN_QUOTE: char = '\u{201C}';
pub const CLOSE_QUOTE: char = '\u{201D}';

/// A quote and its author, as fetched on a given day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Quote text, always wrapped in typographic quotes
    pub quote: String,
    pub author: String,
    pub fetched_on: NaiveDate,
}

impl Quote {
    /// A quote fetched today
    pub fn new(quote: &str, author: impl Into<String>) -> Self {
        Self::fetched(quote, author, Local::now().date_naive())
    }

    pub fn fetched(quote: &str, author: impl Into<String>, fetched_on: NaiveDate) -> Self {
        Self {
            quote: wrap_in_quotes(quote),
            author: author.into(),
            fetched_on,
        }
    }

    /// Whether this is the quote of `day`
    pub fn is_from(&self, day: NaiveDate) -> bool {
        self.fetched_on == day
    }
}

fn wrap_in_quotes(text: &str) -> String {
    let text = text.trim();
    if text.starts_with(OPEN_QUOTE) && text.ends_with(CLOSE_QUOTE) {
        text.to_string()
    } else {
        format!("{}{}{}", OPEN_QUOTE, text, CLOSE_QUOTE)
    }
}
