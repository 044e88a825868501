//! Heat scoring.
//!
//! `heat(text, w) = 100 * (total length of all matches of w in text) / length(text)`.
//!
//! The blocked word is compiled as a case-insensitive regular expression so
//! lists may carry patterns; a word that is not a valid pattern is matched
//! literally. Matches are non-overlapping, scanned left to right. Lengths are
//! counted in Unicode scalar values.

use regex::{Regex, RegexBuilder};

/// Heat at or above which a message is blocked.
pub const DEFAULT_HEAT_THRESHOLD: f64 = 60.0;

/// A blocked word compiled for heat scoring.
#[derive(Clone, Debug)]
pub struct HeatPattern {
    word: String,
    regex: Regex,
}

impl HeatPattern {
    /// Compile `word`, falling back to a literal match if it is not a valid
    /// pattern.
    pub fn new(word: &str) -> Result<Self, regex::Error> {
        let regex = match RegexBuilder::new(word).case_insensitive(true).build() {
            Ok(regex) => regex,
            Err(_) => RegexBuilder::new(&regex::escape(word))
                .case_insensitive(true)
                .build()?,
        };
        Ok(Self {
            word: word.to_owned(),
            regex,
        })
    }

    /// The blocked word this pattern was built from.
    pub fn word(&self) -> &str {
        &self.word
    }

    /// Percentage of `text` consumed by matches. Empty text scores 0.
    #[allow(clippy::cast_precision_loss)]
    pub fn score(&self, text: &str) -> f64 {
        let total = text.chars().count();
        if total == 0 {
            return 0.0;
        }
        let matched: usize = self
            .regex
            .find_iter(text)
            .map(|m| m.as_str().chars().count())
            .sum();
        100.0 * matched as f64 / total as f64
    }
}

/// One-shot heat score of `text` against `word`.
pub fn heat(text: &str, word: &str) -> f64 {
    HeatPattern::new(word).map_or(0.0, |pattern| pattern.score(text))
}
