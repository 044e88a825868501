//! Moderation evaluation engine.
//!
//! Holds the obscenity dictionary and the compiled heat patterns for the
//! custom blocked-word list. Both are immutable for the life of the process,
//! so one engine is shared by every connection without locking.

use tracing::debug;

use crate::dictionary::Dictionary;
use crate::errors::{ModerationError, Result};
use crate::heat::{DEFAULT_HEAT_THRESHOLD, HeatPattern};

/// Outcome of evaluating one message.
#[derive(Clone, Debug, PartialEq)]
pub enum Verdict {
    /// Passed both checks.
    Allowed,
    /// Failed a check; the message must be dropped silently.
    Blocked(BlockReason),
}

impl Verdict {
    /// Whether the message may be stored and broadcast.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Which check rejected a message. Used for logs and metrics only.
#[derive(Clone, Debug, PartialEq)]
pub enum BlockReason {
    /// The text contains a dictionary term.
    Profanity {
        /// The matched term.
        term: String,
    },
    /// The text is mostly made of one blocked word.
    Heat {
        /// The blocked word.
        word: String,
        /// The computed heat percentage.
        heat: f64,
    },
}

impl BlockReason {
    /// Short classification string for logging/metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Profanity { .. } => "profanity",
            Self::Heat { .. } => "heat",
        }
    }
}

/// Decides whether a message text is allowed.
pub struct ModerationEngine {
    dictionary: Dictionary,
    patterns: Vec<HeatPattern>,
    threshold: f64,
}

impl ModerationEngine {
    /// Built-in dictionary extended by `blocked_words`, default threshold.
    pub fn new(blocked_words: &[String]) -> Result<Self> {
        Self::with_threshold(blocked_words, DEFAULT_HEAT_THRESHOLD)
    }

    /// Built-in dictionary extended by `blocked_words`, custom threshold.
    pub fn with_threshold(blocked_words: &[String], threshold: f64) -> Result<Self> {
        Self::from_parts(Dictionary::with_defaults(blocked_words), blocked_words, threshold)
    }

    /// Explicit dictionary and heat word list.
    pub fn from_parts(
        dictionary: Dictionary,
        blocked_words: &[String],
        threshold: f64,
    ) -> Result<Self> {
        if !(0.0..=100.0).contains(&threshold) {
            return Err(ModerationError::InvalidThreshold(threshold));
        }

        let patterns = blocked_words
            .iter()
            .map(|w| w.trim())
            .filter(|w| !w.is_empty())
            .map(HeatPattern::new)
            .collect::<std::result::Result<Vec<_>, _>>()?;

        debug!(
            dictionary_terms = dictionary.len(),
            heat_patterns = patterns.len(),
            threshold,
            "ModerationEngine initialized"
        );

        Ok(Self {
            dictionary,
            patterns,
            threshold,
        })
    }

    /// Evaluate a message text. Both checks must pass.
    pub fn evaluate(&self, text: &str) -> Verdict {
        if let Some(term) = self.dictionary.find(text) {
            return Verdict::Blocked(BlockReason::Profanity {
                term: term.to_owned(),
            });
        }

        for pattern in &self.patterns {
            let heat = pattern.score(text);
            if heat >= self.threshold {
                return Verdict::Blocked(BlockReason::Heat {
                    word: pattern.word().to_owned(),
                    heat,
                });
            }
        }

        Verdict::Allowed
    }

    /// Heat threshold in percent.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Number of custom blocked words scored for heat.
    pub fn blocked_word_count(&self) -> usize {
        self.patterns.len()
    }
}

impl std::fmt::Debug for ModerationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModerationEngine")
            .field("dictionary_terms", &self.dictionary.len())
            .field("heat_patterns", &self.patterns.len())
            .field("threshold", &self.threshold)
            .finish()
    }
}
