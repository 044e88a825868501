//! Obscenity dictionary.
//!
//! Matching is a case-insensitive literal substring test with no word
//! boundaries, so entries are chosen to avoid fragments of everyday words
//! ("hell" would block "hello").
//!
//! Short standalone words such as "ass", "hell", and "damn" are therefore not
//! built in and pass moderation unless the operator adds them to the custom
//! blocked-word list, accepting the substring matches that come with them.

/// Built-in general-purpose obscenity list.
pub const DEFAULT_OBSCENITIES: &[&str] = &[
    "arsehole",
    "asshole",
    "bastard",
    "bitch",
    "blowjob",
    "bollocks",
    "bullshit",
    "cocksucker",
    "cunt",
    "dickhead",
    "dildo",
    "dumbass",
    "faggot",
    "fuck",
    "handjob",
    "jackass",
    "jerkoff",
    "jizz",
    "motherfucker",
    "nigga",
    "nigger",
    "piss",
    "porn",
    "pussy",
    "shit",
    "slut",
    "twat",
    "wanker",
    "whore",
];

/// Lower-cased set of terms that fail the dictionary check.
#[derive(Clone, Debug, Default)]
pub struct Dictionary {
    terms: Vec<String>,
}

impl Dictionary {
    /// The built-in list extended by `extra` terms.
    pub fn with_defaults<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut dict = Self::from_terms(DEFAULT_OBSCENITIES.iter().copied());
        dict.extend(extra);
        dict
    }

    /// Only the given terms, no built-in list.
    pub fn from_terms<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut dict = Self::default();
        dict.extend(terms);
        dict
    }

    /// Add terms. Blank and duplicate entries are ignored.
    pub fn extend<I, S>(&mut self, terms: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for term in terms {
            let term = term.as_ref().trim().to_lowercase();
            if !term.is_empty() && !self.terms.contains(&term) {
                self.terms.push(term);
            }
        }
    }

    /// First term contained in `text`, if any.
    pub fn find(&self, text: &str) -> Option<&str> {
        let haystack = text.to_lowercase();
        self.terms
            .iter()
            .find(|term| haystack.contains(term.as_str()))
            .map(String::as_str)
    }

    /// Number of terms.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Whether the dictionary has no terms.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}
