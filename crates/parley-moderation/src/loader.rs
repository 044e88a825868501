//! Custom blocked-word list loading.
//!
//! The list is a JSON array of strings. A missing file yields an empty list;
//! a file that exists but cannot be read or parsed is an error.

use std::path::Path;

use tracing::{debug, warn};

use crate::errors::Result;

/// Load the custom blocked-word list from `path`.
///
/// Entries are trimmed and blank entries dropped.
pub fn load_blocked_words(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        warn!(?path, "blocked-word list not found, heat check disabled");
        return Ok(Vec::new());
    }

    let content = std::fs::read_to_string(path)?;
    let raw: Vec<String> = serde_json::from_str(&content)?;
    let words: Vec<String> = raw
        .into_iter()
        .map(|w| w.trim().to_owned())
        .filter(|w| !w.is_empty())
        .collect();

    debug!(?path, count = words.len(), "loaded blocked-word list");
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ModerationError;
    use assert_matches::assert_matches;

    #[test]
    fn missing_file_is_empty_list() {
        let dir = tempfile::tempdir().unwrap();
        let words = load_blocked_words(&dir.path().join("nope.json")).unwrap();
        assert!(words.is_empty());
    }

    #[test]
    fn loads_and_trims_words() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("badwords.json");
        std::fs::write(&path, r#"[" spam ", "", "eggs"]"#).unwrap();
        let words = load_blocked_words(&path).unwrap();
        assert_eq!(words, vec!["spam".to_owned(), "eggs".to_owned()]);
    }

    #[test]
    fn invalid_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("badwords.json");
        std::fs::write(&path, r#"{"not": "a list"}"#).unwrap();
        assert_matches!(load_blocked_words(&path), Err(ModerationError::Json(_)));
    }
}
