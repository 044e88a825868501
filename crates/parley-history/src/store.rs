//! File-backed history store.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use parley_core::ChatMessage;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::errors::{HistoryError, Result};

/// Ordered history of accepted messages.
///
/// Appends are serialized by a writer lock held across the push and the file
/// rewrite, so concurrent appends never interleave. The entries lock is only
/// held while the log is encoded, never during disk I/O, so readers such as
/// [`len`](Self::len) and [`snapshot`](Self::snapshot) do not wait on the disk.
pub struct HistoryStore {
    path: PathBuf,
    writer: Mutex<()>,
    entries: Mutex<Vec<ChatMessage>>,
}

impl HistoryStore {
    /// Rebuild the store from whatever was last persisted at `path`.
    ///
    /// A missing, unreadable, or corrupt file yields an empty history; the
    /// condition is logged, never fatal.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match read_entries(&path) {
            Ok(entries) => {
                info!(?path, count = entries.len(), "loaded chat history");
                entries
            }
            Err(HistoryError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(?path, "no chat history file, starting empty");
                Vec::new()
            }
            Err(e) => {
                warn!(?path, error = %e, "failed to load chat history, starting empty");
                Vec::new()
            }
        };

        Self {
            path,
            writer: Mutex::new(()),
            entries: Mutex::new(entries),
        }
    }

    /// Append `message` and rewrite the whole file before returning.
    ///
    /// On a write failure the message stays in memory and the error is
    /// returned for the caller to log; durability catches up on the next
    /// successful append.
    pub fn append(&self, message: ChatMessage) -> Result<()> {
        let _writer = self.writer.lock();
        let (json, count) = {
            let mut entries = self.entries.lock();
            entries.push(message);
            (serde_json::to_vec(&*entries)?, entries.len())
        };
        write_file(&self.path, &json)?;
        debug!(count, "chat history persisted");
        Ok(())
    }

    /// Full ordered history eligible for replay (`type == "message"` only).
    pub fn snapshot(&self) -> Vec<ChatMessage> {
        self.entries
            .lock()
            .iter()
            .filter(|m| m.is_chat())
            .cloned()
            .collect()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Debug for HistoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryStore")
            .field("path", &self.path)
            .field("len", &self.len())
            .finish()
    }
}

/// Read the history file. Records that are not valid messages are skipped.
fn read_entries(path: &Path) -> Result<Vec<ChatMessage>> {
    let content = std::fs::read_to_string(path)?;
    let Value::Array(records) = serde_json::from_str::<Value>(&content)? else {
        return Err(HistoryError::NotAnArray);
    };

    let mut entries = Vec::with_capacity(records.len());
    for (index, record) in records.into_iter().enumerate() {
        match ChatMessage::from_record(record) {
            Ok(message) => entries.push(message),
            Err(e) => warn!(index, error = %e, "skipping malformed history record"),
        }
    }
    Ok(entries)
}

/// Rewrite the history file through a sibling temp file and a rename, so a
/// crash mid-write never leaves a truncated log behind. The temp file is
/// removed again if either step fails.
fn write_file(path: &Path, json: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let tmp = temp_path(path);
    let written = std::fs::write(&tmp, json).and_then(|()| std::fs::rename(&tmp, path));
    if let Err(e) = written {
        let _ = std::fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut tmp: OsString = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    fn stamped(text: &str, secs: u32) -> ChatMessage {
        let mut m = ChatMessage::new(text);
        m.stamp(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, secs).unwrap());
        m
    }

    #[test]
    fn missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::load(dir.path().join("messages.json"));
        assert!(store.is_empty());
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("messages.json");
        std::fs::write(&path, "{{{ not json").unwrap();
        let store = HistoryStore::load(&path);
        assert!(store.is_empty());
    }

    #[test]
    fn non_array_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("messages.json");
        std::fs::write(&path, r#"{"type":"message","message":"x"}"#).unwrap();
        assert_matches!(read_entries(&path), Err(HistoryError::NotAnArray));
        assert!(HistoryStore::load(&path).is_empty());
    }

    #[test]
    fn append_rewrites_entire_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("messages.json");
        let store = HistoryStore::load(&path);

        store.append(stamped("one", 1)).unwrap();
        store.append(stamped("two", 2)).unwrap();

        let on_disk: Vec<Value> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk.len(), 2);
        assert_eq!(on_disk[0]["message"], "one");
        assert_eq!(on_disk[1]["message"], "two");
        assert_eq!(on_disk[1]["timestamp"], "2024-01-01T00:00:02.000Z");
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn reload_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("messages.json");
        let sequence = vec![
            stamped("first", 1),
            stamped("second", 2).with_extra("username", serde_json::json!("ada")),
            stamped("third", 3),
        ];

        let store = HistoryStore::load(&path);
        for m in &sequence {
            store.append(m.clone()).unwrap();
        }
        drop(store);

        let reloaded = HistoryStore::load(&path);
        assert_eq!(reloaded.snapshot(), sequence);
    }

    #[test]
    fn snapshot_only_replays_chat_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("messages.json");
        std::fs::write(
            &path,
            r#"[
                {"type":"message","message":"a"},
                {"type":"typing","message":"b"},
                {"type":"message","message":"c"}
            ]"#,
        )
        .unwrap();

        let store = HistoryStore::load(&path);
        assert_eq!(store.len(), 3);
        let texts: Vec<String> = store.snapshot().into_iter().map(|m| m.message).collect();
        assert_eq!(texts, vec!["a", "c"]);
    }

    #[test]
    fn malformed_records_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("messages.json");
        std::fs::write(
            &path,
            r#"[{"type":"message","message":"ok"}, 7, {"type":"message"}]"#,
        )
        .unwrap();

        let store = HistoryStore::load(&path);
        assert_eq!(store.len(), 1);
        assert_eq!(store.snapshot()[0].message, "ok");
    }

    #[test]
    fn write_failure_keeps_memory_consistent() {
        let dir = tempfile::tempdir().unwrap();
        // parent "blocker" is a regular file, so the rewrite cannot succeed
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        let store = HistoryStore::load(blocker.join("messages.json"));

        let result = store.append(stamped("kept", 1));
        assert_matches!(result, Err(HistoryError::Io(_)));
        assert_eq!(store.len(), 1);
        assert_eq!(store.snapshot()[0].message, "kept");
    }

    #[test]
    fn failed_rename_removes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        // a non-empty directory sits where the history file should go
        let path = dir.path().join("messages.json");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("occupied"), "").unwrap();
        let store = HistoryStore::load(&path);

        assert_matches!(store.append(stamped("lost", 1)), Err(HistoryError::Io(_)));
        assert!(!temp_path(&path).exists());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn unparseable_stored_timestamp_survives_rewrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("messages.json");
        std::fs::write(
            &path,
            r#"[
                {"type":"message","message":"old","timestamp":1714557600000},
                {"type":"message","message":"older","timestamp":"2024-05-01 12:00"}
            ]"#,
        )
        .unwrap();

        let store = HistoryStore::load(&path);
        store.append(ChatMessage::new("new")).unwrap();

        let on_disk: Vec<Value> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk.len(), 3);
        assert_eq!(on_disk[0]["timestamp"], 1_714_557_600_000_i64);
        assert_eq!(on_disk[1]["timestamp"], "2024-05-01 12:00");
        assert_eq!(on_disk[2]["message"], "new");

        let replay = store.snapshot();
        assert_eq!(replay[0].extra["timestamp"], 1_714_557_600_000_i64);
        assert_eq!(replay[1].extra["timestamp"], "2024-05-01 12:00");
    }

    #[test]
    fn readers_do_not_wait_on_the_writer() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::load(dir.path().join("messages.json"));
        store.append(stamped("one", 1)).unwrap();

        // stands in for an append that is stuck in the file rewrite
        let _writer = store.writer.lock();
        assert_eq!(store.len(), 1);
        assert!(!store.is_empty());
        assert_eq!(store.snapshot()[0].message, "one");
    }

    #[test]
    fn creates_missing_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("messages.json");
        let store = HistoryStore::load(&path);
        store.append(stamped("hi", 1)).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn concurrent_appends_do_not_interleave() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("messages.json");
        let store = Arc::new(HistoryStore::load(&path));

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for i in 0..10 {
                        store.append(ChatMessage::new(format!("{t}-{i}"))).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(store.len(), 80);
        let reloaded = HistoryStore::load(&path);
        assert_eq!(reloaded.snapshot(), store.snapshot());
    }
}
