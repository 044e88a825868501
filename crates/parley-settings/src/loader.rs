//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`RelaySettings::default()`]
//! 2. If a settings file is given and exists, deep-merge its values over defaults
//! 3. Apply environment variable overrides (highest priority)
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::RelaySettings;

/// Load settings from an optional file, then apply process env overrides.
///
/// A missing file yields defaults. Invalid JSON is an error.
pub fn load_settings(path: Option<&Path>) -> Result<RelaySettings> {
    load_settings_with(path, |name| std::env::var(name).ok())
}

/// Load settings with a custom env lookup.
pub fn load_settings_with<F>(path: Option<&Path>, lookup: F) -> Result<RelaySettings>
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = serde_json::to_value(RelaySettings::default())?;

    let merged = match path {
        Some(path) if path.exists() => {
            debug!(?path, "loading settings from file");
            let content = std::fs::read_to_string(path)?;
            let user: Value = serde_json::from_str(&content)?;
            deep_merge(defaults, user)
        }
        Some(path) => {
            debug!(?path, "settings file not found, using defaults");
            defaults
        }
        None => defaults,
    };

    let mut settings: RelaySettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings, lookup);
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
///
/// - Objects are merged recursively (source overrides target per-key)
/// - Arrays and primitives are replaced entirely by source
/// - Null values in source are skipped (preserving target)
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply environment variable overrides to loaded settings.
///
/// Each env var has strict parsing rules:
/// - Numbers must be valid and within the specified range
/// - Booleans accept: `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`
/// - Invalid values are ignored with a warning (fall back to file/default)
pub fn apply_env_overrides<F>(settings: &mut RelaySettings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let env = EnvReader { lookup };

    // ── Server ──────────────────────────────────────────────────────
    if let Some(v) = env.string("PARLEY_HOST") {
        settings.server.host = v;
    }
    if let Some(v) = env.u16("PORT", 1, 65535) {
        settings.server.port = v;
    }
    if let Some(v) = env.usize("PARLEY_MAX_MESSAGE_SIZE", 1024, 64 * 1024 * 1024) {
        settings.server.max_message_size = v;
    }

    // ── Storage ─────────────────────────────────────────────────────
    if let Some(v) = env.string("PARLEY_HISTORY_PATH") {
        settings.storage.history_path = v;
    }
    if let Some(v) = env.string("PARLEY_USERNAMES_PATH") {
        settings.storage.usernames_path = v;
    }

    // ── Moderation ──────────────────────────────────────────────────
    if let Some(v) = env.string("PARLEY_BLOCKED_WORDS_PATH") {
        settings.moderation.blocked_words_path = v;
    }
    if let Some(v) = env.f64("PARLEY_HEAT_THRESHOLD", 0.0, 100.0) {
        settings.moderation.heat_threshold = v;
    }

    // ── Logging ─────────────────────────────────────────────────────
    if let Some(v) = env.string("PARLEY_LOG_LEVEL") {
        settings.logging.level = v;
    }
    if let Some(v) = env.bool("PARLEY_LOG_JSON") {
        settings.logging.json = v;
    }
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a boolean.
///
/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a string as a `u16` within a range.
pub fn parse_u16_range(val: &str, min: u16, max: u16) -> Option<u16> {
    let n: u16 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `usize` within a range.
pub fn parse_usize_range(val: &str, min: usize, max: usize) -> Option<usize> {
    let n: usize = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a finite `f64` within a range.
pub fn parse_f64_range(val: &str, min: f64, max: f64) -> Option<f64> {
    let n: f64 = val.trim().parse().ok()?;
    (n.is_finite() && n >= min && n <= max).then_some(n)
}

// ── Env var readers (thin wrappers) ─────────────────────────────────────────

struct EnvReader<F> {
    lookup: F,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn raw(&self, name: &str) -> Option<String> {
        (self.lookup)(name)
    }

    fn string(&self, name: &str) -> Option<String> {
        self.raw(name).filter(|v| !v.is_empty())
    }

    fn bool(&self, name: &str) -> Option<bool> {
        let val = self.raw(name)?;
        let result = parse_bool(&val);
        if result.is_none() {
            tracing::warn!(key = name, value = %val, "invalid boolean env var, ignoring");
        }
        result
    }

    fn u16(&self, name: &str, min: u16, max: u16) -> Option<u16> {
        let val = self.raw(name)?;
        let result = parse_u16_range(&val, min, max);
        if result.is_none() {
            tracing::warn!(key = name, value = %val, "invalid u16 env var, ignoring");
        }
        result
    }

    fn usize(&self, name: &str, min: usize, max: usize) -> Option<usize> {
        let val = self.raw(name)?;
        let result = parse_usize_range(&val, min, max);
        if result.is_none() {
            tracing::warn!(key = name, value = %val, "invalid usize env var, ignoring");
        }
        result
    }

    fn f64(&self, name: &str, min: f64, max: f64) -> Option<f64> {
        let val = self.raw(name)?;
        let result = parse_f64_range(&val, min, max);
        if result.is_none() {
            tracing::warn!(key = name, value = %val, "invalid number env var, ignoring");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde_json::json;

    use super::*;
    use crate::errors::SettingsError;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    // ── deep_merge ──────────────────────────────────────────────────

    #[test]
    fn merge_simple_override() {
        let merged = deep_merge(json!({"a": 1, "b": 2}), json!({"b": 3}));
        assert_eq!(merged, json!({"a": 1, "b": 3}));
    }

    #[test]
    fn merge_nested_override() {
        let merged = deep_merge(
            json!({"server": {"host": "0.0.0.0", "port": 3000}}),
            json!({"server": {"port": 8080}}),
        );
        assert_eq!(merged, json!({"server": {"host": "0.0.0.0", "port": 8080}}));
    }

    #[test]
    fn merge_array_replace() {
        let merged = deep_merge(json!({"a": [1, 2, 3]}), json!({"a": [9]}));
        assert_eq!(merged, json!({"a": [9]}));
    }

    #[test]
    fn merge_null_preserves_target() {
        let merged = deep_merge(json!({"a": 1}), json!({"a": null}));
        assert_eq!(merged, json!({"a": 1}));
    }

    #[test]
    fn merge_new_keys_added() {
        let merged = deep_merge(json!({"a": 1}), json!({"b": 2}));
        assert_eq!(merged, json!({"a": 1, "b": 2}));
    }

    #[test]
    fn merge_primitive_replaces_object() {
        let merged = deep_merge(json!({"a": {"x": 1}}), json!({"a": 5}));
        assert_eq!(merged, json!({"a": 5}));
    }

    #[test]
    fn merge_empty_source() {
        let merged = deep_merge(json!({"a": 1}), json!({}));
        assert_eq!(merged, json!({"a": 1}));
    }

    // ── load_settings_with ──────────────────────────────────────────

    #[test]
    fn load_without_path_returns_defaults() {
        let s = load_settings_with(None, no_env).unwrap();
        assert_eq!(s.server.port, 3000);
        assert_eq!(s.storage.history_path, "messages.json");
    }

    #[test]
    fn load_missing_file_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.json");
        let s = load_settings_with(Some(&path), no_env).unwrap();
        assert_eq!(s.server.port, 3000);
    }

    #[test]
    fn load_partial_json_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"moderation": {"heatThreshold": 75.5}, "logging": {"json": true}}"#,
        )
        .unwrap();

        let s = load_settings_with(Some(&path), no_env).unwrap();
        assert!((s.moderation.heat_threshold - 75.5).abs() < f64::EPSILON);
        assert!(s.logging.json);
        assert_eq!(s.moderation.blocked_words_path, "data/badwords.json");
        assert_eq!(s.logging.level, "info");
    }

    #[test]
    fn load_invalid_json_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = load_settings_with(Some(&path), no_env).unwrap_err();
        assert!(matches!(err, SettingsError::Json(_)));
    }

    #[test]
    fn env_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"server": {"port": 8080}}"#).unwrap();

        let s = load_settings_with(Some(&path), env_from(&[("PORT", "9090")])).unwrap();
        assert_eq!(s.server.port, 9090);
    }

    // ── apply_env_overrides ─────────────────────────────────────────

    #[test]
    fn env_overrides_all_fields() {
        let mut s = RelaySettings::default();
        apply_env_overrides(
            &mut s,
            env_from(&[
                ("PARLEY_HOST", "127.0.0.1"),
                ("PORT", "4000"),
                ("PARLEY_MAX_MESSAGE_SIZE", "4096"),
                ("PARLEY_HISTORY_PATH", "/var/lib/parley/messages.json"),
                ("PARLEY_USERNAMES_PATH", "/etc/parley/usernames.json"),
                ("PARLEY_BLOCKED_WORDS_PATH", "/etc/parley/badwords.json"),
                ("PARLEY_HEAT_THRESHOLD", "42.5"),
                ("PARLEY_LOG_LEVEL", "debug"),
                ("PARLEY_LOG_JSON", "yes"),
            ]),
        );
        assert_eq!(s.server.host, "127.0.0.1");
        assert_eq!(s.server.port, 4000);
        assert_eq!(s.server.max_message_size, 4096);
        assert_eq!(s.storage.history_path, "/var/lib/parley/messages.json");
        assert_eq!(s.storage.usernames_path, "/etc/parley/usernames.json");
        assert_eq!(s.moderation.blocked_words_path, "/etc/parley/badwords.json");
        assert!((s.moderation.heat_threshold - 42.5).abs() < f64::EPSILON);
        assert_eq!(s.logging.level, "debug");
        assert!(s.logging.json);
    }

    #[test]
    fn invalid_env_values_are_ignored() {
        let mut s = RelaySettings::default();
        apply_env_overrides(
            &mut s,
            env_from(&[
                ("PORT", "0"),
                ("PARLEY_HEAT_THRESHOLD", "150"),
                ("PARLEY_LOG_JSON", "maybe"),
                ("PARLEY_HOST", ""),
            ]),
        );
        assert_eq!(s.server.port, 3000);
        assert!((s.moderation.heat_threshold - 60.0).abs() < f64::EPSILON);
        assert!(!s.logging.json);
        assert_eq!(s.server.host, "0.0.0.0");
    }

    // ── parsers ─────────────────────────────────────────────────────

    #[test]
    fn parse_bool_variants() {
        for v in ["true", "1", "yes", "on", "TRUE", "On"] {
            assert_eq!(parse_bool(v), Some(true), "{v}");
        }
        for v in ["false", "0", "no", "off", "False"] {
            assert_eq!(parse_bool(v), Some(false), "{v}");
        }
        assert_eq!(parse_bool(""), None);
        assert_eq!(parse_bool("2"), None);
    }

    #[test]
    fn parse_u16_range_bounds() {
        assert_eq!(parse_u16_range("3000", 1, 65535), Some(3000));
        assert_eq!(parse_u16_range("0", 1, 65535), None);
        assert_eq!(parse_u16_range("70000", 1, 65535), None);
        assert_eq!(parse_u16_range("abc", 1, 65535), None);
    }

    #[test]
    fn parse_usize_range_bounds() {
        assert_eq!(parse_usize_range("2048", 1024, 4096), Some(2048));
        assert_eq!(parse_usize_range("10", 1024, 4096), None);
    }

    #[test]
    fn parse_f64_range_bounds() {
        assert_eq!(parse_f64_range("60", 0.0, 100.0), Some(60.0));
        assert_eq!(parse_f64_range(" 0 ", 0.0, 100.0), Some(0.0));
        assert_eq!(parse_f64_range("100", 0.0, 100.0), Some(100.0));
        assert_eq!(parse_f64_range("-1", 0.0, 100.0), None);
        assert_eq!(parse_f64_range("NaN", 0.0, 100.0), None);
        assert_eq!(parse_f64_range("inf", 0.0, 100.0), None);
        assert_eq!(parse_f64_range("hot", 0.0, 100.0), None);
    }
}
