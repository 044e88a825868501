//! Settings types.

use serde::{Deserialize, Serialize};

/// Root settings object.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RelaySettings {
    /// Network settings.
    pub server: ServerSettings,
    /// File locations for history and static resources.
    pub storage: StorageSettings,
    /// Moderation policy inputs.
    pub moderation: ModerationSettings,
    /// Log output.
    pub logging: LoggingSettings,
}

/// Server network settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Bind address.
    pub host: String,
    /// Listening port.
    pub port: u16,
    /// Max inbound WebSocket message size in bytes.
    pub max_message_size: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            max_message_size: 1024 * 1024,
        }
    }
}

/// File locations.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StorageSettings {
    /// JSON file holding the persisted chat history.
    pub history_path: String,
    /// JSON file served at `GET /usernames`.
    pub usernames_path: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            history_path: "messages.json".to_string(),
            usernames_path: "data/usernames.json".to_string(),
        }
    }
}

/// Moderation inputs.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModerationSettings {
    /// JSON array of custom blocked words.
    pub blocked_words_path: String,
    /// Heat percentage at or above which a message is blocked.
    pub heat_threshold: f64,
}

impl Default for ModerationSettings {
    fn default() -> Self {
        Self {
            blocked_words_path: "data/badwords.json".to_string(),
            heat_threshold: 60.0,
        }
    }
}

/// Log output settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
    /// Emit JSON lines instead of compact text.
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}
