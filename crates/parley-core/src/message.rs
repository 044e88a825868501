//! Chat payloads as they travel over the wire and into the history file.
//!
//! Every frame is a JSON object. The `type` field selects the handling path:
//! `"message"` payloads are moderated, stamped, and persisted; any other
//! discriminator is relayed to the other clients untouched.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::FrameError;

/// Discriminator value for chat utterances.
pub const CHAT_MESSAGE_TYPE: &str = "message";

const TIMESTAMP_FIELD: &str = "timestamp";

/// One chat utterance.
///
/// Known fields are typed; everything else the client sent (display name,
/// avatar, ...) lands in `extra` and is re-emitted verbatim.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Payload discriminator, `"message"` for chat utterances.
    #[serde(rename = "type")]
    pub kind: String,
    /// Text content.
    pub message: String,
    /// Server acceptance time. Client-supplied values are overwritten.
    #[serde(
        default,
        with = "timestamp_millis",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<DateTime<Utc>>,
    /// Opaque passthrough fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ChatMessage {
    /// Build an unstamped chat message with no extra fields.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            kind: CHAT_MESSAGE_TYPE.to_owned(),
            message: message.into(),
            timestamp: None,
            extra: Map::new(),
        }
    }

    /// Attach an opaque passthrough field.
    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        let _ = self.extra.insert(key.into(), value);
        self
    }

    /// Whether this record carries the chat discriminator.
    pub fn is_chat(&self) -> bool {
        self.kind == CHAT_MESSAGE_TYPE
    }

    /// Overwrite the timestamp with `at`, truncated to the millisecond
    /// precision the history file stores.
    pub fn stamp(&mut self, at: DateTime<Utc>) {
        self.timestamp = Some(at.trunc_subsecs(3));
        let _ = self.extra.remove(TIMESTAMP_FIELD);
    }

    /// Decode a persisted history record.
    ///
    /// Unlike inbound frames, a stored `timestamp` that is not RFC 3339 is
    /// kept verbatim in `extra` so rewriting the file never loses it.
    pub fn from_record(mut record: Value) -> Result<Self, serde_json::Error> {
        let legacy = record.as_object_mut().and_then(|fields| {
            let unparseable = fields
                .get(TIMESTAMP_FIELD)
                .is_some_and(|ts| timestamp_millis::parse(ts).is_none());
            if unparseable {
                fields.remove(TIMESTAMP_FIELD)
            } else {
                None
            }
        });

        let mut message: Self = serde_json::from_value(record)?;
        if let Some(raw) = legacy {
            let _ = message.extra.insert(TIMESTAMP_FIELD.to_owned(), raw);
        }
        Ok(message)
    }

    /// Serialize to a single JSON text frame.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// A parsed inbound frame.
#[derive(Clone, Debug, PartialEq)]
pub enum InboundFrame {
    /// A `type: "message"` payload subject to moderation and persistence.
    Chat(ChatMessage),
    /// Any other object payload, kept as the raw frame text for verbatim relay.
    Relay(String),
}

/// Parse one text frame.
pub fn parse_frame(text: &str) -> Result<InboundFrame, FrameError> {
    let value: Value = serde_json::from_str(text).map_err(FrameError::InvalidJson)?;
    let Value::Object(map) = value else {
        return Err(FrameError::NotAnObject);
    };

    if map.get("type").and_then(Value::as_str) == Some(CHAT_MESSAGE_TYPE) {
        let chat = serde_json::from_value(Value::Object(map)).map_err(FrameError::InvalidChat)?;
        Ok(InboundFrame::Chat(chat))
    } else {
        Ok(InboundFrame::Relay(text.to_owned()))
    }
}

/// RFC 3339 with millisecond precision and a `Z` suffix on the way out;
/// anything unparseable on the way in becomes `None`.
mod timestamp_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(
        timestamp: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match timestamp {
            Some(ts) => serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.as_ref().and_then(parse))
    }

    pub(super) fn parse(value: &Value) -> Option<DateTime<Utc>> {
        value
            .as_str()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|ts| ts.with_timezone(&Utc))
    }
}
