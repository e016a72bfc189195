//! Inbound webhook event payload.
//!
//! ShotGrid delivers one JSON document per event. Every field is optional on
//! the wire; handlers decide what a missing field means.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::{Status, Timestamp};

/// Top-level webhook body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebhookPayload {
    /// When ShotGrid emitted the event. Kept raw so a malformed value never
    /// rejects the delivery.
    #[serde(default)]
    pub timestamp: Option<Value>,

    /// Event description.
    #[serde(default)]
    pub data: EventData,
}

impl WebhookPayload {
    /// Parses [`Self::timestamp`]. `None` when absent, not a string, or not
    /// RFC 3339.
    pub fn emitted_at(&self) -> Option<Timestamp> {
        self.timestamp
            .as_ref()
            .and_then(Value::as_str)
            .and_then(Timestamp::parse_rfc3339)
    }
}

/// The `data` object of a webhook body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventData {
    #[serde(default)]
    pub event_type: Option<String>,

    /// `entity_id` as sent: outer `None` when the key is absent, inner `None`
    /// when it is `null`.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub entity_id: Option<Option<u64>>,

    #[serde(default)]
    pub entity: Option<EventEntity>,

    #[serde(default)]
    pub meta: EventMeta,
}

impl EventData {
    /// Id of the entity the event concerns.
    ///
    /// An `entity_id` key wins whenever it is present, even as `null`;
    /// otherwise falls back to `entity.id`.
    pub fn entity_id(&self) -> Option<u64> {
        match self.entity_id {
            Some(id) => id,
            None => self.entity.as_ref().and_then(|e| e.id),
        }
    }
}

fn present<'de, D>(deserializer: D) -> Result<Option<Option<u64>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<u64>::deserialize(deserializer).map(Some)
}

/// Entity reference embedded in an event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEntity {
    #[serde(default, rename = "type")]
    pub entity_type: Option<String>,
    #[serde(default)]
    pub id: Option<u64>,
}

/// Attribute-change details of an event.
///
/// `old_value` and `new_value` hold whatever the changed attribute holds:
/// strings for status fields, but numbers, objects, or lists for others.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventMeta {
    #[serde(default, rename = "type")]
    pub meta_type: Option<String>,
    #[serde(default)]
    pub attribute_name: Option<String>,
    #[serde(default)]
    pub old_value: Option<Value>,
    #[serde(default)]
    pub new_value: Option<Value>,
}

impl EventMeta {
    /// `true` when the event changed `attribute`.
    pub fn changes(&self, attribute: &str) -> bool {
        self.attribute_name.as_deref() == Some(attribute)
    }

    /// The previous value as a status, when it is a non-empty string.
    pub fn old_status(&self) -> Option<Status> {
        value_as_status(self.old_value.as_ref())
    }

    /// The new value as a status, when it is a non-empty string.
    pub fn new_status(&self) -> Option<Status> {
        value_as_status(self.new_value.as_ref())
    }
}

fn value_as_status(value: Option<&Value>) -> Option<Status> {
    value.and_then(Value::as_str).and_then(|s| Status::new(s))
}
