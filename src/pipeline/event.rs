//! Inbound push events and their normalization.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::payload::{decode, value_to_string, TYPE_KEY};
use crate::pipeline::context::IngestContext;
use crate::storage::models::Message;

/// Display part of a push event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub title: Option<String>,
    pub body: Option<String>,
    pub image_url: Option<String>,
}

/// Envelope of a push event as delivered by the transport.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteEvent {
    pub from: Option<String>,
    pub to: Option<String>,
    pub notification: Option<Notification>,
    #[serde(default, deserialize_with = "data_map")]
    pub data: HashMap<String, String>,
    pub collapse_key: Option<String>,
    pub message_id: Option<String>,
    pub message_type: Option<String>,
    #[serde(default)]
    pub sent_time: i64,
    #[serde(default)]
    pub ttl: i32,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub original_priority: i32,
}

impl RemoteEvent {
    /// Parse an event from its JSON envelope.
    ///
    /// Non-string data values are accepted and stringified.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

fn data_map<'de, D>(deserializer: D) -> Result<HashMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<HashMap<String, Value>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(k, v)| (k, value_to_string(&v)))
        .collect())
}

/// Normalize an event into a message, decoding its payload from `data`.
pub fn normalize(event: RemoteEvent, ctx: &IngestContext) -> Message {
    let notification = event.notification.unwrap_or_default();
    let message_id = event
        .message_id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| ctx.fallback_message_id());
    let payload = decode(event.data.get(TYPE_KEY).map(String::as_str), &event.data);

    Message {
        message_id,
        from: event.from,
        to: event.to,
        title: notification.title,
        body: notification.body,
        image_url: notification.image_url.unwrap_or_default(),
        data: event.data,
        collapse_key: event.collapse_key,
        message_type: event.message_type,
        sent_time: event.sent_time,
        ttl: event.ttl,
        priority: event.priority,
        original_priority: event.original_priority,
        payload,
    }
}
