//! Persisted message model.

use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::payload::Payload;

/// A normalized push event as stored in the inbox.
///
/// Messages are immutable once stored; a re-delivery with the same
/// `message_id` replaces the whole record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub message_id: String,
    pub from: Option<String>,
    pub to: Option<String>,
    pub title: Option<String>,
    pub body: Option<String>,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub data: HashMap<String, String>,
    pub collapse_key: Option<String>,
    pub message_type: Option<String>,
    pub sent_time: i64,
    pub ttl: i32,
    pub priority: i32,
    pub original_priority: i32,
    pub payload: Option<Payload>,
}

impl Message {
    /// Indented JSON of the whole record, shown when a message is expanded.
    pub fn raw_display(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Sent time clamped so a sender clock ahead of ours never shows a
    /// future timestamp.
    pub fn display_sent_time(&self, now_ms: i64) -> i64 {
        self.sent_time.min(now_ms)
    }

    /// [`Message::display_sent_time`] against the current wall clock.
    pub fn display_sent_time_now(&self) -> i64 {
        self.display_sent_time(Utc::now().timestamp_millis())
    }
}
