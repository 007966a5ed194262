//! Payload decoding and encoding.
//!
//! `decode` is total: an unknown tag or data that does not fit the tagged
//! variant yields `None`, never an error, so ingestion always proceeds.

use std::collections::HashMap;

use serde_json::Value;

use crate::payload::fields::{non_blank, parse_flag};
use crate::payload::model::Payload;

/// Event data attribute holding the payload discriminator.
pub const TYPE_KEY: &str = "type";

pub const PACKAGE_KEY: &str = "package";
pub const URL_KEY: &str = "url";
pub const TEXT_KEY: &str = "text";
pub const CLIPBOARD_KEY: &str = "clipboard";

/// Reconstruct a payload from event data.
///
/// # Examples
/// ```
/// use std::collections::HashMap;
/// use pushinbox_core::payload::{decode, Payload};
///
/// let data = HashMap::from([("package".to_string(), "com.foo".to_string())]);
/// assert_eq!(
///     decode(Some("app"), &data),
///     Some(Payload::App { package: "com.foo".to_string() })
/// );
/// assert_eq!(decode(Some("video"), &data), None);
/// ```
pub fn decode(type_tag: Option<&str>, data: &HashMap<String, String>) -> Option<Payload> {
    let tag = type_tag?;
    let payload = match tag {
        "app" => non_blank(data, PACKAGE_KEY).map(|package| Payload::App {
            package: package.to_string(),
        }),
        "link" => non_blank(data, URL_KEY).map(|url| Payload::Link {
            url: url.to_string(),
        }),
        "text" => decode_text(data),
        "ping" => Some(Payload::Ping),
        "raw" => Some(Payload::Raw {
            fields: data
                .iter()
                .filter(|(k, _)| k.as_str() != TYPE_KEY)
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }),
        _ => None,
    };

    if payload.is_none() {
        log::debug!("PAYLOAD_DECODE_SKIPPED type={} keys={}", tag, data.len());
    }
    payload
}

fn decode_text(data: &HashMap<String, String>) -> Option<Payload> {
    let text = data.get(TEXT_KEY)?;
    let clipboard = match data.get(CLIPBOARD_KEY) {
        Some(raw) => parse_flag(raw)?,
        None => false,
    };
    Some(Payload::Text {
        text: text.clone(),
        clipboard,
    })
}

/// Flatten a payload back into event data, including the `type` attribute.
///
/// Returns `None` for values event data cannot carry: a blank package or
/// url, or a raw payload with its own `type` field. Whatever this returns
/// decodes back to the same payload.
pub fn encode(payload: &Payload) -> Option<HashMap<String, String>> {
    let mut data = HashMap::new();
    match payload {
        Payload::App { package } => {
            data.insert(PACKAGE_KEY.to_string(), carried(payload, package)?);
        }
        Payload::Link { url } => {
            data.insert(URL_KEY.to_string(), carried(payload, url)?);
        }
        Payload::Text { text, clipboard } => {
            data.insert(TEXT_KEY.to_string(), text.clone());
            data.insert(CLIPBOARD_KEY.to_string(), clipboard.to_string());
        }
        Payload::Ping => {}
        Payload::Raw { fields } => {
            if fields.contains_key(TYPE_KEY) {
                log::debug!("PAYLOAD_ENCODE_SKIPPED type=raw reason=reserved_key");
                return None;
            }
            data.extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
    }
    data.insert(TYPE_KEY.to_string(), payload.type_tag().to_string());
    Some(data)
}

fn carried(payload: &Payload, value: &str) -> Option<String> {
    if value.trim().is_empty() {
        log::debug!(
            "PAYLOAD_ENCODE_SKIPPED type={} reason=blank",
            payload.type_tag()
        );
        return None;
    }
    Some(value.to_string())
}

/// Persisted JSON form of a payload.
pub fn to_json(payload: &Payload) -> Result<String, serde_json::Error> {
    serde_json::to_string(payload)
}

/// Read the persisted JSON form back.
///
/// A record written by another version with an unknown tag reads as `None`.
pub fn from_json(json: &str) -> Option<Payload> {
    match serde_json::from_str::<Payload>(json) {
        Ok(payload) => Some(payload),
        Err(e) => {
            log::debug!("PAYLOAD_JSON_SKIPPED error={}", e);
            None
        }
    }
}

/// Convert a JSON value to its event data string representation.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => value.to_string(),
    }
}
