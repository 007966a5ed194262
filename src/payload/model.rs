//! Payload variants.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Action descriptor derived from event data.
///
/// The persisted JSON form is tagged by `type` with one of
/// `app`, `link`, `ping`, `raw`, `text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Payload {
    App {
        package: String,
    },
    Link {
        url: String,
    },
    Text {
        text: String,
        #[serde(default)]
        clipboard: bool,
    },
    Ping,
    Raw {
        #[serde(default)]
        fields: BTreeMap<String, String>,
    },
}

/// Icon selector resolved to a platform asset by the rendering layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Icon {
    Store,
    Link,
    Text,
    Ping,
    Raw,
}

impl Icon {
    pub fn asset_name(&self) -> &'static str {
        match self {
            Icon::Store => "ic_shop",
            Icon::Link => "ic_link",
            Icon::Text => "ic_text",
            Icon::Ping => "ic_notification",
            Icon::Raw => "ic_code",
        }
    }
}

impl Payload {
    /// Discriminator written to the `type` attribute.
    pub fn type_tag(&self) -> &'static str {
        match self {
            Payload::App { .. } => "app",
            Payload::Link { .. } => "link",
            Payload::Text { .. } => "text",
            Payload::Ping => "ping",
            Payload::Raw { .. } => "raw",
        }
    }

    /// Human-readable summary, if the variant has one.
    pub fn display(&self) -> Option<String> {
        match self {
            Payload::App { package } => Some(package.clone()),
            Payload::Link { url } => Some(url.clone()),
            Payload::Text { text, .. } => Some(text.clone()),
            Payload::Ping => None,
            Payload::Raw { fields } if fields.is_empty() => None,
            Payload::Raw { fields } => serde_json::to_string(fields).ok(),
        }
    }

    pub fn icon(&self) -> Icon {
        match self {
            Payload::App { .. } => Icon::Store,
            Payload::Link { .. } => Icon::Link,
            Payload::Text { .. } => Icon::Text,
            Payload::Ping => Icon::Ping,
            Payload::Raw { .. } => Icon::Raw,
        }
    }
}
