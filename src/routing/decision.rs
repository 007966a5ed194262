//! Side-effect decision logic.
//!
//! Determines which hooks fire for a freshly stored message.

use crate::logging::structured::LogContext;
use crate::payload::{flag_is_set, Payload};
use crate::storage::models::Message;

/// Event data attribute that suppresses the notification when `true`.
pub const HIDE_KEY: &str = "hide";

/// Side effect triggered by a stored message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Notify,
    CopyToClipboard(String),
}

impl Effect {
    pub fn as_str(&self) -> &str {
        match self {
            Effect::Notify => "notify",
            Effect::CopyToClipboard(_) => "clipboard",
        }
    }
}

/// Determine the side effects for a message.
///
/// # Decision Tree
/// 1. Unless `data["hide"]` is `true` -> Notify
/// 2. If the payload is text flagged for the clipboard -> CopyToClipboard
pub fn plan_effects(message: &Message, ctx: &LogContext) -> Vec<Effect> {
    let mut effects = Vec::new();

    if flag_is_set(&message.data, HIDE_KEY) {
        log::debug!("{} EFFECT_SKIPPED effect=notify reason=hidden", ctx);
    } else {
        effects.push(Effect::Notify);
    }

    if let Some(Payload::Text {
        text,
        clipboard: true,
    }) = &message.payload
    {
        effects.push(Effect::CopyToClipboard(text.clone()));
    }

    log::debug!(
        "{} EFFECTS_PLANNED effects={:?}",
        ctx,
        effects.iter().map(Effect::as_str).collect::<Vec<_>>()
    );
    effects
}
