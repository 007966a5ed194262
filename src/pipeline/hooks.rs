//! Side-effect collaborators invoked after a message is stored.
//!
//! Implementations live in the platform layer. Errors are logged by the
//! pipeline and never undo the stored message.

use crate::storage::models::Message;

/// Shows a notification banner for a stored message.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &Message) -> anyhow::Result<()>;
}

/// Places text on the system clipboard.
pub trait Clipboard: Send + Sync {
    fn copy_to_clipboard(&self, text: &str) -> anyhow::Result<()>;
}

/// Hooks that do nothing, for headless use.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHooks;

impl Notifier for NoopHooks {
    fn notify(&self, _message: &Message) -> anyhow::Result<()> {
        Ok(())
    }
}

impl Clipboard for NoopHooks {
    fn copy_to_clipboard(&self, _text: &str) -> anyhow::Result<()> {
        Ok(())
    }
}
