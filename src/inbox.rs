//! Composition root.
//!
//! Wires the message store, the ingestion pipeline and the presence
//! controller from an [`InboxConfig`] and the platform collaborators.

use std::sync::Arc;

use crate::config::InboxConfig;
use crate::error::InboxError;
use crate::pipeline::event::RemoteEvent;
use crate::pipeline::hooks::{Clipboard, Notifier};
use crate::pipeline::ingestion::{IngestReport, Ingestor};
use crate::presence::controller::{PresenceController, PresenceHandle, PresenceSettings};
use crate::presence::device::DeviceId;
use crate::presence::registry::{PresenceRegistry, TokenProvider};
use crate::storage::models::Message;
use crate::storage::store::{MessageFeed, MessageRepository, MessageStore, Snapshot};

/// Platform services the inbox drives.
#[derive(Clone)]
pub struct Collaborators {
    pub notifier: Arc<dyn Notifier>,
    pub clipboard: Arc<dyn Clipboard>,
    pub registry: Arc<dyn PresenceRegistry>,
    pub tokens: Arc<dyn TokenProvider>,
}

/// A running inbox.
pub struct Inbox {
    store: Arc<MessageStore>,
    ingestor: Ingestor,
    presence: PresenceHandle,
    device_id: DeviceId,
}

impl Inbox {
    /// Initialize logging at the configured level, open the store, load the
    /// device id and start presence.
    ///
    /// Must be called from within a tokio runtime.
    pub fn open(config: &InboxConfig, collaborators: Collaborators) -> Result<Self, InboxError> {
        crate::init_logger(config.log_level);

        if tokio::runtime::Handle::try_current().is_err() {
            return Err(InboxError::Config(
                "Inbox::open requires a running tokio runtime".to_string(),
            ));
        }

        let store = Arc::new(MessageStore::open(&config.database_path)?);
        let device_id = DeviceId::load_or_create(&config.device_id_path)?;

        let presence = PresenceController::spawn(
            PresenceSettings {
                registry_root: config.registry_root.clone(),
                device_id: device_id.clone(),
                device: config.device.clone(),
            },
            collaborators.registry,
            collaborators.tokens,
        );
        let ingestor = Ingestor::new(
            store.clone(),
            collaborators.notifier,
            collaborators.clipboard,
        );

        log::info!(
            "INBOX_OPENED database={} device={} messages={}",
            config.database_path.display(),
            device_id,
            store.snapshot().len()
        );

        Ok(Self {
            store,
            ingestor,
            presence,
            device_id,
        })
    }

    /// Transport callback for a received push event.
    pub fn handle_event(&self, event: RemoteEvent) -> Result<Message, InboxError> {
        Ok(self.ingestor.ingest(event)?)
    }

    pub fn handle_events(&self, events: Vec<RemoteEvent>) -> IngestReport {
        self.ingestor.ingest_batch(events)
    }

    /// Transport callback for a renewed delivery token.
    pub fn handle_new_token(&self) -> Result<(), InboxError> {
        Ok(self.presence.fetch_token()?)
    }

    /// Live view of stored messages, newest first.
    pub fn messages(&self) -> MessageFeed {
        self.store.observe()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.store.snapshot()
    }

    pub fn find(&self, message_id: &str) -> Result<Option<Message>, InboxError> {
        Ok(self.store.find(message_id)?)
    }

    pub fn delete(&self, messages: &[Message]) -> Result<(), InboxError> {
        Ok(self.store.delete(messages)?)
    }

    pub fn presence(&self) -> &PresenceHandle {
        &self.presence
    }

    pub fn device_id(&self) -> &DeviceId {
        &self.device_id
    }
}

impl Drop for Inbox {
    fn drop(&mut self) {
        let _ = self.presence.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::hooks::NoopHooks;

    struct NoRegistry;

    #[async_trait::async_trait]
    impl PresenceRegistry for NoRegistry {
        fn subscribe(&self, _sink: crate::presence::ConnectivitySink) {}

        fn unsubscribe(&self) {}

        async fn publish(
            &self,
            _key: &str,
            _entry: &crate::presence::RegistryEntry,
        ) -> Result<(), crate::error::PresenceError> {
            Ok(())
        }

        async fn clear(&self, _key: &str) -> Result<(), crate::error::PresenceError> {
            Ok(())
        }
    }

    #[async_trait::async_trait]
    impl TokenProvider for NoRegistry {
        async fn fetch_token(&self) -> Result<String, crate::error::PresenceError> {
            Ok("tok".to_string())
        }

        async fn delete_token(&self) -> Result<(), crate::error::PresenceError> {
            Ok(())
        }
    }

    fn collaborators() -> Collaborators {
        Collaborators {
            notifier: Arc::new(NoopHooks),
            clipboard: Arc::new(NoopHooks),
            registry: Arc::new(NoRegistry),
            tokens: Arc::new(NoRegistry),
        }
    }

    fn config(dir: &tempfile::TempDir) -> InboxConfig {
        InboxConfig {
            database_path: dir.path().join("inbox.db"),
            device_id_path: dir.path().join("device_id"),
            log_level: log::LevelFilter::Debug,
            ..InboxConfig::default()
        }
    }

    #[test]
    fn test_open_requires_runtime() {
        let dir = tempfile::tempdir().unwrap();
        let result = Inbox::open(&config(&dir), collaborators());
        assert!(matches!(result, Err(InboxError::Config(_))));
    }

    #[tokio::test]
    async fn test_open_applies_log_level() {
        let dir = tempfile::tempdir().unwrap();
        let _inbox = Inbox::open(&config(&dir), collaborators()).unwrap();
        assert!(log::max_level() >= log::LevelFilter::Debug);
    }

    #[tokio::test]
    async fn test_device_id_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let first = Inbox::open(&config(&dir), collaborators()).unwrap();
        let id = first.device_id().clone();
        drop(first);

        let second = Inbox::open(&config(&dir), collaborators()).unwrap();
        assert_eq!(second.device_id(), &id);
    }
}
