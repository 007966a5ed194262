//! Main push event ingestion pipeline.
//!
//! Coordinates the per-event workflow:
//! 1. Envelope normalization
//! 2. Payload extraction from `data`
//! 3. Persistence (must commit before any side effect)
//! 4. Side-effect hooks, each best-effort and independent

use std::sync::Arc;

use crate::error::StorageError;
use crate::logging::structured::LogContext;
use crate::pipeline::context::IngestContext;
use crate::pipeline::event::{normalize, RemoteEvent};
use crate::pipeline::hooks::{Clipboard, Notifier};
use crate::routing::decision::{plan_effects, Effect};
use crate::storage::models::Message;
use crate::storage::store::MessageRepository;

/// Failure of a single event within a batch.
#[derive(Debug)]
pub struct IngestFailure {
    pub message_id: String,
    pub error: StorageError,
}

/// Result of ingesting a batch of events.
#[derive(Debug, Default)]
pub struct IngestReport {
    pub received_count: usize,
    pub stored: Vec<Message>,
    pub failures: Vec<IngestFailure>,
}

impl IngestReport {
    pub fn stored_count(&self) -> usize {
        self.stored.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failures.len()
    }
}

/// Turns inbound events into stored messages and fires their hooks.
///
/// Safe to share between transport worker threads; concurrent events for
/// the same `message_id` resolve by last write.
#[derive(Clone)]
pub struct Ingestor {
    repository: Arc<dyn MessageRepository>,
    notifier: Arc<dyn Notifier>,
    clipboard: Arc<dyn Clipboard>,
}

impl Ingestor {
    pub fn new(
        repository: Arc<dyn MessageRepository>,
        notifier: Arc<dyn Notifier>,
        clipboard: Arc<dyn Clipboard>,
    ) -> Self {
        Self {
            repository,
            notifier,
            clipboard,
        }
    }

    /// Ingest one event.
    ///
    /// On `StorageError` no hook runs for this event.
    pub fn ingest(&self, event: RemoteEvent) -> Result<Message, StorageError> {
        let ctx = IngestContext::new();
        self.ingest_with_context(&ctx, event)
    }

    /// Ingest events one after another; a failed event does not stop the
    /// rest.
    pub fn ingest_batch(&self, events: Vec<RemoteEvent>) -> IngestReport {
        let mut report = IngestReport {
            received_count: events.len(),
            ..IngestReport::default()
        };

        for event in events {
            let ctx = IngestContext::new();
            let fallback_id = event
                .message_id
                .clone()
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| ctx.fallback_message_id());
            match self.ingest_with_context(&ctx, event) {
                Ok(message) => report.stored.push(message),
                Err(error) => report.failures.push(IngestFailure {
                    message_id: fallback_id,
                    error,
                }),
            }
        }

        log::info!(
            "INGEST_BATCH_COMPLETE received={} stored={} failed={}",
            report.received_count,
            report.stored_count(),
            report.failed_count()
        );
        report
    }

    fn ingest_with_context(
        &self,
        ctx: &IngestContext,
        event: RemoteEvent,
    ) -> Result<Message, StorageError> {
        // [1] + [2] NORMALIZATION AND PAYLOAD EXTRACTION
        let message = normalize(event, ctx);
        let log_ctx = ctx.log_context().with_message(&message.message_id);

        crate::log_debug!(
            log_ctx,
            "INGEST_RECEIVED",
            title = message.title,
            body = message.body,
            image_url = message.image_url,
        );
        crate::log_debug!(
            log_ctx,
            "INGEST_NORMALIZED",
            sent_time = message.sent_time,
            payload = message.payload.as_ref().map(|p| p.type_tag()),
        );

        // [3] PERSISTENCE
        if let Err(e) = self.repository.insert(std::slice::from_ref(&message)) {
            crate::log_error!(log_ctx, "INGEST_STORE_FAILED", error = e.to_string());
            return Err(e);
        }
        crate::log_info!(log_ctx, "INGEST_STORED", sent_time = message.sent_time);

        // [4] SIDE EFFECTS
        for effect in plan_effects(&message, &log_ctx) {
            self.run_effect(&effect, &message, &log_ctx);
        }

        Ok(message)
    }

    fn run_effect(&self, effect: &Effect, message: &Message, ctx: &LogContext) {
        let result = match effect {
            Effect::Notify => self.notifier.notify(message),
            Effect::CopyToClipboard(text) => self.clipboard.copy_to_clipboard(text),
        };
        match result {
            Ok(()) => {
                crate::log_debug!(ctx, "EFFECT_DONE", effect = effect.as_str());
            }
            Err(e) => {
                crate::log_warn!(
                    ctx,
                    "EFFECT_FAILED",
                    effect = effect.as_str(),
                    error = format!("{:#}", e),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use parking_lot::Mutex;

    use super::*;
    use crate::payload::Payload;
    use crate::storage::store::{MessageFeed, MessageStore, Snapshot};

    #[derive(Default)]
    struct Recorder {
        notified: Mutex<Vec<String>>,
        copied: Mutex<Vec<String>>,
        fail_notify: bool,
    }

    impl Notifier for Recorder {
        fn notify(&self, message: &Message) -> anyhow::Result<()> {
            self.notified.lock().push(message.message_id.clone());
            if self.fail_notify {
                anyhow::bail!("banner service unavailable");
            }
            Ok(())
        }
    }

    impl Clipboard for Recorder {
        fn copy_to_clipboard(&self, text: &str) -> anyhow::Result<()> {
            self.copied.lock().push(text.to_string());
            Ok(())
        }
    }

    struct BrokenStore;

    impl MessageRepository for BrokenStore {
        fn insert(&self, _messages: &[Message]) -> Result<(), StorageError> {
            Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "disk full",
            )))
        }

        fn delete(&self, _messages: &[Message]) -> Result<(), StorageError> {
            Ok(())
        }

        fn observe(&self) -> MessageFeed {
            let (_tx, rx) = tokio::sync::watch::channel(self.snapshot());
            MessageFeed::new(rx)
        }

        fn snapshot(&self) -> Snapshot {
            Arc::new(Vec::new())
        }
    }

    fn event(id: &str, sent_time: i64, data: &[(&str, &str)]) -> RemoteEvent {
        RemoteEvent {
            message_id: Some(id.to_string()),
            sent_time,
            data: data
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>(),
            ..RemoteEvent::default()
        }
    }

    #[test]
    fn test_ingest_stores_then_notifies() {
        let store = Arc::new(MessageStore::open_in_memory().unwrap());
        let hooks = Arc::new(Recorder::default());
        let ingestor = Ingestor::new(store.clone(), hooks.clone(), hooks.clone());

        let message = ingestor
            .ingest(event("m1", 1, &[("type", "ping")]))
            .unwrap();
        assert_eq!(message.payload, Some(Payload::Ping));
        assert_eq!(store.find("m1").unwrap(), Some(message));
        assert_eq!(*hooks.notified.lock(), vec!["m1".to_string()]);
        assert!(hooks.copied.lock().is_empty());
    }

    #[test]
    fn test_storage_failure_skips_hooks() {
        let hooks = Arc::new(Recorder::default());
        let ingestor = Ingestor::new(Arc::new(BrokenStore), hooks.clone(), hooks.clone());

        let result = ingestor.ingest(event(
            "m1",
            1,
            &[("type", "text"), ("text", "secret"), ("clipboard", "true")],
        ));
        assert!(matches!(result, Err(StorageError::Io(_))));
        assert!(hooks.notified.lock().is_empty());
        assert!(hooks.copied.lock().is_empty());
    }

    #[test]
    fn test_hook_failure_does_not_block_others() {
        let store = Arc::new(MessageStore::open_in_memory().unwrap());
        let hooks = Arc::new(Recorder {
            fail_notify: true,
            ..Recorder::default()
        });
        let ingestor = Ingestor::new(store.clone(), hooks.clone(), hooks.clone());

        let result = ingestor.ingest(event(
            "m1",
            1,
            &[("type", "text"), ("text", "hello"), ("clipboard", "true")],
        ));
        assert!(result.is_ok());
        assert_eq!(*hooks.copied.lock(), vec!["hello".to_string()]);
        assert!(store.find("m1").unwrap().is_some());
    }

    #[test]
    fn test_batch_continues_after_failure() {
        let store = Arc::new(MessageStore::open_in_memory().unwrap());
        let hooks = Arc::new(Recorder::default());
        let ingestor = Ingestor::new(store.clone(), hooks.clone(), hooks.clone());

        let report = ingestor.ingest_batch(vec![
            event("a", 1, &[]),
            event("b", 2, &[("hide", "true")]),
        ]);
        assert_eq!(report.received_count, 2);
        assert_eq!(report.stored_count(), 2);
        assert_eq!(report.failed_count(), 0);
        assert_eq!(*hooks.notified.lock(), vec!["a".to_string()]);

        let broken = Ingestor::new(Arc::new(BrokenStore), hooks.clone(), hooks.clone());
        let report = broken.ingest_batch(vec![event("c", 3, &[]), event("d", 4, &[])]);
        assert_eq!(report.failed_count(), 2);
        assert_eq!(report.failures[0].message_id, "c");
        assert_eq!(hooks.notified.lock().len(), 1);
    }
}
