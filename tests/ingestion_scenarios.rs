//! End-to-end ingestion: event in, stored message and hooks out.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use pushinbox_core::routing::{resolve_action, Action, ActionTarget};
use pushinbox_core::{
    Clipboard, Ingestor, Message, MessageRepository, MessageStore, Notifier, Payload, RemoteEvent,
};

#[derive(Default)]
struct Hooks {
    notified: Mutex<Vec<String>>,
    copied: Mutex<Vec<String>>,
    /// Store the notifier checks against at call time.
    store: Mutex<Option<Arc<MessageStore>>>,
    stored_before_notify: Mutex<Vec<bool>>,
}

impl Notifier for Hooks {
    fn notify(&self, message: &Message) -> anyhow::Result<()> {
        self.notified.lock().push(message.message_id.clone());
        if let Some(store) = self.store.lock().as_ref() {
            let found = store.find(&message.message_id)?.is_some();
            self.stored_before_notify.lock().push(found);
        }
        Ok(())
    }
}

impl Clipboard for Hooks {
    fn copy_to_clipboard(&self, text: &str) -> anyhow::Result<()> {
        self.copied.lock().push(text.to_string());
        Ok(())
    }
}

fn setup() -> (Arc<MessageStore>, Arc<Hooks>, Ingestor) {
    let store = Arc::new(MessageStore::open_in_memory().unwrap());
    let hooks = Arc::new(Hooks::default());
    *hooks.store.lock() = Some(store.clone());
    let ingestor = Ingestor::new(store.clone(), hooks.clone(), hooks.clone());
    (store, hooks, ingestor)
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
fn clipboard_text_is_stored_and_copied() {
    let (store, hooks, ingestor) = setup();

    ingestor
        .ingest(event(
            "m1",
            1000,
            &[("type", "text"), ("text", "hello"), ("clipboard", "true")],
        ))
        .unwrap();

    let stored = store.find("m1").unwrap().unwrap();
    assert_eq!(stored.sent_time, 1000);
    assert_eq!(
        stored.payload,
        Some(Payload::Text {
            text: "hello".to_string(),
            clipboard: true
        })
    );
    assert_eq!(*hooks.copied.lock(), vec!["hello".to_string()]);
    assert_eq!(*hooks.notified.lock(), vec!["m1".to_string()]);
}

#[test]
fn app_payload_notifies_and_links_to_store() {
    let (store, hooks, ingestor) = setup();

    ingestor
        .ingest(event("m1", 1, &[("type", "app"), ("package", "com.foo")]))
        .unwrap();

    assert_eq!(*hooks.notified.lock(), vec!["m1".to_string()]);
    let payload = store.find("m1").unwrap().unwrap().payload.unwrap();
    assert_eq!(payload.display().as_deref(), Some("com.foo"));

    let not_installed = |_: &str| false;
    let target = resolve_action(&payload, Action::Primary, &not_installed).unwrap();
    assert_eq!(
        target,
        ActionTarget::StoreListing {
            package: "com.foo".to_string()
        }
    );
}

#[test]
fn redelivery_replaces_record() {
    let (store, _hooks, ingestor) = setup();

    ingestor.ingest(event("m2", 5, &[])).unwrap();
    ingestor.ingest(event("m2", 10, &[])).unwrap();

    let snapshot = store.snapshot();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].sent_time, 10);
}

#[test]
fn message_is_durable_before_notification() {
    let (_store, hooks, ingestor) = setup();

    ingestor.ingest(event("a", 1, &[])).unwrap();
    ingestor.ingest(event("b", 2, &[("type", "ping")])).unwrap();

    assert_eq!(*hooks.stored_before_notify.lock(), vec![true, true]);
}

#[test]
fn hidden_and_malformed_events_are_still_stored() {
    let (store, hooks, ingestor) = setup();

    ingestor
        .ingest(event("h", 2, &[("hide", "TRUE"), ("type", "link")]))
        .unwrap();

    assert!(hooks.notified.lock().is_empty());
    let stored = store.find("h").unwrap().unwrap();
    assert_eq!(stored.payload, None);
    assert_eq!(stored.data.len(), 2);
}

#[test]
fn feed_sees_newest_first() {
    let (store, _hooks, ingestor) = setup();
    let mut feed = store.observe();
    assert!(feed.current().is_empty());

    let report = ingestor.ingest_batch(vec![
        event("old", 1, &[]),
        event("new", 3, &[]),
        event("mid", 2, &[]),
    ]);
    assert_eq!(report.stored_count(), 3);

    let ids: Vec<String> = feed
        .current()
        .iter()
        .map(|m| m.message_id.clone())
        .collect();
    assert_eq!(ids, vec!["new", "mid", "old"]);

    let old = store.find("old").unwrap().unwrap();
    store.delete(&[old]).unwrap();
    assert_eq!(feed.current().len(), 2);
}

#[test]
fn json_envelope_round_trip_through_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("inbox.db");
    {
        let store = Arc::new(MessageStore::open(&path).unwrap());
        let hooks = Arc::new(Hooks::default());
        let ingestor = Ingestor::new(store, hooks.clone(), hooks);
        let event = RemoteEvent::from_json(
            r#"{"messageId":"j1","sentTime":7,"data":{"type":"link","url":"https://example.com"}}"#,
        )
        .unwrap();
        ingestor.ingest(event).unwrap();
    }

    let reopened = MessageStore::open(&path).unwrap();
    let message = reopened.find("j1").unwrap().unwrap();
    assert_eq!(
        message.payload,
        Some(Payload::Link {
            url: "https://example.com".to_string()
        })
    );
}
