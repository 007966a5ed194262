//! Presence through the composition root.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use pushinbox_core::{
    Collaborators, ConnectivitySink, Inbox, InboxConfig, NoopHooks, PresenceError,
    PresenceRegistry, PresenceState, RegistryEntry, TokenProvider,
};

#[derive(Default)]
struct Registry {
    subscribes: AtomicUsize,
    sink: Mutex<Option<ConnectivitySink>>,
    entries: Mutex<Vec<(String, RegistryEntry)>>,
    cleared: AtomicUsize,
}

#[async_trait]
impl PresenceRegistry for Registry {
    fn subscribe(&self, sink: ConnectivitySink) {
        self.subscribes.fetch_add(1, Ordering::SeqCst);
        *self.sink.lock() = Some(sink);
    }

    fn unsubscribe(&self) {
        *self.sink.lock() = None;
    }

    async fn publish(&self, key: &str, entry: &RegistryEntry) -> Result<(), PresenceError> {
        self.entries.lock().push((key.to_string(), entry.clone()));
        Ok(())
    }

    async fn clear(&self, _key: &str) -> Result<(), PresenceError> {
        self.cleared.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
struct Tokens {
    fetches: AtomicUsize,
}

#[async_trait]
impl TokenProvider for Tokens {
    async fn fetch_token(&self) -> Result<String, PresenceError> {
        let n = self.fetches.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("tok-{}", n))
    }

    async fn delete_token(&self) -> Result<(), PresenceError> {
        Ok(())
    }
}

fn open(dir: &tempfile::TempDir, registry: &Arc<Registry>, tokens: &Arc<Tokens>) -> Inbox {
    let config = InboxConfig {
        database_path: dir.path().join("inbox.db"),
        device_id_path: dir.path().join("device_id"),
        registry_root: "devices".to_string(),
        ..InboxConfig::default()
    };
    let collaborators = Collaborators {
        notifier: Arc::new(NoopHooks),
        clipboard: Arc::new(NoopHooks),
        registry: registry.clone(),
        tokens: tokens.clone(),
    };
    Inbox::open(&config, collaborators).unwrap()
}

#[tokio::test]
async fn presence_stays_inactive_without_observers() {
    let dir = tempfile::tempdir().unwrap();
    let registry = Arc::new(Registry::default());
    let tokens = Arc::new(Tokens::default());
    let inbox = open(&dir, &registry, &tokens);

    assert_eq!(inbox.presence().state().await.unwrap(), PresenceState::Inactive);
    assert_eq!(registry.subscribes.load(Ordering::SeqCst), 0);
    assert_eq!(tokens.fetches.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn observer_lifecycle_publishes_and_clears() {
    let dir = tempfile::tempdir().unwrap();
    let registry = Arc::new(Registry::default());
    let tokens = Arc::new(Tokens::default());
    let inbox = open(&dir, &registry, &tokens);

    let mut observer = inbox.presence().attach().unwrap();
    let _second = inbox.presence().attach().unwrap();
    observer.wait_for(|p| p.token.is_some()).await.unwrap();
    assert_eq!(registry.subscribes.load(Ordering::SeqCst), 1);
    assert_eq!(tokens.fetches.load(Ordering::SeqCst), 1);

    let sink = registry.sink.lock().clone().unwrap();
    sink.connected(true);
    let presence = observer.wait_for(|p| p.connected).await.unwrap();
    assert_eq!(presence.token.as_deref(), Some("tok-1"));

    // Token renewal from the transport is published while connected.
    inbox.handle_new_token().unwrap();
    observer
        .wait_for(|p| p.token.as_deref() == Some("tok-2"))
        .await
        .unwrap();

    let expected_key = format!("devices/{}", inbox.device_id());
    tokio::time::timeout(Duration::from_secs(2), async {
        while registry.entries.lock().len() < 2 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();
    let entries = registry.entries.lock().clone();
    assert!(entries.iter().all(|(key, _)| *key == expected_key));
    assert_eq!(entries[1].1.token, "tok-2");

    sink.cancelled();
    observer.wait_for(|p| !p.connected).await.unwrap();
    assert_eq!(
        inbox.presence().state().await.unwrap(),
        PresenceState::Disconnected
    );
    assert_eq!(registry.cleared.load(Ordering::SeqCst), 1);
}
