//! SQLite-backed message store.
//!
//! One connection behind a lock; every insert/delete call is one
//! transaction. After each commit the ordered snapshot is republished on a
//! watch channel, so observers only ever see whole committed states.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tokio::sync::watch;

use crate::error::StorageError;
use crate::payload::codec;
use crate::storage::models::Message;
use crate::storage::queries::{
    build_message_delete, build_message_insert, build_message_lookup, build_message_select,
    build_schema,
};

/// Ordered snapshot of the store, newest `sent_time` first.
pub type Snapshot = Arc<Vec<Message>>;

/// Keyed, ordered message collection shared by ingestion and readers.
pub trait MessageRepository: Send + Sync {
    /// Upsert by `message_id`; all records are committed or none are.
    fn insert(&self, messages: &[Message]) -> Result<(), StorageError>;

    /// Remove by `message_id`; absent messages are ignored.
    fn delete(&self, messages: &[Message]) -> Result<(), StorageError>;

    /// Live ordered view starting at the current snapshot.
    fn observe(&self) -> MessageFeed;

    /// Current ordered snapshot.
    fn snapshot(&self) -> Snapshot;
}

/// Subscription to the store's ordered snapshot.
#[derive(Debug, Clone)]
pub struct MessageFeed {
    rx: watch::Receiver<Snapshot>,
}

impl MessageFeed {
    pub fn new(rx: watch::Receiver<Snapshot>) -> Self {
        Self { rx }
    }

    /// Latest snapshot, marking it as seen.
    pub fn current(&mut self) -> Snapshot {
        self.rx.borrow_and_update().clone()
    }

    /// Wait for the next committed change.
    ///
    /// Returns `None` once the store has been dropped.
    pub async fn changed(&mut self) -> Option<Snapshot> {
        self.rx.changed().await.ok()?;
        Some(self.current())
    }
}

/// Durable message store.
pub struct MessageStore {
    conn: Mutex<Connection>,
    feed: watch::Sender<Snapshot>,
}

impl MessageStore {
    /// Open or create a database at the given path.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        log::info!("STORE_OPENED path={}", path.display());
        Self::with_connection(conn)
    }

    /// Create an in-memory database.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch(build_schema())?;
        let snapshot = load_all(&conn)?;
        log::debug!("STORE_LOADED messages={}", snapshot.len());
        let (feed, _) = watch::channel(Arc::new(snapshot));
        Ok(Self {
            conn: Mutex::new(conn),
            feed,
        })
    }

    /// Look up one message by id.
    pub fn find(&self, message_id: &str) -> Result<Option<Message>, StorageError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&build_message_lookup())?;
        let message = stmt
            .query_row(params![message_id], row_to_message)
            .optional()?;
        Ok(message)
    }

    /// Run `write` in one transaction and republish the snapshot on commit.
    fn write<F>(&self, op: &str, write: F) -> Result<(), StorageError>
    where
        F: FnOnce(&rusqlite::Transaction<'_>) -> Result<(), StorageError>,
    {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        write(&tx)?;
        tx.commit()?;

        // Published under the lock so snapshots go out in commit order.
        match load_all(&conn) {
            Ok(snapshot) => {
                log::debug!("STORE_COMMITTED op={} messages={}", op, snapshot.len());
                self.feed.send_replace(Arc::new(snapshot));
            }
            Err(e) => {
                log::error!("STORE_SNAPSHOT_FAILED op={} error={}", op, e);
            }
        }
        Ok(())
    }
}

impl MessageRepository for MessageStore {
    fn insert(&self, messages: &[Message]) -> Result<(), StorageError> {
        if messages.is_empty() {
            return Ok(());
        }
        self.write("insert", |tx| {
            let mut stmt = tx.prepare(&build_message_insert())?;
            for m in messages {
                let data = serde_json::to_string(&m.data)?;
                let payload = m.payload.as_ref().map(codec::to_json).transpose()?;
                stmt.execute(params![
                    m.message_id,
                    m.from,
                    m.to,
                    m.title,
                    m.body,
                    m.image_url,
                    data,
                    m.collapse_key,
                    m.message_type,
                    m.sent_time,
                    m.ttl,
                    m.priority,
                    m.original_priority,
                    payload,
                ])?;
            }
            Ok(())
        })
    }

    fn delete(&self, messages: &[Message]) -> Result<(), StorageError> {
        if messages.is_empty() {
            return Ok(());
        }
        self.write("delete", |tx| {
            let mut stmt = tx.prepare(build_message_delete())?;
            for m in messages {
                stmt.execute(params![m.message_id])?;
            }
            Ok(())
        })
    }

    fn observe(&self) -> MessageFeed {
        MessageFeed::new(self.feed.subscribe())
    }

    fn snapshot(&self) -> Snapshot {
        self.feed.borrow().clone()
    }
}

fn load_all(conn: &Connection) -> Result<Vec<Message>, StorageError> {
    let mut stmt = conn.prepare(&build_message_select())?;
    let rows = stmt.query_map([], row_to_message)?;
    let mut result = Vec::new();
    for row in rows {
        result.push(row?);
    }
    Ok(result)
}

fn row_to_message(row: &Row<'_>) -> rusqlite::Result<Message> {
    let message_id: String = row.get(0)?;
    let data_json: String = row.get(6)?;
    let data = serde_json::from_str::<HashMap<String, String>>(&data_json).unwrap_or_else(|e| {
        log::warn!("STORE_DATA_UNREADABLE message_id={} error={}", message_id, e);
        HashMap::new()
    });
    let payload: Option<String> = row.get(13)?;

    Ok(Message {
        message_id,
        from: row.get(1)?,
        to: row.get(2)?,
        title: row.get(3)?,
        body: row.get(4)?,
        image_url: row.get(5)?,
        data,
        collapse_key: row.get(7)?,
        message_type: row.get(8)?,
        sent_time: row.get(9)?,
        ttl: row.get(10)?,
        priority: row.get(11)?,
        original_priority: row.get(12)?,
        payload: payload.as_deref().and_then(codec::from_json),
    })
}
