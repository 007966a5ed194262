//! Pushinbox Core - push notification inbox
//!
//! This crate receives push events from a push transport, keeps every
//! received message in a durable ordered store, and maintains this device's
//! entry in a remote presence registry. The implementation prioritizes:
//!
//! 1. **Durability** - A message is committed before any side effect fires
//! 2. **Logging** - Every decision point logged with ingest/device context
//! 3. **Totality** - Malformed payload data degrades to "no payload", never an error
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `pipeline` - Event normalization and the ingestion orchestrator
//! - `payload` - Typed payload decoding from flat string maps
//! - `routing` - Side-effect planning and payload actions
//! - `storage` - SQLite message store with a live snapshot feed
//! - `presence` - Registry connectivity and delivery token controller
//! - `inbox` - Composition root wiring the above together
//! - `config` - Environment-driven configuration
//! - `logging` - Structured logging with ingest context

pub mod config;
pub mod error;
pub mod inbox;
pub mod logging;
pub mod payload;
pub mod pipeline;
pub mod presence;
pub mod routing;
pub mod storage;

pub use config::InboxConfig;
pub use error::{InboxError, PresenceError, StorageError};
pub use inbox::{Collaborators, Inbox};
pub use payload::{Icon, Payload};
pub use pipeline::{Clipboard, IngestReport, Ingestor, NoopHooks, Notifier, RemoteEvent};
pub use presence::{
    ConnectivitySink, Presence, PresenceHandle, PresenceObserver, PresenceRegistry,
    PresenceState, RegistryEntry, TokenProvider,
};
pub use storage::{Message, MessageFeed, MessageRepository, MessageStore, Snapshot};

/// Initialize the process-wide logger.
///
/// `RUST_LOG` still overrides `level` for individual modules. Calling this
/// more than once is harmless.
pub fn init_logger(level: log::LevelFilter) {
    let _ = env_logger::builder()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp_millis()
        .try_init();
}
