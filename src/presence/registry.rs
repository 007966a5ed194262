//! Presence registry and token provider collaborators.

use async_trait::async_trait;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::error::PresenceError;
use crate::presence::controller::ConnectivitySink;

/// Placeholder the registry replaces with its own clock on write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServerTimestamp;

impl Serialize for ServerTimestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(".sv", "timestamp")?;
        map.end()
    }
}

/// Value written under this device's registry key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistryEntry {
    pub name: String,
    pub token: String,
    pub timestamp: ServerTimestamp,
}

impl RegistryEntry {
    pub fn new(name: &str, token: &str) -> Self {
        Self {
            name: name.to_string(),
            token: token.to_string(),
            timestamp: ServerTimestamp,
        }
    }
}

/// Remote key-value registry of connected devices.
#[async_trait]
pub trait PresenceRegistry: Send + Sync {
    /// Start delivering connectivity changes to `sink`.
    fn subscribe(&self, sink: ConnectivitySink);

    /// Stop delivering connectivity changes.
    fn unsubscribe(&self);

    async fn publish(&self, key: &str, entry: &RegistryEntry) -> Result<(), PresenceError>;

    async fn clear(&self, key: &str) -> Result<(), PresenceError>;
}

/// Push transport's delivery token lifecycle.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn fetch_token(&self) -> Result<String, PresenceError>;

    /// Invalidate the current token; a new one arrives later through the
    /// transport's token renewal callback.
    async fn delete_token(&self) -> Result<(), PresenceError>;
}
