//! Pipeline context management.
//!
//! Provides per-event context for logging and id assignment.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::logging::structured::LogContext;

/// Context for one ingest invocation.
#[derive(Debug, Clone)]
pub struct IngestContext {
    pub ingest_id: String,
    pub received_at: DateTime<Utc>,
}

impl IngestContext {
    pub fn new() -> Self {
        let ingest_id = format!("ingest-{}", &Uuid::new_v4().simple().to_string()[..8]);
        Self {
            ingest_id,
            received_at: Utc::now(),
        }
    }

    /// Id given to events the sender delivered without one.
    pub fn fallback_message_id(&self) -> String {
        format!(
            "local-{}-{}",
            self.received_at.timestamp_millis(),
            &self.ingest_id["ingest-".len()..]
        )
    }

    pub fn log_context(&self) -> LogContext {
        LogContext::new(&self.ingest_id)
    }
}

impl Default for IngestContext {
    fn default() -> Self {
        Self::new()
    }
}
