//! Pipeline orchestration module.
//!
//! Ingestion pipeline for inbound push events:
//! - Envelope normalization into a `Message`
//! - Payload extraction from event data
//! - Durable persistence
//! - Side-effect hooks (notification, clipboard)

pub mod context;
pub mod event;
pub mod hooks;
pub mod ingestion;

pub use context::*;
pub use event::*;
pub use hooks::*;
pub use ingestion::*;
