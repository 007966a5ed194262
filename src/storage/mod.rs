//! Storage module.
//!
//! Durable, ordered store of received messages:
//! - `models` - the persisted `Message` record
//! - `queries` - SQL schema and statement builders
//! - `store` - SQLite-backed `MessageStore` and its live change feed

pub mod models;
pub mod queries;
pub mod store;

pub use models::*;
pub use queries::*;
pub use store::*;
