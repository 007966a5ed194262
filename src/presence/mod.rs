//! Device presence.
//!
//! Tracks connectivity to the remote presence registry and the device's
//! push delivery token, and keeps this device's registry entry current:
//! - `state` - observable `Presence` and the controller state
//! - `device` - stable device id and display name
//! - `registry` - registry and token-provider collaborators
//! - `controller` - the single-writer controller task and its handle

pub mod controller;
pub mod device;
pub mod registry;
pub mod state;

pub use controller::*;
pub use device::*;
pub use registry::*;
pub use state::*;
