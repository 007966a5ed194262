//! Action payloads carried in push event data.
//!
//! A payload is reconstructed from the flat string map of an inbound event,
//! keyed by the `type` attribute:
//! - `model` - the closed `Payload` union, its display text and icon
//! - `codec` - decode from / encode to event data and the persisted JSON form
//! - `fields` - string attribute helpers shared by the codec and the pipeline

pub mod codec;
pub mod fields;
pub mod model;

pub use codec::*;
pub use fields::*;
pub use model::*;
