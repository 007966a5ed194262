//! Routing module.
//!
//! Decides where a stored message goes next:
//! - Side effects fired after persistence (notification, clipboard)
//! - Primary/secondary actions offered for its payload

pub mod actions;
pub mod decision;

pub use actions::*;
pub use decision::*;
