//! Structured logging with ingest context.
//!
//! Provides logging macros and utilities that include the ingest id and the
//! message id in every log line for easy correlation.

pub mod structured;

pub use structured::*;
