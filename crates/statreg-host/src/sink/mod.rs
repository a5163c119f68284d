//! Sink implementations shipped with the host.
//!
//! `MemorySink` aggregates in process and backs the `/metrics` and
//! `/stats.json` endpoints.

pub mod memory;

pub use memory::{MemorySink, SeriesValue, SinkSnapshot, StatSnapshot};
