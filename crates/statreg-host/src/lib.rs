//! statreg host library entry.
//!
//! Wires the in-memory sink, the script binding table, config loading and
//! scripted replay around one `InstrumentationRegistry`. Consumed by the
//! binary (`main.rs`) and by integration tests.

pub mod app_state;
pub mod bindings;
pub mod config;
pub mod replay;
pub mod router;
pub mod sink;
