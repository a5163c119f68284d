//! statreg core: the instrumentation registry, its counter pools, and the
//! sink boundary it reports to.
//!
//! Counters are declared at runtime by name, addressed afterwards by name or
//! by the opaque handle returned at creation, and every sample is forwarded
//! to a [`StatSink`]. The crate carries no runtime or transport dependencies
//! so hosts and script bindings can embed it directly.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here. Every rejection is
//! a `StatRegError` internally and a `false` / `None` at the boundary.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod clock;
pub mod error;
pub mod handle;
pub mod registry;
pub mod sink;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ReasonCode, Result, StatRegError};
pub use handle::{CounterHandle, StatAddress, StatName};
pub use registry::{InstrumentationRegistry, Namespace};
pub use sink::{
    MemoryRegion, SampleValue, StatGroup, StatMetadata, StatOperation, StatSink, ValueKind,
};
