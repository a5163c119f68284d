//! Boundary to the external telemetry backend.
//!
//! The registry never stores sample values itself. Every measurement ends up
//! as a `submit` call keyed by name; the sink owns aggregation, buffering and
//! the global collecting flag.

use crate::handle::{CounterHandle, StatName};

/// Stat group all registry-created counters belong to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatGroup {
    pub name: String,
    pub category: String,
}

impl Default for StatGroup {
    fn default() -> Self {
        Self {
            name: "Script".into(),
            category: "advanced".into(),
        }
    }
}

/// Value representation declared to the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueKind {
    Int64,
    Double,
}

impl ValueKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ValueKind::Int64 => "int64",
            ValueKind::Double => "double",
        }
    }
}

/// Memory region a memory counter is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryRegion {
    Physical,
}

/// Metadata registered once per created counter, before a handle is minted.
#[derive(Debug, Clone, PartialEq)]
pub struct StatMetadata {
    pub name: StatName,
    pub description: Option<String>,
    pub group: StatGroup,
    /// Counter (reset every frame) vs accumulator (running total).
    pub clear_every_frame: bool,
    pub value_kind: ValueKind,
    pub is_cycle_stat: bool,
    pub memory_region: Option<MemoryRegion>,
}

/// Sample operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatOperation {
    Add,
    Subtract,
    Set,
    Label,
}

impl StatOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            StatOperation::Add => "add",
            StatOperation::Subtract => "subtract",
            StatOperation::Set => "set",
            StatOperation::Label => "label",
        }
    }
}

/// Sample payload.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleValue {
    Int64(i64),
    Double(f64),
    Label(String),
}

/// Telemetry backend consumed by the registry.
///
/// Implementations must accept concurrent `submit` calls; the registry itself
/// is single-owner.
pub trait StatSink: Send + Sync {
    fn register_metadata(&self, meta: &StatMetadata);
    fn allocate_handle(&self, meta: &StatMetadata) -> CounterHandle;
    fn is_collecting(&self) -> bool;
    fn submit(&self, name: &StatName, op: StatOperation, value: SampleValue);

    /// Frame boundary. Sinks that keep per-frame series reset them here.
    fn end_frame(&self) {}
}
