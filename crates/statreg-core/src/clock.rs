//! Time sources for cycle counters and timer accumulators.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Monotonic time source.
pub trait Clock: Send + Sync {
    /// Wall-clock seconds since an arbitrary fixed origin.
    fn seconds(&self) -> f64;
    /// Low-level tick count since the same origin.
    fn cycles(&self) -> u64;
}

/// `Instant`-backed clock. One cycle is one nanosecond.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn seconds(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }

    fn cycles(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_nanos()).unwrap_or(u64::MAX)
    }
}

/// Hand-driven clock for deterministic timing in tests and replays.
/// Time only moves through `advance_*`; cycles track nanoseconds.
#[derive(Debug, Default)]
pub struct ManualClock {
    nanos: AtomicU64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance_nanos(&self, nanos: u64) {
        self.nanos.fetch_add(nanos, Ordering::Relaxed);
    }

    pub fn advance_millis(&self, millis: u64) {
        self.advance_nanos(millis.saturating_mul(1_000_000));
    }
}

impl Clock for ManualClock {
    fn seconds(&self) -> f64 {
        self.nanos.load(Ordering::Relaxed) as f64 / 1e9
    }

    fn cycles(&self) -> u64 {
        self.nanos.load(Ordering::Relaxed)
    }
}
