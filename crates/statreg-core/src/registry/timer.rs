//! Scaled wall-clock timer accumulators. Each slot keeps its own start time,
//! so any number of them may run at once.

use crate::clock::Clock;
use crate::error::Result;
use crate::handle::{CounterHandle, StatAddress, StatName};
use crate::sink::{SampleValue, StatOperation, StatSink};

use super::index::SlotIndex;
use super::Namespace;

#[derive(Debug)]
pub(crate) struct TimerAccumulatorSlot {
    name: StatName,
    scale: f64,
    started: bool,
    start_time: f64,
}

impl TimerAccumulatorSlot {
    fn new(name: StatName, scale: f64) -> Self {
        Self {
            name,
            scale,
            started: false,
            start_time: 0.0,
        }
    }

    /// Restarting before a stop moves the start time forward.
    fn start(&mut self, clock: &dyn Clock) {
        self.started = true;
        self.start_time = clock.seconds();
    }

    fn stop(&mut self, clock: &dyn Clock, sink: &dyn StatSink) {
        if !self.started {
            return;
        }
        self.started = false;
        let total = (clock.seconds() - self.start_time) * self.scale;
        if sink.is_collecting() {
            sink.submit(&self.name, StatOperation::Add, SampleValue::Double(total));
        }
    }
}

pub(crate) struct TimerAccumulatorPool {
    slots: SlotIndex<TimerAccumulatorSlot>,
}

impl TimerAccumulatorPool {
    pub(crate) fn new() -> Self {
        Self {
            slots: SlotIndex::new(Namespace::Timer),
        }
    }

    pub(crate) fn index(&self) -> &SlotIndex<TimerAccumulatorSlot> {
        &self.slots
    }

    pub(crate) fn insert(&mut self, name: StatName, handle: CounterHandle, scale: f64) {
        self.slots
            .insert(name.clone(), handle, TimerAccumulatorSlot::new(name, scale));
    }

    pub(crate) fn start(&mut self, addr: StatAddress<'_>, clock: &dyn Clock) -> Result<()> {
        self.slots.lookup_mut(addr)?.start(clock);
        Ok(())
    }

    pub(crate) fn stop(
        &mut self,
        addr: StatAddress<'_>,
        clock: &dyn Clock,
        sink: &dyn StatSink,
    ) -> Result<()> {
        self.slots.lookup_mut(addr)?.stop(clock, sink);
        Ok(())
    }

    pub(crate) fn is_running(&self, addr: StatAddress<'_>) -> Result<bool> {
        Ok(self.slots.lookup(addr)?.started)
    }
}
