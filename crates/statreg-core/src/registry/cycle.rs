//! Nested-timing cycle counters.

use crate::clock::Clock;
use crate::error::{Result, StatRegError};
use crate::handle::{CounterHandle, StatAddress, StatName};
use crate::sink::{SampleValue, StatOperation, StatSink};

use super::index::{dangling, SlotIndex};
use super::stack::CycleCounterStack;
use super::Namespace;

/// One cycle counter. `started` guards against double begin/end; nesting
/// depth lives on the shared stack, not here.
#[derive(Debug)]
pub(crate) struct CycleCounterSlot {
    name: StatName,
    started: bool,
    start_cycles: u64,
}

impl CycleCounterSlot {
    fn new(name: StatName) -> Self {
        Self {
            name,
            started: false,
            start_cycles: 0,
        }
    }

    fn start(&mut self, clock: &dyn Clock) {
        if !self.started {
            self.started = true;
            self.start_cycles = clock.cycles();
        }
    }

    fn stop(&mut self, clock: &dyn Clock, sink: &dyn StatSink) {
        if !self.started {
            return;
        }
        self.started = false;
        let elapsed = clock.cycles().saturating_sub(self.start_cycles);
        if sink.is_collecting() {
            let elapsed = i64::try_from(elapsed).unwrap_or(i64::MAX);
            sink.submit(&self.name, StatOperation::Add, SampleValue::Int64(elapsed));
        }
    }

    fn set(&self, sink: &dyn StatSink, cycles: u32) {
        if sink.is_collecting() {
            sink.submit(&self.name, StatOperation::Set, SampleValue::Int64(i64::from(cycles)));
        }
    }
}

pub(crate) struct CycleCounterPool {
    slots: SlotIndex<CycleCounterSlot>,
    stack: CycleCounterStack,
}

impl CycleCounterPool {
    pub(crate) fn new() -> Self {
        Self {
            slots: SlotIndex::new(Namespace::Cycle),
            stack: CycleCounterStack::default(),
        }
    }

    pub(crate) fn index(&self) -> &SlotIndex<CycleCounterSlot> {
        &self.slots
    }

    pub(crate) fn insert(&mut self, name: StatName, handle: CounterHandle) {
        self.slots.insert(name.clone(), handle, CycleCounterSlot::new(name));
    }

    pub(crate) fn start(&mut self, addr: StatAddress<'_>, clock: &dyn Clock) -> Result<()> {
        let idx = self.slots.resolve(addr)?;
        let slot = self
            .slots
            .get_mut(idx)
            .ok_or_else(|| dangling(Namespace::Cycle, idx))?;
        self.stack.push(idx);
        slot.start(clock);
        Ok(())
    }

    pub(crate) fn stop(&mut self, clock: &dyn Clock, sink: &dyn StatSink) -> Result<()> {
        let idx = self.stack.pop().ok_or(StatRegError::EmptyStack)?;
        let slot = self
            .slots
            .get_mut(idx)
            .ok_or_else(|| dangling(Namespace::Cycle, idx))?;
        slot.stop(clock, sink);
        Ok(())
    }

    pub(crate) fn set(
        &self,
        addr: StatAddress<'_>,
        sink: &dyn StatSink,
        cycles: u32,
    ) -> Result<()> {
        self.slots.lookup(addr)?.set(sink, cycles);
        Ok(())
    }

    pub(crate) fn is_started(&self, addr: StatAddress<'_>) -> Result<bool> {
        Ok(self.slots.lookup(addr)?.started)
    }

    pub(crate) fn stack_depth(&self) -> usize {
        self.stack.depth()
    }

    pub(crate) fn stack_is_empty(&self) -> bool {
        self.stack.is_empty()
    }
}
