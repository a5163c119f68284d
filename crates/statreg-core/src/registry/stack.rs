//! Shared LIFO of active cycle-counter slots.
//!
//! Every successful start pushes, every stop pops. Stop carries no address,
//! so callers must nest start/stop pairs; interleaving is not detectable here
//! beyond the empty-stack guard.

#[derive(Debug, Default)]
pub(crate) struct CycleCounterStack {
    active: Vec<usize>,
}

impl CycleCounterStack {
    pub(crate) fn push(&mut self, slot: usize) {
        self.active.push(slot);
    }

    pub(crate) fn pop(&mut self) -> Option<usize> {
        self.active.pop()
    }

    pub(crate) fn depth(&self) -> usize {
        self.active.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}
