//! Recording sink shared by registry tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(dead_code)]

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use statreg_core::{
    CounterHandle, InstrumentationRegistry, ManualClock, SampleValue, StatMetadata,
    StatName, StatOperation, StatSink,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub name: String,
    pub op: StatOperation,
    pub value: SampleValue,
}

pub struct RecordingSink {
    collecting: AtomicBool,
    next: AtomicUsize,
    frames: AtomicUsize,
    pub metadata: Mutex<Vec<StatMetadata>>,
    pub submissions: Mutex<Vec<Submission>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            collecting: AtomicBool::new(true),
            next: AtomicUsize::new(0x1000),
            frames: AtomicUsize::new(0),
            metadata: Mutex::new(Vec::new()),
            submissions: Mutex::new(Vec::new()),
        })
    }

    pub fn set_collecting(&self, on: bool) {
        self.collecting.store(on, Ordering::Relaxed);
    }

    pub fn frames(&self) -> usize {
        self.frames.load(Ordering::Relaxed)
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.submissions.lock().unwrap().clone()
    }

    pub fn metadata(&self) -> Vec<StatMetadata> {
        self.metadata.lock().unwrap().clone()
    }
}

impl StatSink for RecordingSink {
    fn register_metadata(&self, meta: &StatMetadata) {
        self.metadata.lock().unwrap().push(meta.clone());
    }

    fn allocate_handle(&self, _meta: &StatMetadata) -> CounterHandle {
        let raw = self.next.fetch_add(8, Ordering::Relaxed);
        CounterHandle::new(NonZeroUsize::new(raw).unwrap())
    }

    fn is_collecting(&self) -> bool {
        self.collecting.load(Ordering::Relaxed)
    }

    fn submit(&self, name: &StatName, op: StatOperation, value: SampleValue) {
        self.submissions.lock().unwrap().push(Submission {
            name: name.to_string(),
            op,
            value,
        });
    }

    fn end_frame(&self) {
        self.frames.fetch_add(1, Ordering::Relaxed);
    }
}

pub struct Fixture {
    pub sink: Arc<RecordingSink>,
    pub clock: Arc<ManualClock>,
    pub reg: InstrumentationRegistry,
}

pub fn fixture() -> Fixture {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let sink = RecordingSink::new();
    let clock = Arc::new(ManualClock::new());
    let reg = InstrumentationRegistry::new(sink.clone()).with_clock(clock.clone());
    Fixture { sink, clock, reg }
}
