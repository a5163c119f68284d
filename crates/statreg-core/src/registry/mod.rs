//! Instrumentation registry.
//!
//! Composes the cycle-counter pool (with its shared LIFO stack), the timer
//! accumulator pool and the scalar tables behind one façade. Every public
//! operation exists twice:
//! - `try_*` returns `Result<_, StatRegError>` for Rust callers;
//! - the plain form returns `bool` / `Option<CounterHandle>` for script
//!   boundaries, logging the rejection reason instead of propagating it.
//!
//! The registry does no locking. Mutating calls take `&mut self`; share it
//! across threads only behind a mutex.

mod cycle;
mod index;
mod scalar;
mod stack;
mod timer;

use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::error::{Result, StatRegError};
use crate::handle::{CounterHandle, StatAddress, StatName};
use crate::sink::{
    MemoryRegion, SampleValue, StatGroup, StatMetadata, StatOperation, StatSink, ValueKind,
};

use cycle::CycleCounterPool;
use scalar::ScalarTable;
use timer::TimerAccumulatorPool;

/// Independent name spaces. The same name may exist once in each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Cycle,
    Timer,
    Int64,
    Double,
    Memory,
}

impl Namespace {
    pub const ALL: [Namespace; 5] = [
        Namespace::Cycle,
        Namespace::Timer,
        Namespace::Int64,
        Namespace::Double,
        Namespace::Memory,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Namespace::Cycle => "cycle",
            Namespace::Timer => "timer",
            Namespace::Int64 => "int64",
            Namespace::Double => "double",
            Namespace::Memory => "memory",
        }
    }
}

/// Log a rejected call at a level matching how noisy it can be, then drop
/// the error.
fn settle<T>(op: &'static str, res: Result<T>) -> Option<T> {
    match res {
        Ok(v) => Some(v),
        Err(e) => {
            let code = e.reason_code().as_str();
            match &e {
                StatRegError::EmptyStack => {
                    tracing::warn!(op, code, "stop with empty cycle counter stack");
                }
                StatRegError::DuplicateName { .. }
                | StatRegError::InvalidArgument(_)
                | StatRegError::Internal(_) => {
                    tracing::debug!(op, code, error = %e, "stat call rejected");
                }
                _ => {
                    tracing::trace!(op, code, error = %e, "stat call rejected");
                }
            }
            None
        }
    }
}

fn description(desc: Option<&str>) -> Option<String> {
    desc.filter(|d| !d.is_empty()).map(str::to_owned)
}

pub struct InstrumentationRegistry {
    sink: Arc<dyn StatSink>,
    clock: Arc<dyn Clock>,
    group: StatGroup,

    cycles: CycleCounterPool,
    timers: TimerAccumulatorPool,
    int64: ScalarTable<i64>,
    doubles: ScalarTable<f64>,
    memory: ScalarTable<i64>,
}

impl InstrumentationRegistry {
    pub fn new(sink: Arc<dyn StatSink>) -> Self {
        Self {
            sink,
            clock: Arc::new(SystemClock::new()),
            group: StatGroup::default(),
            cycles: CycleCounterPool::new(),
            timers: TimerAccumulatorPool::new(),
            int64: ScalarTable::new(Namespace::Int64),
            doubles: ScalarTable::new(Namespace::Double),
            memory: ScalarTable::new(Namespace::Memory),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_group(mut self, group: StatGroup) -> Self {
        self.group = group;
        self
    }

    pub fn sink(&self) -> &Arc<dyn StatSink> {
        &self.sink
    }

    pub fn group(&self) -> &StatGroup {
        &self.group
    }

    // ---------------------------------------------------------------------
    // Creation
    // ---------------------------------------------------------------------

    fn metadata(
        &self,
        name: &StatName,
        desc: Option<&str>,
        clear_every_frame: bool,
        value_kind: ValueKind,
        is_cycle_stat: bool,
        memory_region: Option<MemoryRegion>,
    ) -> StatMetadata {
        StatMetadata {
            name: name.clone(),
            description: description(desc),
            group: self.group.clone(),
            clear_every_frame,
            value_kind,
            is_cycle_stat,
            memory_region,
        }
    }

    /// Metadata first, then the handle.
    fn mint(&self, meta: &StatMetadata) -> CounterHandle {
        self.sink.register_metadata(meta);
        self.sink.allocate_handle(meta)
    }

    pub fn try_create_cycle_counter(
        &mut self,
        name: &str,
        desc: Option<&str>,
    ) -> Result<CounterHandle> {
        let name = StatName::new(name)?;
        self.cycles.index().ensure_vacant(&name)?;
        let meta = self.metadata(&name, desc, true, ValueKind::Int64, true, None);
        let handle = self.mint(&meta);
        self.cycles.insert(name, handle);
        Ok(handle)
    }

    /// The sink sees a double accumulator; the name only occupies the timer
    /// namespace.
    pub fn try_create_timer_accumulator(
        &mut self,
        name: &str,
        desc: Option<&str>,
        scale: f64,
    ) -> Result<CounterHandle> {
        let name = StatName::new(name)?;
        if !scale.is_finite() {
            return Err(StatRegError::InvalidArgument(format!(
                "timer scale must be finite (got {scale})"
            )));
        }
        self.timers.index().ensure_vacant(&name)?;
        let meta = self.metadata(&name, desc, false, ValueKind::Double, false, None);
        let handle = self.mint(&meta);
        self.timers.insert(name, handle, scale);
        Ok(handle)
    }

    fn try_create_scalar(
        &mut self,
        ns: Namespace,
        name: &str,
        desc: Option<&str>,
        clear_every_frame: bool,
    ) -> Result<CounterHandle> {
        let name = StatName::new(name)?;
        let (value_kind, region) = match ns {
            Namespace::Int64 => {
                self.int64.index().ensure_vacant(&name)?;
                (self.int64.value_kind(), None)
            }
            Namespace::Double => {
                self.doubles.index().ensure_vacant(&name)?;
                (self.doubles.value_kind(), None)
            }
            Namespace::Memory => {
                self.memory.index().ensure_vacant(&name)?;
                (self.memory.value_kind(), Some(MemoryRegion::Physical))
            }
            Namespace::Cycle | Namespace::Timer => {
                return Err(StatRegError::Internal(format!(
                    "{} is not a scalar namespace",
                    ns.as_str()
                )));
            }
        };
        let meta = self.metadata(&name, desc, clear_every_frame, value_kind, false, region);
        let handle = self.mint(&meta);
        match ns {
            Namespace::Int64 => self.int64.insert(name, handle),
            Namespace::Double => self.doubles.insert(name, handle),
            _ => self.memory.insert(name, handle),
        }
        Ok(handle)
    }

    pub fn try_create_int64_counter(
        &mut self,
        name: &str,
        desc: Option<&str>,
    ) -> Result<CounterHandle> {
        self.try_create_scalar(Namespace::Int64, name, desc, true)
    }

    pub fn try_create_int64_accumulator(
        &mut self,
        name: &str,
        desc: Option<&str>,
    ) -> Result<CounterHandle> {
        self.try_create_scalar(Namespace::Int64, name, desc, false)
    }

    pub fn try_create_double_counter(
        &mut self,
        name: &str,
        desc: Option<&str>,
    ) -> Result<CounterHandle> {
        self.try_create_scalar(Namespace::Double, name, desc, true)
    }

    pub fn try_create_double_accumulator(
        &mut self,
        name: &str,
        desc: Option<&str>,
    ) -> Result<CounterHandle> {
        self.try_create_scalar(Namespace::Double, name, desc, false)
    }

    /// Memory stats accumulate and are attributed to physical memory.
    pub fn try_create_memory_counter(
        &mut self,
        name: &str,
        desc: Option<&str>,
    ) -> Result<CounterHandle> {
        self.try_create_scalar(Namespace::Memory, name, desc, false)
    }

    pub fn create_cycle_counter(
        &mut self,
        name: &str,
        desc: Option<&str>,
    ) -> Option<CounterHandle> {
        settle("create_cycle_counter", self.try_create_cycle_counter(name, desc))
    }

    pub fn create_timer_accumulator(
        &mut self,
        name: &str,
        desc: Option<&str>,
        scale: f64,
    ) -> Option<CounterHandle> {
        settle(
            "create_timer_accumulator",
            self.try_create_timer_accumulator(name, desc, scale),
        )
    }

    pub fn create_int64_counter(
        &mut self,
        name: &str,
        desc: Option<&str>,
    ) -> Option<CounterHandle> {
        settle("create_int64_counter", self.try_create_int64_counter(name, desc))
    }

    pub fn create_int64_accumulator(
        &mut self,
        name: &str,
        desc: Option<&str>,
    ) -> Option<CounterHandle> {
        settle("create_int64_accumulator", self.try_create_int64_accumulator(name, desc))
    }

    pub fn create_double_counter(
        &mut self,
        name: &str,
        desc: Option<&str>,
    ) -> Option<CounterHandle> {
        settle("create_double_counter", self.try_create_double_counter(name, desc))
    }

    pub fn create_double_accumulator(
        &mut self,
        name: &str,
        desc: Option<&str>,
    ) -> Option<CounterHandle> {
        settle("create_double_accumulator", self.try_create_double_accumulator(name, desc))
    }

    pub fn create_memory_counter(
        &mut self,
        name: &str,
        desc: Option<&str>,
    ) -> Option<CounterHandle> {
        settle("create_memory_counter", self.try_create_memory_counter(name, desc))
    }

    // ---------------------------------------------------------------------
    // Cycle counters
    // ---------------------------------------------------------------------

    pub fn try_start_cycle_counter<'a>(&mut self, addr: impl Into<StatAddress<'a>>) -> Result<()> {
        self.cycles.start(addr.into(), self.clock.as_ref())
    }

    /// Stops whichever cycle counter was started most recently.
    pub fn try_stop_cycle_counter(&mut self) -> Result<()> {
        self.cycles.stop(self.clock.as_ref(), self.sink.as_ref())
    }

    pub fn try_set_cycle_counter<'a>(
        &self,
        addr: impl Into<StatAddress<'a>>,
        cycles: u32,
    ) -> Result<()> {
        self.cycles.set(addr.into(), self.sink.as_ref(), cycles)
    }

    pub fn start_cycle_counter<'a>(&mut self, addr: impl Into<StatAddress<'a>>) -> bool {
        settle("start_cycle_counter", self.try_start_cycle_counter(addr)).is_some()
    }

    pub fn stop_cycle_counter(&mut self) -> bool {
        settle("stop_cycle_counter", self.try_stop_cycle_counter()).is_some()
    }

    pub fn set_cycle_counter<'a>(&self, addr: impl Into<StatAddress<'a>>, cycles: u32) -> bool {
        settle("set_cycle_counter", self.try_set_cycle_counter(addr, cycles)).is_some()
    }

    // ---------------------------------------------------------------------
    // Timer accumulators
    // ---------------------------------------------------------------------

    pub fn try_start_timer_accumulator<'a>(
        &mut self,
        addr: impl Into<StatAddress<'a>>,
    ) -> Result<()> {
        self.timers.start(addr.into(), self.clock.as_ref())
    }

    pub fn try_stop_timer_accumulator<'a>(
        &mut self,
        addr: impl Into<StatAddress<'a>>,
    ) -> Result<()> {
        self.timers
            .stop(addr.into(), self.clock.as_ref(), self.sink.as_ref())
    }

    pub fn start_timer_accumulator<'a>(&mut self, addr: impl Into<StatAddress<'a>>) -> bool {
        settle("start_timer_accumulator", self.try_start_timer_accumulator(addr)).is_some()
    }

    pub fn stop_timer_accumulator<'a>(&mut self, addr: impl Into<StatAddress<'a>>) -> bool {
        settle("stop_timer_accumulator", self.try_stop_timer_accumulator(addr)).is_some()
    }

    // ---------------------------------------------------------------------
    // Scalars
    // ---------------------------------------------------------------------

    pub fn try_add_int64<'a>(&self, addr: impl Into<StatAddress<'a>>, value: i64) -> Result<()> {
        self.int64
            .apply(addr.into(), StatOperation::Add, value, self.sink.as_ref())
    }

    pub fn try_subtract_int64<'a>(
        &self,
        addr: impl Into<StatAddress<'a>>,
        value: i64,
    ) -> Result<()> {
        self.int64
            .apply(addr.into(), StatOperation::Subtract, value, self.sink.as_ref())
    }

    pub fn try_set_int64<'a>(&self, addr: impl Into<StatAddress<'a>>, value: i64) -> Result<()> {
        self.int64
            .apply(addr.into(), StatOperation::Set, value, self.sink.as_ref())
    }

    pub fn try_add_double<'a>(&self, addr: impl Into<StatAddress<'a>>, value: f64) -> Result<()> {
        self.doubles
            .apply(addr.into(), StatOperation::Add, value, self.sink.as_ref())
    }

    pub fn try_subtract_double<'a>(
        &self,
        addr: impl Into<StatAddress<'a>>,
        value: f64,
    ) -> Result<()> {
        self.doubles
            .apply(addr.into(), StatOperation::Subtract, value, self.sink.as_ref())
    }

    pub fn try_set_double<'a>(&self, addr: impl Into<StatAddress<'a>>, value: f64) -> Result<()> {
        self.doubles
            .apply(addr.into(), StatOperation::Set, value, self.sink.as_ref())
    }

    pub fn try_add_memory<'a>(&self, addr: impl Into<StatAddress<'a>>, value: i64) -> Result<()> {
        self.memory
            .apply(addr.into(), StatOperation::Add, value, self.sink.as_ref())
    }

    pub fn try_subtract_memory<'a>(
        &self,
        addr: impl Into<StatAddress<'a>>,
        value: i64,
    ) -> Result<()> {
        self.memory
            .apply(addr.into(), StatOperation::Subtract, value, self.sink.as_ref())
    }

    pub fn try_set_memory<'a>(&self, addr: impl Into<StatAddress<'a>>, value: i64) -> Result<()> {
        self.memory
            .apply(addr.into(), StatOperation::Set, value, self.sink.as_ref())
    }

    pub fn add_int64<'a>(&self, addr: impl Into<StatAddress<'a>>, value: i64) -> bool {
        settle("add_int64", self.try_add_int64(addr, value)).is_some()
    }

    pub fn subtract_int64<'a>(&self, addr: impl Into<StatAddress<'a>>, value: i64) -> bool {
        settle("subtract_int64", self.try_subtract_int64(addr, value)).is_some()
    }

    pub fn set_int64<'a>(&self, addr: impl Into<StatAddress<'a>>, value: i64) -> bool {
        settle("set_int64", self.try_set_int64(addr, value)).is_some()
    }

    pub fn add_double<'a>(&self, addr: impl Into<StatAddress<'a>>, value: f64) -> bool {
        settle("add_double", self.try_add_double(addr, value)).is_some()
    }

    pub fn subtract_double<'a>(&self, addr: impl Into<StatAddress<'a>>, value: f64) -> bool {
        settle("subtract_double", self.try_subtract_double(addr, value)).is_some()
    }

    pub fn set_double<'a>(&self, addr: impl Into<StatAddress<'a>>, value: f64) -> bool {
        settle("set_double", self.try_set_double(addr, value)).is_some()
    }

    pub fn add_memory<'a>(&self, addr: impl Into<StatAddress<'a>>, value: i64) -> bool {
        settle("add_memory", self.try_add_memory(addr, value)).is_some()
    }

    pub fn subtract_memory<'a>(&self, addr: impl Into<StatAddress<'a>>, value: i64) -> bool {
        settle("subtract_memory", self.try_subtract_memory(addr, value)).is_some()
    }

    pub fn set_memory<'a>(&self, addr: impl Into<StatAddress<'a>>, value: i64) -> bool {
        settle("set_memory", self.try_set_memory(addr, value)).is_some()
    }

    // ---------------------------------------------------------------------
    // Labels
    // ---------------------------------------------------------------------

    /// Labels are accepted for any valid name. A handle must still be one
    /// this registry issued, since it is the only way to recover the name.
    pub fn try_set_label<'a>(&self, addr: impl Into<StatAddress<'a>>, value: &str) -> Result<()> {
        if value.is_empty() {
            return Err(StatRegError::InvalidArgument("label value must not be empty".into()));
        }
        let name = match addr.into() {
            StatAddress::Name(n) => StatName::new(n)?,
            StatAddress::Handle(h) => {
                self.name_of(h)
                    .cloned()
                    .ok_or_else(|| StatRegError::UnknownAddress {
                        namespace: "any",
                        address: StatAddress::Handle(h).to_string(),
                    })?
            }
        };
        self.sink
            .submit(&name, StatOperation::Label, SampleValue::Label(value.to_owned()));
        Ok(())
    }

    pub fn set_label<'a>(&self, addr: impl Into<StatAddress<'a>>, value: &str) -> bool {
        settle("set_label", self.try_set_label(addr, value)).is_some()
    }

    // ---------------------------------------------------------------------
    // Frame boundary
    // ---------------------------------------------------------------------

    pub fn cycle_stack_depth(&self) -> usize {
        self.cycles.stack_depth()
    }

    /// Close the frame: the sink rolls over either way, then the cycle stack
    /// is checked. Stale entries stay put; a later stop will still pop them.
    pub fn end_frame(&self) -> Result<()> {
        self.sink.end_frame();
        let depth = self.cycles.stack_depth();
        if depth != 0 {
            tracing::warn!(depth, "cycle counter stack not empty at frame boundary");
            return Err(StatRegError::UnbalancedStack { depth });
        }
        Ok(())
    }

    /// Debug builds only: catches an unmatched start early.
    #[track_caller]
    pub fn debug_assert_stack_empty(&self) {
        debug_assert!(
            self.cycles.stack_is_empty(),
            "cycle counter stack not empty (depth={})",
            self.cycles.stack_depth()
        );
    }

    // ---------------------------------------------------------------------
    // Introspection
    // ---------------------------------------------------------------------

    pub fn count(&self, ns: Namespace) -> usize {
        match ns {
            Namespace::Cycle => self.cycles.index().len(),
            Namespace::Timer => self.timers.index().len(),
            Namespace::Int64 => self.int64.index().len(),
            Namespace::Double => self.doubles.index().len(),
            Namespace::Memory => self.memory.index().len(),
        }
    }

    pub fn contains(&self, ns: Namespace, name: &str) -> bool {
        match ns {
            Namespace::Cycle => self.cycles.index().contains_name(name),
            Namespace::Timer => self.timers.index().contains_name(name),
            Namespace::Int64 => self.int64.index().contains_name(name),
            Namespace::Double => self.doubles.index().contains_name(name),
            Namespace::Memory => self.memory.index().contains_name(name),
        }
    }

    pub fn contains_handle(&self, ns: Namespace, handle: CounterHandle) -> bool {
        match ns {
            Namespace::Cycle => self.cycles.index().contains_handle(handle),
            Namespace::Timer => self.timers.index().contains_handle(handle),
            Namespace::Int64 => self.int64.index().contains_handle(handle),
            Namespace::Double => self.doubles.index().contains_handle(handle),
            Namespace::Memory => self.memory.index().contains_handle(handle),
        }
    }

    pub fn handle_of(&self, ns: Namespace, name: &str) -> Option<CounterHandle> {
        match ns {
            Namespace::Cycle => self.cycles.index().handle_of(name),
            Namespace::Timer => self.timers.index().handle_of(name),
            Namespace::Int64 => self.int64.index().handle_of(name),
            Namespace::Double => self.doubles.index().handle_of(name),
            Namespace::Memory => self.memory.index().handle_of(name),
        }
    }

    /// Name behind a handle issued by this registry, whatever its namespace.
    pub fn name_of(&self, handle: CounterHandle) -> Option<&StatName> {
        self.cycles
            .index()
            .name_of(handle)
            .or_else(|| self.timers.index().name_of(handle))
            .or_else(|| self.int64.index().name_of(handle))
            .or_else(|| self.doubles.index().name_of(handle))
            .or_else(|| self.memory.index().name_of(handle))
    }

    pub fn is_cycle_counter_started<'a>(&self, addr: impl Into<StatAddress<'a>>) -> Result<bool> {
        self.cycles.is_started(addr.into())
    }

    pub fn is_timer_running<'a>(&self, addr: impl Into<StatAddress<'a>>) -> Result<bool> {
        self.timers.is_running(addr.into())
    }
}
