//! Process-scoped host context.
//!
//! Owns the sink, the registry and the binding table. Built once at startup
//! and handed (cloned) to whatever needs it: the replay driver, the HTTP
//! exposition, tests. Nothing here is a global.

use std::sync::{Arc, Mutex};

use statreg_core::error::{Result, StatRegError};
use statreg_core::{Clock, InstrumentationRegistry, SystemClock};

use crate::bindings::{Bindings, ScriptValue};
use crate::config::{CounterKind, HostConfig};
use crate::sink::MemorySink;

/// Outcome of closing one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameReport {
    pub frame: u64,
    /// Cycle stack depth left over, if any.
    pub unbalanced_depth: Option<usize>,
}

#[derive(Clone)]
pub struct HostState {
    inner: Arc<HostStateInner>,
}

struct HostStateInner {
    cfg: HostConfig,
    sink: Arc<MemorySink>,
    registry: Mutex<InstrumentationRegistry>,
    bindings: Bindings,
}

impl HostState {
    pub fn new(cfg: HostConfig) -> Result<Self> {
        Self::with_clock(cfg, Arc::new(SystemClock::new()))
    }

    /// Build state and pre-register every counter the config declares.
    pub fn with_clock(cfg: HostConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let sink = Arc::new(MemorySink::new(cfg.sink.collecting));
        let mut registry = InstrumentationRegistry::new(sink.clone())
            .with_clock(clock)
            .with_group(cfg.group.to_stat_group());

        for c in &cfg.counters {
            let desc = c.description.as_deref();
            let created = match c.kind {
                CounterKind::Cycle => registry.try_create_cycle_counter(&c.name, desc),
                CounterKind::Timer => {
                    registry.try_create_timer_accumulator(&c.name, desc, c.scale_or_default())
                }
                CounterKind::Int64Counter => registry.try_create_int64_counter(&c.name, desc),
                CounterKind::Int64Accumulator => {
                    registry.try_create_int64_accumulator(&c.name, desc)
                }
                CounterKind::DoubleCounter => registry.try_create_double_counter(&c.name, desc),
                CounterKind::DoubleAccumulator => {
                    registry.try_create_double_accumulator(&c.name, desc)
                }
                CounterKind::Memory => registry.try_create_memory_counter(&c.name, desc),
            };
            created.map_err(|e| {
                StatRegError::BadConfig(format!(
                    "pre-register {} '{}' failed: {e}",
                    c.kind.as_str(),
                    c.name
                ))
            })?;
        }
        tracing::info!(
            group = %cfg.group.name,
            counters = cfg.counters.len(),
            collecting = cfg.sink.collecting,
            "stat registry ready"
        );

        Ok(Self {
            inner: Arc::new(HostStateInner {
                cfg,
                sink,
                registry: Mutex::new(registry),
                bindings: Bindings::with_builtins(),
            }),
        })
    }

    pub fn cfg(&self) -> &HostConfig {
        &self.inner.cfg
    }

    pub fn sink(&self) -> Arc<MemorySink> {
        Arc::clone(&self.inner.sink)
    }

    pub fn bindings(&self) -> &Bindings {
        &self.inner.bindings
    }

    /// Run `f` with exclusive access to the registry.
    pub fn with_registry<T>(&self, f: impl FnOnce(&mut InstrumentationRegistry) -> T) -> Result<T> {
        let mut guard = self
            .inner
            .registry
            .lock()
            .map_err(|_| StatRegError::Internal("registry lock poisoned".into()))?;
        Ok(f(&mut guard))
    }

    /// Call a script binding by name.
    pub fn call(&self, name: &str, args: &[ScriptValue]) -> Result<ScriptValue> {
        let bindings = &self.inner.bindings;
        self.with_registry(|reg| bindings.call(reg, name, args))?
    }

    /// Roll the sink over to the next frame and report the cycle stack.
    pub fn end_frame(&self) -> Result<FrameReport> {
        let unbalanced_depth = match self.with_registry(|reg| reg.end_frame())? {
            Ok(()) => None,
            Err(StatRegError::UnbalancedStack { depth }) => Some(depth),
            Err(e) => return Err(e),
        };
        let frame = self.inner.sink.frame();
        Ok(FrameReport {
            frame,
            unbalanced_depth,
        })
    }
}
