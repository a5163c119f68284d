use dashmap::DashMap;

use statreg_core::error::{Result, StatRegError};
use statreg_core::InstrumentationRegistry;

use super::functions::{self as f, BindingFn};
use super::value::ScriptValue;

/// Registry of script-visible functions, keyed by the name scripts call.
#[derive(Default)]
pub struct Bindings {
    fns: DashMap<&'static str, BindingFn>,
}

impl Bindings {
    pub fn new() -> Self {
        Self {
            fns: DashMap::new(),
        }
    }

    /// Table with every built-in entry point registered.
    pub fn with_builtins() -> Self {
        let b = Self::new();
        b.register("cycle_counter_create", f::cycle_counter_create);
        b.register("cycle_counter_start", f::cycle_counter_start);
        b.register("cycle_counter_stop", f::cycle_counter_stop);
        b.register("cycle_counter_set", f::cycle_counter_set);

        b.register("timer_create", f::timer_create);
        b.register("timer_start", f::timer_start);
        b.register("timer_stop", f::timer_stop);

        b.register("int64_stat_create", f::int64_stat_create);
        b.register("int64_stat_add", f::int64_stat_add);
        b.register("int64_stat_subtract", f::int64_stat_subtract);
        b.register("int64_stat_set", f::int64_stat_set);

        b.register("double_stat_create", f::double_stat_create);
        b.register("double_stat_add", f::double_stat_add);
        b.register("double_stat_subtract", f::double_stat_subtract);
        b.register("double_stat_set", f::double_stat_set);

        b.register("memory_stat_create", f::memory_stat_create);
        b.register("memory_stat_add", f::memory_stat_add);
        b.register("memory_stat_subtract", f::memory_stat_subtract);
        b.register("memory_stat_set", f::memory_stat_set);

        b.register("label_stat_set", f::label_stat_set);
        b.register("frame_end", f::frame_end);
        b
    }

    pub fn register(&self, name: &'static str, func: BindingFn) {
        if self.fns.insert(name, func).is_some() {
            tracing::warn!(binding = name, "binding replaced");
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fns.contains_key(name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.fns.iter().map(|e| *e.key()).collect();
        names.sort_unstable();
        names
    }

    /// Invoke `name`. Only an unknown function name is an error; everything
    /// else is answered in script values.
    pub fn call(
        &self,
        reg: &mut InstrumentationRegistry,
        name: &str,
        args: &[ScriptValue],
    ) -> Result<ScriptValue> {
        let func = *self
            .fns
            .get(name)
            .ok_or_else(|| StatRegError::InvalidArgument(format!("unknown binding: {name}")))?
            .value();
        let out = func(reg, args);
        tracing::trace!(binding = name, argc = args.len(), result = %out, "binding call");
        Ok(out)
    }
}
