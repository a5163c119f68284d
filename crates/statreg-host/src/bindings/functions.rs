//! Script entry points, one per registry operation.
//!
//! Every function takes the raw argument list and answers with a script
//! value: a handle or `Nil` for creates, a boolean for everything else, and
//! `Nil` when the call itself is malformed (bad arity, first argument neither
//! a name nor a handle).

use statreg_core::{InstrumentationRegistry, StatAddress};

use super::value::ScriptValue;

/// Signature shared by all entry points.
pub type BindingFn = fn(&mut InstrumentationRegistry, &[ScriptValue]) -> ScriptValue;

/// `(name, description?)` for creates taking at most `max` arguments.
fn create_args(args: &[ScriptValue], max: usize) -> Option<(&str, Option<&str>)> {
    if args.is_empty() || args.len() > max {
        return None;
    }
    let name = args.first()?.as_str()?;
    let desc = args.get(1).and_then(ScriptValue::as_str);
    Some((name, desc))
}

/// Numeric operand; absent or non-numeric means one.
fn operand(args: &[ScriptValue]) -> f64 {
    args.get(1).and_then(ScriptValue::as_number).unwrap_or(1.0)
}

fn with_address(args: &[ScriptValue], f: impl FnOnce(StatAddress<'_>) -> bool) -> ScriptValue {
    match args.first().and_then(ScriptValue::as_address) {
        Some(addr) => ScriptValue::Boolean(f(addr)),
        None => ScriptValue::Nil,
    }
}

// -------------------------------------------------------------------------
// Cycle counters
// -------------------------------------------------------------------------

pub fn cycle_counter_create(
    reg: &mut InstrumentationRegistry,
    args: &[ScriptValue],
) -> ScriptValue {
    match create_args(args, 2) {
        Some((name, desc)) => reg.create_cycle_counter(name, desc).into(),
        None => ScriptValue::Nil,
    }
}

pub fn cycle_counter_start(reg: &mut InstrumentationRegistry, args: &[ScriptValue]) -> ScriptValue {
    with_address(args, |a| reg.start_cycle_counter(a))
}

/// Arguments are ignored; stop always pops the innermost counter.
pub fn cycle_counter_stop(reg: &mut InstrumentationRegistry, _args: &[ScriptValue]) -> ScriptValue {
    reg.stop_cycle_counter().into()
}

pub fn cycle_counter_set(reg: &mut InstrumentationRegistry, args: &[ScriptValue]) -> ScriptValue {
    let cycles = args
        .get(1)
        .and_then(ScriptValue::as_number)
        .filter(|n| n.is_finite() && (0.0..=f64::from(u32::MAX)).contains(n));
    match cycles {
        Some(n) => with_address(args, |a| reg.set_cycle_counter(a, n as u32)),
        None => ScriptValue::Nil,
    }
}

// -------------------------------------------------------------------------
// Timer accumulators
// -------------------------------------------------------------------------

pub fn timer_create(reg: &mut InstrumentationRegistry, args: &[ScriptValue]) -> ScriptValue {
    let Some((name, desc)) = create_args(args, 3) else {
        return ScriptValue::Nil;
    };
    let scale = args.get(2).and_then(ScriptValue::as_number).unwrap_or(1.0);
    reg.create_timer_accumulator(name, desc, scale).into()
}

pub fn timer_start(reg: &mut InstrumentationRegistry, args: &[ScriptValue]) -> ScriptValue {
    with_address(args, |a| reg.start_timer_accumulator(a))
}

pub fn timer_stop(reg: &mut InstrumentationRegistry, args: &[ScriptValue]) -> ScriptValue {
    with_address(args, |a| reg.stop_timer_accumulator(a))
}

// -------------------------------------------------------------------------
// Int64
// -------------------------------------------------------------------------

/// Third argument picks counter (`true`, default) or accumulator.
pub fn int64_stat_create(reg: &mut InstrumentationRegistry, args: &[ScriptValue]) -> ScriptValue {
    let Some((name, desc)) = create_args(args, 3) else {
        return ScriptValue::Nil;
    };
    if args.get(2).and_then(ScriptValue::as_bool).unwrap_or(true) {
        reg.create_int64_counter(name, desc).into()
    } else {
        reg.create_int64_accumulator(name, desc).into()
    }
}

pub fn int64_stat_add(reg: &mut InstrumentationRegistry, args: &[ScriptValue]) -> ScriptValue {
    let v = operand(args) as i64;
    with_address(args, |a| reg.add_int64(a, v))
}

pub fn int64_stat_subtract(reg: &mut InstrumentationRegistry, args: &[ScriptValue]) -> ScriptValue {
    let v = operand(args) as i64;
    with_address(args, |a| reg.subtract_int64(a, v))
}

pub fn int64_stat_set(reg: &mut InstrumentationRegistry, args: &[ScriptValue]) -> ScriptValue {
    let v = operand(args) as i64;
    with_address(args, |a| reg.set_int64(a, v))
}

// -------------------------------------------------------------------------
// Double
// -------------------------------------------------------------------------

pub fn double_stat_create(reg: &mut InstrumentationRegistry, args: &[ScriptValue]) -> ScriptValue {
    let Some((name, desc)) = create_args(args, 3) else {
        return ScriptValue::Nil;
    };
    if args.get(2).and_then(ScriptValue::as_bool).unwrap_or(true) {
        reg.create_double_counter(name, desc).into()
    } else {
        reg.create_double_accumulator(name, desc).into()
    }
}

pub fn double_stat_add(reg: &mut InstrumentationRegistry, args: &[ScriptValue]) -> ScriptValue {
    let v = operand(args);
    with_address(args, |a| reg.add_double(a, v))
}

pub fn double_stat_subtract(
    reg: &mut InstrumentationRegistry,
    args: &[ScriptValue],
) -> ScriptValue {
    let v = operand(args);
    with_address(args, |a| reg.subtract_double(a, v))
}

pub fn double_stat_set(reg: &mut InstrumentationRegistry, args: &[ScriptValue]) -> ScriptValue {
    let v = operand(args);
    with_address(args, |a| reg.set_double(a, v))
}

// -------------------------------------------------------------------------
// Memory
// -------------------------------------------------------------------------

pub fn memory_stat_create(reg: &mut InstrumentationRegistry, args: &[ScriptValue]) -> ScriptValue {
    match create_args(args, 2) {
        Some((name, desc)) => reg.create_memory_counter(name, desc).into(),
        None => ScriptValue::Nil,
    }
}

pub fn memory_stat_add(reg: &mut InstrumentationRegistry, args: &[ScriptValue]) -> ScriptValue {
    let v = operand(args) as i64;
    with_address(args, |a| reg.add_memory(a, v))
}

pub fn memory_stat_subtract(
    reg: &mut InstrumentationRegistry,
    args: &[ScriptValue],
) -> ScriptValue {
    let v = operand(args) as i64;
    with_address(args, |a| reg.subtract_memory(a, v))
}

pub fn memory_stat_set(reg: &mut InstrumentationRegistry, args: &[ScriptValue]) -> ScriptValue {
    let v = operand(args) as i64;
    with_address(args, |a| reg.set_memory(a, v))
}

// -------------------------------------------------------------------------
// Labels
// -------------------------------------------------------------------------

/// A missing or non-string value answers `false`, not `Nil`.
pub fn label_stat_set(reg: &mut InstrumentationRegistry, args: &[ScriptValue]) -> ScriptValue {
    let value = args.get(1).and_then(ScriptValue::as_str).unwrap_or("");
    with_address(args, |a| reg.set_label(a, value))
}

/// Rolls the sink over to the next frame. `false` when the cycle stack was
/// left unbalanced; the rollover happens regardless.
pub fn frame_end(reg: &mut InstrumentationRegistry, _args: &[ScriptValue]) -> ScriptValue {
    reg.end_frame().is_ok().into()
}
