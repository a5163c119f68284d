//! Registry properties: uniqueness, dual addressing, stack discipline and
//! scalar gating.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

mod support;

use statreg_core::{
    CounterHandle, MemoryRegion, Namespace, SampleValue, StatAddress, StatOperation,
    StatRegError, ValueKind,
};
use support::{fixture, Submission};

#[test]
fn duplicate_create_returns_none_and_counts_once() {
    let mut f = fixture();

    assert!(f.reg.create_cycle_counter("tick", None).is_some());
    assert!(f.reg.create_cycle_counter("tick", None).is_none());
    assert!(f.reg.create_timer_accumulator("tick", None, 1.0).is_some());
    assert!(f.reg.create_timer_accumulator("tick", None, 1.0).is_none());
    assert!(f.reg.create_int64_counter("tick", None).is_some());
    assert!(f.reg.create_int64_accumulator("tick", None).is_none());
    assert!(f.reg.create_double_accumulator("tick", None).is_some());
    assert!(f.reg.create_double_counter("tick", None).is_none());
    assert!(f.reg.create_memory_counter("tick", None).is_some());
    assert!(f.reg.create_memory_counter("tick", None).is_none());

    for ns in Namespace::ALL {
        assert_eq!(f.reg.count(ns), 1, "namespace={}", ns.as_str());
        assert!(f.reg.contains(ns, "tick"));
    }
    // One metadata registration per successful create only.
    assert_eq!(f.sink.metadata().len(), 5);
}

#[test]
fn duplicate_reports_namespace() {
    let mut f = fixture();
    f.reg.try_create_int64_counter("a", None).unwrap();
    let err = f.reg.try_create_int64_accumulator("a", None).unwrap_err();
    assert_eq!(
        err,
        StatRegError::DuplicateName {
            namespace: "int64",
            name: "a".into()
        }
    );
}

#[test]
fn empty_name_rejected_without_sink_traffic() {
    let mut f = fixture();
    assert!(f.reg.create_cycle_counter("", None).is_none());
    assert!(f.reg.create_int64_counter("  ", Some("blank")).is_none());
    assert!(f.sink.metadata().is_empty());
}

#[test]
fn metadata_flags_follow_counter_kind() {
    let mut f = fixture();
    f.reg.create_cycle_counter("c", Some("cycles")).unwrap();
    f.reg.create_timer_accumulator("t", Some(""), 1.0).unwrap();
    f.reg.create_int64_counter("i", None).unwrap();
    f.reg.create_int64_accumulator("ia", None).unwrap();
    f.reg.create_double_counter("d", None).unwrap();
    f.reg.create_memory_counter("m", None).unwrap();

    let meta = f.sink.metadata();
    let by = |n: &str| meta.iter().find(|m| m.name.as_str() == n).unwrap().clone();

    let c = by("c");
    assert!(c.is_cycle_stat && c.clear_every_frame);
    assert_eq!(c.value_kind, ValueKind::Int64);
    assert_eq!(c.description.as_deref(), Some("cycles"));

    let t = by("t");
    assert!(!t.clear_every_frame);
    assert_eq!(t.value_kind, ValueKind::Double);
    assert_eq!(t.description, None);

    assert!(by("i").clear_every_frame);
    assert!(!by("ia").clear_every_frame);
    assert_eq!(by("d").value_kind, ValueKind::Double);

    let m = by("m");
    assert_eq!(m.memory_region, Some(MemoryRegion::Physical));
    assert!(!m.clear_every_frame);
    assert_eq!(m.group.name, "Script");
}

#[test]
fn handle_and_name_address_same_cycle_slot() {
    let mut f = fixture();
    let h = f.reg.create_cycle_counter("frame.update", None).unwrap();

    assert!(f.reg.start_cycle_counter(h));
    assert!(f.reg.is_cycle_counter_started("frame.update").unwrap());
    f.clock.advance_nanos(500);
    assert!(f.reg.stop_cycle_counter());
    assert!(!f.reg.is_cycle_counter_started(h).unwrap());

    assert_eq!(f.reg.handle_of(Namespace::Cycle, "frame.update"), Some(h));
    assert_eq!(f.reg.name_of(h).map(|n| n.as_str()), Some("frame.update"));
}

#[test]
fn handle_and_name_address_same_timer_slot() {
    let mut f = fixture();
    let h = f.reg.create_timer_accumulator("io", None, 1.0).unwrap();

    assert!(f.reg.start_timer_accumulator("io"));
    assert!(f.reg.is_timer_running(h).unwrap());
    f.clock.advance_millis(5);
    assert!(f.reg.stop_timer_accumulator(h));
    assert!(!f.reg.is_timer_running("io").unwrap());
    assert_eq!(f.sink.submissions().len(), 1);
}

#[test]
fn handle_from_other_namespace_is_unknown() {
    let mut f = fixture();
    let cycle = f.reg.create_cycle_counter("shared", None).unwrap();
    f.reg.create_int64_counter("shared", None).unwrap();

    // Same name exists in int64, but this handle belongs to the cycle pool.
    assert!(!f.reg.add_int64(cycle, 3));
    assert!(!f.reg.start_timer_accumulator(cycle));
    assert!(f.reg.add_int64("shared", 3));
    assert!(f.reg.contains_handle(Namespace::Cycle, cycle));
    assert!(!f.reg.contains_handle(Namespace::Int64, cycle));
}

#[test]
fn nested_stops_unwind_in_lifo_order() {
    let mut f = fixture();
    f.reg.create_cycle_counter("outer", None).unwrap();
    f.reg.create_cycle_counter("inner", None).unwrap();

    assert!(f.reg.start_cycle_counter("outer"));
    f.clock.advance_nanos(100);
    assert!(f.reg.start_cycle_counter("inner"));
    f.clock.advance_nanos(30);
    assert!(f.reg.stop_cycle_counter());
    f.clock.advance_nanos(20);
    assert!(f.reg.stop_cycle_counter());

    assert_eq!(
        f.sink.submissions(),
        vec![
            Submission {
                name: "inner".into(),
                op: StatOperation::Add,
                value: SampleValue::Int64(30)
            },
            Submission {
                name: "outer".into(),
                op: StatOperation::Add,
                value: SampleValue::Int64(150)
            },
        ]
    );
    assert_eq!(f.reg.cycle_stack_depth(), 0);
}

#[test]
fn restart_while_started_only_pushes() {
    let mut f = fixture();
    f.reg.create_cycle_counter("a", None).unwrap();

    assert!(f.reg.start_cycle_counter("a"));
    f.clock.advance_nanos(10);
    // Second start does not reset the sampling window.
    assert!(f.reg.start_cycle_counter("a"));
    assert_eq!(f.reg.cycle_stack_depth(), 2);
    f.clock.advance_nanos(10);

    assert!(f.reg.stop_cycle_counter());
    // Slot already stopped; the pop succeeds but emits nothing.
    assert!(f.reg.stop_cycle_counter());

    let subs = f.sink.submissions();
    assert_eq!(subs.len(), 1);
    assert_eq!(subs[0].value, SampleValue::Int64(20));
}

#[test]
fn stop_on_empty_stack_is_rejected() {
    let mut f = fixture();
    f.reg.create_cycle_counter("a", None).unwrap();

    assert!(!f.reg.stop_cycle_counter());
    assert_eq!(f.reg.try_stop_cycle_counter(), Err(StatRegError::EmptyStack));
    assert!(f.sink.submissions().is_empty());
    assert!(!f.reg.is_cycle_counter_started("a").unwrap());
}

#[test]
fn unknown_cycle_start_does_not_push() {
    let mut f = fixture();
    assert!(!f.reg.start_cycle_counter("nope"));
    assert_eq!(f.reg.cycle_stack_depth(), 0);
    assert!(!f.reg.set_cycle_counter("nope", 10));
}

#[test]
fn set_cycle_counter_ignores_stack() {
    let mut f = fixture();
    let h = f.reg.create_cycle_counter("gpu", None).unwrap();

    assert!(f.reg.set_cycle_counter(h, 4242));
    assert_eq!(f.reg.cycle_stack_depth(), 0);
    assert_eq!(
        f.sink.submissions(),
        vec![Submission {
            name: "gpu".into(),
            op: StatOperation::Set,
            value: SampleValue::Int64(4242)
        }]
    );
}

#[test]
fn timers_run_independently() {
    let mut f = fixture();
    f.reg.create_timer_accumulator("a", None, 1.0).unwrap();
    f.reg.create_timer_accumulator("b", None, 1.0).unwrap();

    assert!(f.reg.start_timer_accumulator("a"));
    f.clock.advance_millis(1);
    assert!(f.reg.start_timer_accumulator("b"));
    f.clock.advance_millis(1);
    assert!(f.reg.stop_timer_accumulator("a"));
    f.clock.advance_millis(1);
    assert!(f.reg.stop_timer_accumulator("b"));

    let subs = f.sink.submissions();
    let secs = |i: usize| match subs[i].value {
        SampleValue::Double(v) => v,
        ref other => panic!("unexpected sample {other:?}"),
    };
    assert_eq!(subs[0].name, "a");
    assert!((secs(0) - 0.002).abs() < 1e-9);
    assert_eq!(subs[1].name, "b");
    assert!((secs(1) - 0.002).abs() < 1e-9);
}

#[test]
fn timer_restart_overwrites_start_and_stop_without_start_is_silent() {
    let mut f = fixture();
    f.reg.create_timer_accumulator("t", None, 1.0).unwrap();

    // Known name, never started: accepted, nothing emitted.
    assert!(f.reg.stop_timer_accumulator("t"));
    assert!(f.sink.submissions().is_empty());

    f.reg.start_timer_accumulator("t");
    f.clock.advance_millis(10);
    f.reg.start_timer_accumulator("t");
    f.clock.advance_millis(1);
    f.reg.stop_timer_accumulator("t");

    let subs = f.sink.submissions();
    assert_eq!(subs.len(), 1);
    match subs[0].value {
        SampleValue::Double(v) => assert!((v - 0.001).abs() < 1e-9),
        ref other => panic!("unexpected sample {other:?}"),
    }
}

#[test]
fn non_finite_timer_scale_rejected() {
    let mut f = fixture();
    assert!(f.reg.create_timer_accumulator("t", None, f64::NAN).is_none());
    assert!(f.reg.create_timer_accumulator("t", None, f64::INFINITY).is_none());
    assert_eq!(f.reg.count(Namespace::Timer), 0);
}

#[test]
fn zero_delta_is_a_noop() {
    let mut f = fixture();
    let h = f.reg.create_int64_counter("n", None).unwrap();
    f.reg.create_double_counter("d", None).unwrap();
    f.reg.create_memory_counter("m", None).unwrap();

    assert!(!f.reg.add_int64("n", 0));
    assert!(!f.reg.subtract_int64(h, 0));
    assert!(!f.reg.set_int64("n", 0));
    assert!(!f.reg.add_double("d", 0.0));
    assert!(!f.reg.set_double("d", -0.0));
    assert!(!f.reg.add_memory("m", 0));
    assert!(f.sink.submissions().is_empty());
}

#[test]
fn scalar_ops_blocked_while_not_collecting() {
    let mut f = fixture();
    f.reg.create_int64_counter("n", None).unwrap();
    f.sink.set_collecting(false);

    assert!(!f.reg.add_int64("n", 1));
    assert_eq!(f.reg.try_add_int64("n", 1), Err(StatRegError::CollectionDisabled));

    f.sink.set_collecting(true);
    assert!(f.reg.add_int64("n", 1));
    assert_eq!(f.sink.submissions().len(), 1);
}

#[test]
fn cycle_and_timer_state_moves_while_not_collecting() {
    let mut f = fixture();
    f.reg.create_cycle_counter("outer", None).unwrap();
    f.reg.create_timer_accumulator("io", None, 1.0).unwrap();

    assert!(f.reg.start_cycle_counter("outer"));
    assert!(f.reg.start_timer_accumulator("io"));
    f.sink.set_collecting(false);
    f.clock.advance_nanos(40);

    assert!(f.reg.stop_cycle_counter());
    assert_eq!(f.reg.cycle_stack_depth(), 0);
    assert!(!f.reg.is_cycle_counter_started("outer").unwrap());

    assert!(f.reg.stop_timer_accumulator("io"));
    assert!(!f.reg.is_timer_running("io").unwrap());

    assert!(f.sink.submissions().is_empty());
    assert!(f.reg.end_frame().is_ok());

    // Collection back on: the next window starts clean.
    f.sink.set_collecting(true);
    assert!(f.reg.start_cycle_counter("outer"));
    f.clock.advance_nanos(5);
    assert!(f.reg.stop_cycle_counter());
    assert_eq!(
        f.sink.submissions(),
        vec![Submission {
            name: "outer".into(),
            op: StatOperation::Add,
            value: SampleValue::Int64(5)
        }]
    );
}

#[test]
fn each_scalar_category_gates_on_its_own_table() {
    let mut f = fixture();
    f.reg.create_int64_counter("only_int", None).unwrap();
    let d = f.reg.create_double_counter("only_double", None).unwrap();

    assert!(!f.reg.set_double("only_int", 1.5));
    assert!(!f.reg.add_memory("only_int", 1));
    assert!(f.reg.set_double(d, 1.5));
    assert!(!f.reg.set_int64(d, 2));

    assert_eq!(
        f.sink.submissions(),
        vec![Submission {
            name: "only_double".into(),
            op: StatOperation::Set,
            value: SampleValue::Double(1.5)
        }]
    );
}

#[test]
fn unknown_addresses_have_no_side_effects() {
    let mut f = fixture();
    let stray = CounterHandle::from_raw(0xdead).unwrap();

    assert!(!f.reg.add_int64("ghost", 1));
    assert!(!f.reg.subtract_double(stray, 1.0));
    assert!(!f.reg.set_memory(StatAddress::Name("ghost"), 9));
    assert!(!f.reg.start_timer_accumulator(stray));
    assert!(!f.reg.stop_timer_accumulator("ghost"));
    assert!(!f.reg.set_label(stray, "x"));

    assert!(f.sink.submissions().is_empty());
    for ns in Namespace::ALL {
        assert_eq!(f.reg.count(ns), 0);
    }
}

#[test]
fn labels_need_only_a_name_and_a_value() {
    let mut f = fixture();
    assert!(f.reg.set_label("map.current", "harbor"));
    assert!(!f.reg.set_label("map.current", ""));
    assert!(!f.reg.set_label("", "harbor"));

    let h = f.reg.create_memory_counter("heap", None).unwrap();
    assert!(f.reg.set_label(h, "arena-2"));

    assert_eq!(
        f.sink.submissions(),
        vec![
            Submission {
                name: "map.current".into(),
                op: StatOperation::Label,
                value: SampleValue::Label("harbor".into())
            },
            Submission {
                name: "heap".into(),
                op: StatOperation::Label,
                value: SampleValue::Label("arena-2".into())
            },
        ]
    );
}

#[test]
fn end_frame_reports_unbalanced_stack() {
    let mut f = fixture();
    f.reg.create_cycle_counter("leak", None).unwrap();
    assert!(f.reg.end_frame().is_ok());

    f.reg.start_cycle_counter("leak");
    assert_eq!(f.reg.end_frame(), Err(StatRegError::UnbalancedStack { depth: 1 }));
    // Entry left in place; a later stop still pops it.
    assert!(f.reg.stop_cycle_counter());
    assert!(f.reg.end_frame().is_ok());
    // The sink rolls over on every boundary, balanced or not.
    assert_eq!(f.sink.frames(), 3);
    f.reg.debug_assert_stack_empty();
}

#[test]
#[cfg(debug_assertions)]
#[should_panic(expected = "cycle counter stack not empty")]
fn debug_assert_catches_unmatched_start() {
    let mut f = fixture();
    f.reg.create_cycle_counter("leak", None).unwrap();
    f.reg.start_cycle_counter("leak");
    f.reg.debug_assert_stack_empty();
}
