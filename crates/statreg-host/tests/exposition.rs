#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use statreg_host::app_state::HostState;
use statreg_host::bindings::ScriptValue;
use statreg_host::config;

fn state() -> HostState {
    let cfg = config::load_from_str(
        r#"
version: 1
counters:
  - { kind: int64_counter, name: "entities", description: "live entities" }
  - { kind: memory, name: "heap" }
"#,
    )
    .unwrap();
    HostState::new(cfg).unwrap()
}

#[test]
fn render_is_prometheus_text() {
    let state = state();
    state
        .call("int64_stat_set", &[ScriptValue::Str("entities".into()), ScriptValue::Number(7.0)])
        .unwrap();
    state
        .call(
            "label_stat_set",
            &[ScriptValue::Str("level".into()), ScriptValue::Str("forest".into())],
        )
        .unwrap();

    let text = state.sink().render();
    assert!(text.contains("# HELP statreg_entities live entities"));
    assert!(text.contains("# TYPE statreg_entities gauge"));
    assert!(text.contains("statreg_entities{stat=\"entities\",kind=\"int64\"} 7\n"));
    assert!(text.contains("statreg_heap{stat=\"heap\",kind=\"int64\"} 0\n"));
    assert!(text.contains("statreg_label{stat=\"level\",value=\"forest\"} 1"));
    assert!(text.contains("statreg_collecting 1"));
    assert!(text.contains("statreg_frames_total 0"));
}

#[test]
fn end_frame_clears_per_frame_series_only() {
    let state = state();
    let name = |n: &str| ScriptValue::Str(n.into());
    state.call("int64_stat_add", &[name("entities"), ScriptValue::Number(3.0)]).unwrap();
    state.call("memory_stat_add", &[name("heap"), ScriptValue::Number(4096.0)]).unwrap();

    let report = state.end_frame().unwrap();
    assert_eq!(report.frame, 1);
    assert_eq!(report.unbalanced_depth, None);

    let snap = serde_json::to_value(state.sink().snapshot()).unwrap();
    assert_eq!(snap["frame"], 1);
    let stats = snap["stats"].as_array().unwrap();
    let by_name = |n: &str| stats.iter().find(|s| s["name"] == n).unwrap().clone();
    assert_eq!(by_name("entities")["value"], 0);
    assert_eq!(by_name("heap")["value"], 4096);
}

#[test]
fn collection_disabled_drops_samples() {
    let state = state();
    state.sink().set_collecting(false);
    let out = state
        .call("int64_stat_add", &[ScriptValue::Str("entities".into()), ScriptValue::Number(1.0)])
        .unwrap();
    assert_eq!(out, ScriptValue::Boolean(false));
    assert!(state.sink().render().contains("statreg_collecting 0"));
}

#[test]
fn same_name_in_two_kinds_renders_two_series() {
    let state = state();
    let name = |n: &str| ScriptValue::Str(n.into());
    state.call("double_stat_create", &[name("entities")]).unwrap();
    state.call("int64_stat_add", &[name("entities"), ScriptValue::Number(2.0)]).unwrap();
    state.call("double_stat_add", &[name("entities"), ScriptValue::Number(0.5)]).unwrap();

    let text = state.sink().render();
    assert_eq!(text.matches("# TYPE statreg_entities gauge").count(), 1);
    assert!(text.contains("statreg_entities{stat=\"entities\",kind=\"int64\"} 2\n"));
    assert!(text.contains("statreg_entities{stat=\"entities\",kind=\"double\"} 0.5\n"));
}
