//! Scripted call replay.
//!
//! A replay file is a YAML list of steps run in order against a
//! [`HostState`]. Each step does exactly one thing:
//!
//! ```yaml
//! steps:
//!   - call: timer_create
//!     args: ["frame.physics", "", 1000]
//!     bind: physics            # remember the returned handle
//!   - call: timer_start
//!     args: [{ handle: physics }]
//!     expect: true
//!   - advance_ms: 2            # needs a manual clock
//!   - end_frame: true
//! ```

use std::collections::HashMap;
use std::fs;

use serde::Deserialize;
use statreg_core::error::{Result, StatRegError};
use statreg_core::ManualClock;

use crate::app_state::HostState;
use crate::bindings::ScriptValue;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReplayScript {
    pub steps: Vec<ReplayStep>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReplayStep {
    #[serde(default)]
    pub call: Option<String>,
    #[serde(default)]
    pub args: Vec<ReplayArg>,
    #[serde(default)]
    pub bind: Option<String>,
    #[serde(default)]
    pub expect: Option<Expect>,

    #[serde(default)]
    pub advance_ms: Option<u64>,
    #[serde(default)]
    pub end_frame: bool,
}

impl ReplayStep {
    fn validate(&self, i: usize) -> Result<()> {
        let actions = [self.call.is_some(), self.advance_ms.is_some(), self.end_frame]
            .iter()
            .filter(|a| **a)
            .count();
        if actions != 1 {
            return Err(StatRegError::BadConfig(format!(
                "step {i}: exactly one of call / advance_ms / end_frame required"
            )));
        }
        let call_only = !self.args.is_empty() || self.bind.is_some() || self.expect.is_some();
        if self.call.is_none() && call_only {
            return Err(StatRegError::BadConfig(format!(
                "step {i}: args / bind / expect only apply to call steps"
            )));
        }
        Ok(())
    }
}

/// Argument literal. `{ handle: x }` refers to a handle bound earlier.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ReplayArg {
    Handle { handle: String },
    Bool(bool),
    Number(f64),
    Str(String),
    Nil(()),
}

/// Expected result: `true`, `false`, `nil` or `handle`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Expect {
    Bool(bool),
    Word(String),
}

impl Expect {
    fn matches(&self, v: &ScriptValue) -> Result<bool> {
        Ok(match (self, v) {
            (Expect::Bool(b), ScriptValue::Boolean(got)) => b == got,
            (Expect::Bool(_), _) => false,
            (Expect::Word(w), _) => match w.as_str() {
                "nil" => v.is_nil(),
                "handle" => matches!(v, ScriptValue::Handle(_)),
                other => {
                    return Err(StatRegError::BadConfig(format!(
                        "unknown expectation '{other}' (want true/false/nil/handle)"
                    )))
                }
            },
        })
    }
}

/// What one step produced.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    Called { call: String, result: ScriptValue },
    Advanced { millis: u64 },
    FrameEnded { frame: u64, unbalanced_depth: Option<usize> },
}

pub fn load_from_file(path: &str) -> Result<ReplayScript> {
    let s = fs::read_to_string(path)
        .map_err(|e| StatRegError::Internal(format!("read replay failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<ReplayScript> {
    let script: ReplayScript = serde_yaml::from_str(s)
        .map_err(|e| StatRegError::BadConfig(format!("invalid replay yaml: {e}")))?;
    for (i, step) in script.steps.iter().enumerate() {
        step.validate(i)?;
    }
    Ok(script)
}

/// Run every step. Stops at the first failed expectation, unknown binding or
/// unbound handle name.
pub fn run(
    state: &HostState,
    clock: Option<&ManualClock>,
    script: &ReplayScript,
) -> Result<Vec<StepOutcome>> {
    let mut handles: HashMap<String, usize> = HashMap::new();
    let mut out = Vec::with_capacity(script.steps.len());

    for (i, step) in script.steps.iter().enumerate() {
        if let Some(millis) = step.advance_ms {
            let clock = clock.ok_or_else(|| {
                StatRegError::BadConfig(format!("step {i}: advance_ms needs a manual clock"))
            })?;
            clock.advance_millis(millis);
            out.push(StepOutcome::Advanced { millis });
            continue;
        }

        if step.end_frame {
            let report = state.end_frame()?;
            out.push(StepOutcome::FrameEnded {
                frame: report.frame,
                unbalanced_depth: report.unbalanced_depth,
            });
            continue;
        }

        let Some(call) = step.call.as_deref() else {
            continue;
        };
        let args = step
            .args
            .iter()
            .map(|a| resolve_arg(i, a, &handles))
            .collect::<Result<Vec<_>>>()?;
        let result = state.call(call, &args)?;
        tracing::debug!(step = i, call, result = %result, "replay step");

        if let Some(expect) = &step.expect {
            if !expect.matches(&result)? {
                return Err(StatRegError::BadConfig(format!(
                    "step {i}: {call} returned {result}, expected {expect:?}"
                )));
            }
        }
        if let (Some(bind), ScriptValue::Handle(raw)) = (&step.bind, &result) {
            handles.insert(bind.clone(), *raw);
        }
        out.push(StepOutcome::Called {
            call: call.to_owned(),
            result,
        });
    }
    Ok(out)
}

fn resolve_arg(
    step: usize,
    arg: &ReplayArg,
    handles: &HashMap<String, usize>,
) -> Result<ScriptValue> {
    Ok(match arg {
        ReplayArg::Handle { handle } => {
            let raw = handles.get(handle).ok_or_else(|| {
                StatRegError::BadConfig(format!("step {step}: handle '{handle}' not bound"))
            })?;
            ScriptValue::Handle(*raw)
        }
        ReplayArg::Bool(b) => ScriptValue::Boolean(*b),
        ReplayArg::Number(n) => ScriptValue::Number(*n),
        ReplayArg::Str(s) => ScriptValue::Str(s.clone()),
        ReplayArg::Nil(()) => ScriptValue::Nil,
    })
}
