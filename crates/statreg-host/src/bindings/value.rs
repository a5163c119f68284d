//! Dynamic values crossing the script boundary.

use std::fmt;

use statreg_core::{CounterHandle, StatAddress};

/// Script-side value. Handles travel as raw pointer-sized integers, the way
/// a scripting VM carries light userdata.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptValue {
    Nil,
    Boolean(bool),
    Number(f64),
    Str(String),
    Handle(usize),
}

impl ScriptValue {
    pub fn is_nil(&self) -> bool {
        matches!(self, ScriptValue::Nil)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScriptValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            ScriptValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ScriptValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Name or handle, whichever this value is. A null handle is not an
    /// address.
    pub fn as_address(&self) -> Option<StatAddress<'_>> {
        match self {
            ScriptValue::Str(s) => Some(StatAddress::Name(s)),
            ScriptValue::Handle(raw) => CounterHandle::from_raw(*raw).ok().map(StatAddress::Handle),
            _ => None,
        }
    }
}

impl From<bool> for ScriptValue {
    fn from(b: bool) -> Self {
        ScriptValue::Boolean(b)
    }
}

impl From<Option<CounterHandle>> for ScriptValue {
    fn from(h: Option<CounterHandle>) -> Self {
        h.map_or(ScriptValue::Nil, |h| ScriptValue::Handle(h.as_raw()))
    }
}

impl From<&str> for ScriptValue {
    fn from(s: &str) -> Self {
        ScriptValue::Str(s.to_owned())
    }
}

impl From<f64> for ScriptValue {
    fn from(n: f64) -> Self {
        ScriptValue::Number(n)
    }
}

impl fmt::Display for ScriptValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptValue::Nil => f.write_str("nil"),
            ScriptValue::Boolean(b) => write!(f, "{b}"),
            ScriptValue::Number(n) => write!(f, "{n}"),
            ScriptValue::Str(s) => write!(f, "{s:?}"),
            ScriptValue::Handle(h) => write!(f, "handle#{h:x}"),
        }
    }
}
