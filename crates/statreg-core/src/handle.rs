//! Counter identity: interned names, opaque handles, and the name-or-handle
//! address accepted by every read/mutate call.

use std::borrow::Borrow;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;

use crate::error::{Result, StatRegError};

/// Opaque, stable counter identifier minted by the sink.
///
/// Pointer-sized and never null. The registry stores it as a plain value and
/// never frees anything behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CounterHandle(NonZeroUsize);

impl CounterHandle {
    pub const fn new(raw: NonZeroUsize) -> Self {
        Self(raw)
    }

    /// Rebuild a handle from the raw value a script layer carried around.
    /// A zero (null) raw value is rejected.
    pub fn from_raw(raw: usize) -> Result<Self> {
        NonZeroUsize::new(raw)
            .map(Self)
            .ok_or_else(|| StatRegError::InvalidArgument("null counter handle".into()))
    }

    pub fn as_raw(self) -> usize {
        self.0.get()
    }
}

impl fmt::Display for CounterHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:x}", self.0)
    }
}

/// Interned stat name. Clones share one allocation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StatName(Arc<str>);

impl StatName {
    /// Build a name, rejecting empty or whitespace-only input.
    pub fn new(name: &str) -> Result<Self> {
        if name.trim().is_empty() {
            return Err(StatRegError::InvalidArgument("stat name must not be empty".into()));
        }
        Ok(Self(Arc::from(name)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for StatName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for StatName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StatName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Name-or-handle address. Resolution uses exactly the index matching the
/// variant; a miss never retries with the other key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatAddress<'a> {
    Name(&'a str),
    Handle(CounterHandle),
}

impl fmt::Display for StatAddress<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatAddress::Name(n) => write!(f, "name={n}"),
            StatAddress::Handle(h) => write!(f, "handle={h}"),
        }
    }
}

impl<'a> From<&'a str> for StatAddress<'a> {
    fn from(name: &'a str) -> Self {
        StatAddress::Name(name)
    }
}

impl<'a> From<&'a String> for StatAddress<'a> {
    fn from(name: &'a String) -> Self {
        StatAddress::Name(name.as_str())
    }
}

impl<'a> From<&'a StatName> for StatAddress<'a> {
    fn from(name: &'a StatName) -> Self {
        StatAddress::Name(name.as_str())
    }
}

impl From<CounterHandle> for StatAddress<'_> {
    fn from(handle: CounterHandle) -> Self {
        StatAddress::Handle(handle)
    }
}
