//! Named scalar tables (int64, double, memory).
//!
//! A table only records which names exist and their handles; values live in
//! the sink. One generic table is instantiated per scalar namespace and each
//! instance gates on its own membership.

use crate::error::{Result, StatRegError};
use crate::handle::{CounterHandle, StatAddress, StatName};
use crate::sink::{SampleValue, StatOperation, StatSink, ValueKind};

use super::index::SlotIndex;
use super::Namespace;

/// Value type carried by a scalar table.
pub(crate) trait ScalarValue: Copy + std::fmt::Debug {
    const KIND: ValueKind;
    fn is_zero(self) -> bool;
    fn into_sample(self) -> SampleValue;
}

impl ScalarValue for i64 {
    const KIND: ValueKind = ValueKind::Int64;

    fn is_zero(self) -> bool {
        self == 0
    }

    fn into_sample(self) -> SampleValue {
        SampleValue::Int64(self)
    }
}

impl ScalarValue for f64 {
    const KIND: ValueKind = ValueKind::Double;

    fn is_zero(self) -> bool {
        self == 0.0
    }

    fn into_sample(self) -> SampleValue {
        SampleValue::Double(self)
    }
}

#[derive(Debug)]
pub(crate) struct ScalarEntry {
    name: StatName,
}

pub(crate) struct ScalarTable<V: ScalarValue> {
    entries: SlotIndex<ScalarEntry>,
    _value: std::marker::PhantomData<V>,
}

impl<V: ScalarValue> ScalarTable<V> {
    pub(crate) fn new(namespace: Namespace) -> Self {
        Self {
            entries: SlotIndex::new(namespace),
            _value: std::marker::PhantomData,
        }
    }

    pub(crate) fn index(&self) -> &SlotIndex<ScalarEntry> {
        &self.entries
    }

    pub(crate) fn value_kind(&self) -> ValueKind {
        V::KIND
    }

    pub(crate) fn insert(&mut self, name: StatName, handle: CounterHandle) {
        self.entries.insert(name.clone(), handle, ScalarEntry { name });
    }

    /// Forward one sample. Zero values are skipped on purpose: an add,
    /// subtract or set of zero never reaches the sink.
    pub(crate) fn apply(
        &self,
        addr: StatAddress<'_>,
        op: StatOperation,
        value: V,
        sink: &dyn StatSink,
    ) -> Result<()> {
        let entry = self.entries.lookup(addr)?;
        if value.is_zero() {
            return Err(StatRegError::InvalidArgument(format!(
                "zero-valued {} on {} stat skipped",
                op.as_str(),
                self.entries.namespace().as_str()
            )));
        }
        if !sink.is_collecting() {
            return Err(StatRegError::CollectionDisabled);
        }
        sink.submit(&entry.name, op, value.into_sample());
        Ok(())
    }
}
