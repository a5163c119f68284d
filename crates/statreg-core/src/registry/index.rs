//! Arena-style slot storage with name and handle indices.
//!
//! Both indices are written in the same `insert` call and never touched
//! again; there is no removal path. Slot indices stay private to the crate.

use std::collections::HashMap;

use crate::error::{Result, StatRegError};
use crate::handle::{CounterHandle, StatAddress, StatName};

use super::Namespace;

pub(crate) struct SlotIndex<T> {
    namespace: Namespace,
    slots: Vec<T>,
    handles: Vec<CounterHandle>,
    names: Vec<StatName>,
    by_name: HashMap<StatName, usize>,
    by_handle: HashMap<CounterHandle, usize>,
}

impl<T> SlotIndex<T> {
    pub(crate) fn new(namespace: Namespace) -> Self {
        Self {
            namespace,
            slots: Vec::new(),
            handles: Vec::new(),
            names: Vec::new(),
            by_name: HashMap::new(),
            by_handle: HashMap::new(),
        }
    }

    pub(crate) fn namespace(&self) -> Namespace {
        self.namespace
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn contains_name(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub(crate) fn contains_handle(&self, handle: CounterHandle) -> bool {
        self.by_handle.contains_key(&handle)
    }

    pub(crate) fn handle_of(&self, name: &str) -> Option<CounterHandle> {
        self.by_name
            .get(name)
            .and_then(|&idx| self.handles.get(idx))
            .copied()
    }

    pub(crate) fn name_of(&self, handle: CounterHandle) -> Option<&StatName> {
        self.by_handle
            .get(&handle)
            .and_then(|&idx| self.names.get(idx))
    }

    /// Fail if `name` is already taken in this namespace.
    pub(crate) fn ensure_vacant(&self, name: &StatName) -> Result<()> {
        if self.contains_name(name.as_str()) {
            return Err(StatRegError::DuplicateName {
                namespace: self.namespace.as_str(),
                name: name.to_string(),
            });
        }
        Ok(())
    }

    /// Append a slot and index it under both keys. Callers check
    /// `ensure_vacant` first.
    pub(crate) fn insert(&mut self, name: StatName, handle: CounterHandle, slot: T) -> usize {
        let idx = self.slots.len();
        self.slots.push(slot);
        self.handles.push(handle);
        self.names.push(name.clone());
        self.by_name.insert(name, idx);
        self.by_handle.insert(handle, idx);
        idx
    }

    pub(crate) fn resolve(&self, addr: StatAddress<'_>) -> Result<usize> {
        let hit = match addr {
            StatAddress::Name(n) => self.by_name.get(n),
            StatAddress::Handle(h) => self.by_handle.get(&h),
        };
        hit.copied().ok_or_else(|| StatRegError::UnknownAddress {
            namespace: self.namespace.as_str(),
            address: addr.to_string(),
        })
    }

    pub(crate) fn get_mut(&mut self, idx: usize) -> Option<&mut T> {
        self.slots.get_mut(idx)
    }

    /// Resolve and borrow in one step.
    pub(crate) fn lookup(&self, addr: StatAddress<'_>) -> Result<&T> {
        let idx = self.resolve(addr)?;
        let ns = self.namespace;
        self.slots.get(idx).ok_or_else(|| dangling(ns, idx))
    }

    pub(crate) fn lookup_mut(&mut self, addr: StatAddress<'_>) -> Result<&mut T> {
        let idx = self.resolve(addr)?;
        let ns = self.namespace;
        self.slots.get_mut(idx).ok_or_else(|| dangling(ns, idx))
    }
}

pub(crate) fn dangling(namespace: Namespace, idx: usize) -> StatRegError {
    StatRegError::Internal(format!(
        "{} index points past slot pool (idx={idx})",
        namespace.as_str()
    ))
}
