//! Integer surrogate IDs used for cross-references inside documents.
//!
//! Writers map in-memory objects to IDs; readers map IDs back to objects. IDs
//! exist only for the duration of one conversion.

use std::collections::BTreeMap;
use std::sync::Arc;

use paramdep_model::{DependencySheet, EntryKey, ParameterList, Validator};

use crate::error::{Result, XmlError};

/// Entry → ID, used when writing.
#[derive(Debug, Clone, Default)]
pub struct EntryIdMap {
    ids: BTreeMap<EntryKey, u32>,
}

impl EntryIdMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// IDs 0, 1, 2, … in list order.
    pub fn from_list(list: &ParameterList) -> Self {
        let ids = list
            .iter()
            .zip(0_u32..)
            .map(|((key, _), id)| (key, id))
            .collect();
        Self { ids }
    }

    pub fn insert(&mut self, key: EntryKey, id: u32) {
        self.ids.insert(key, id);
    }

    pub fn remove(&mut self, key: EntryKey) -> Option<u32> {
        self.ids.remove(&key)
    }

    pub fn id(&self, key: EntryKey) -> Option<u32> {
        self.ids.get(&key).copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// The reader-side map for the same assignment.
    pub fn inverse(&self) -> IdToEntryMap {
        IdToEntryMap {
            entries: self.ids.iter().map(|(key, id)| (*id, *key)).collect(),
        }
    }
}

/// Validator → ID by handle identity, used when writing.
#[derive(Debug, Clone, Default)]
pub struct ValidatorIdMap {
    assigned: Vec<(Arc<Validator>, u32)>,
    next_id: u32,
}

impl ValidatorIdMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign IDs to every validator reachable from `list` and `sheet`.
    ///
    /// Entry validators come first in list order, then dependency validators in
    /// sheet order.
    pub fn collect(list: &ParameterList, sheet: &DependencySheet) -> Self {
        let mut map = Self::new();
        for (_, entry) in list.iter() {
            if let Some(validator) = entry.validator() {
                map.assign(validator);
            }
        }
        for dependency in sheet {
            for validator in dependency.kind().validators() {
                map.assign(validator);
            }
        }
        map
    }

    /// ID for `validator`, assigning the next free one on first sight.
    ///
    /// Array prototypes are assigned before the array validator holding them.
    pub fn assign(&mut self, validator: &Arc<Validator>) -> u32 {
        if let Some(id) = self.id(validator) {
            return id;
        }
        if let Validator::Array(array) = validator.as_ref() {
            self.assign(array.prototype());
        }
        let id = self.next_id;
        self.next_id += 1;
        self.assigned.push((Arc::clone(validator), id));
        id
    }

    pub fn id(&self, validator: &Arc<Validator>) -> Option<u32> {
        self.assigned
            .iter()
            .find(|(existing, _)| Arc::ptr_eq(existing, validator))
            .map(|(_, id)| *id)
    }

    pub fn remove(&mut self, validator: &Arc<Validator>) -> Option<u32> {
        let index = self
            .assigned
            .iter()
            .position(|(existing, _)| Arc::ptr_eq(existing, validator))?;
        Some(self.assigned.remove(index).1)
    }

    /// Validators in ID order.
    pub fn iter(&self) -> impl Iterator<Item = (&Arc<Validator>, u32)> {
        self.assigned.iter().map(|(validator, id)| (validator, *id))
    }

    pub fn len(&self) -> usize {
        self.assigned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }

    pub fn inverse(&self) -> IdToValidatorMap {
        IdToValidatorMap {
            validators: self
                .assigned
                .iter()
                .map(|(validator, id)| (*id, Arc::clone(validator)))
                .collect(),
        }
    }
}

/// ID → entry, produced by loading the plain parameter list.
#[derive(Debug, Clone, Default)]
pub struct IdToEntryMap {
    entries: BTreeMap<u32, EntryKey>,
}

impl IdToEntryMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `id`; an ID may only be used once.
    pub fn insert(&mut self, id: u32, key: EntryKey) -> Result<()> {
        if self.entries.contains_key(&id) {
            return Err(XmlError::DuplicateId { kind: "parameter", id });
        }
        self.entries.insert(id, key);
        Ok(())
    }

    pub fn remove(&mut self, id: u32) -> Option<EntryKey> {
        self.entries.remove(&id)
    }

    pub fn get(&self, id: u32) -> Option<EntryKey> {
        self.entries.get(&id).copied()
    }

    /// Reverse lookup, for messages.
    pub fn id_of(&self, key: EntryKey) -> Option<u32> {
        self.entries
            .iter()
            .find(|(_, existing)| **existing == key)
            .map(|(id, _)| *id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// ID → validator, produced by loading the validator block.
#[derive(Debug, Clone, Default)]
pub struct IdToValidatorMap {
    validators: BTreeMap<u32, Arc<Validator>>,
}

impl IdToValidatorMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: u32, validator: Arc<Validator>) -> Result<()> {
        if self.validators.contains_key(&id) {
            return Err(XmlError::DuplicateId { kind: "validator", id });
        }
        self.validators.insert(id, validator);
        Ok(())
    }

    pub fn remove(&mut self, id: u32) -> Option<Arc<Validator>> {
        self.validators.remove(&id)
    }

    pub fn get(&self, id: u32) -> Option<&Arc<Validator>> {
        self.validators.get(&id)
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }
}
