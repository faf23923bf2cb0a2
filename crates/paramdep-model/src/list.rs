//! The configuration store: an ordered, typed name→value map.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::validator::Validator;
use crate::value::{EntryValue, Number, NumberKind, ValueType};

/// Stable handle to an entry inside a [`ParameterList`].
///
/// Rules hold keys rather than entries; the list stays the single owner of values.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct EntryKey(usize);

impl EntryKey {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A named, typed configuration value.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigEntry {
    name: String,
    value: EntryValue,
    validator: Option<Arc<Validator>>,
    doc: Option<String>,
}

impl ConfigEntry {
    pub fn new(name: impl Into<String>, value: impl Into<EntryValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            validator: None,
            doc: None,
        }
    }

    /// Attach the entry's own validator.
    #[must_use]
    pub fn with_validator(mut self, validator: Arc<Validator>) -> Self {
        self.validator = Some(validator);
        self
    }

    #[must_use]
    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &EntryValue {
        &self.value
    }

    pub fn value_type(&self) -> ValueType {
        self.value.value_type()
    }

    pub fn validator(&self) -> Option<&Arc<Validator>> {
        self.validator.as_ref()
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    fn mismatch(&self, expected: ValueType) -> ModelError {
        ModelError::TypeMismatch {
            entry: self.name.clone(),
            expected,
            found: self.value_type(),
        }
    }
}

/// Ordered collection of entries, addressed by name or by [`EntryKey`].
#[derive(Debug, Clone, Default)]
pub struct ParameterList {
    name: String,
    entries: Vec<ConfigEntry>,
    by_name: BTreeMap<String, EntryKey>,
}

impl ParameterList {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert a new entry or replace the value of an existing one.
    ///
    /// Replacing keeps the entry's type: a value of another type fails with
    /// [`ModelError::TypeMismatch`] and leaves the entry untouched.
    pub fn set(&mut self, name: &str, value: impl Into<EntryValue>) -> Result<EntryKey> {
        let value = value.into();
        match self.key(name) {
            Some(key) => {
                self.set_value(key, value)?;
                Ok(key)
            }
            None => self.insert(ConfigEntry::new(name, value)),
        }
    }

    /// Append a fully built entry; the name must be unused.
    pub fn insert(&mut self, entry: ConfigEntry) -> Result<EntryKey> {
        if self.by_name.contains_key(entry.name()) {
            return Err(ModelError::DuplicateEntry {
                name: entry.name().to_string(),
            });
        }
        let key = EntryKey(self.entries.len());
        self.by_name.insert(entry.name().to_string(), key);
        self.entries.push(entry);
        Ok(key)
    }

    /// Replace the value behind `key`, keeping its type.
    pub fn set_value(&mut self, key: EntryKey, value: impl Into<EntryValue>) -> Result<()> {
        let value = value.into();
        let entry = self
            .entries
            .get_mut(key.0)
            .ok_or(ModelError::UnknownEntry { key })?;
        if entry.value_type() != value.value_type() {
            return Err(ModelError::TypeMismatch {
                entry: entry.name.clone(),
                expected: entry.value_type(),
                found: value.value_type(),
            });
        }
        entry.value = value;
        Ok(())
    }

    pub fn key(&self, name: &str) -> Option<EntryKey> {
        self.by_name.get(name).copied()
    }

    pub fn entry(&self, key: EntryKey) -> Option<&ConfigEntry> {
        self.entries.get(key.0)
    }

    pub fn get(&self, name: &str) -> Option<&EntryValue> {
        self.key(name)
            .and_then(|key| self.entry(key))
            .map(ConfigEntry::value)
    }

    /// Entry behind `key`, or [`ModelError::UnknownEntry`].
    pub fn require(&self, key: EntryKey) -> Result<&ConfigEntry> {
        self.entry(key).ok_or(ModelError::UnknownEntry { key })
    }

    pub fn value(&self, key: EntryKey) -> Result<&EntryValue> {
        self.require(key).map(ConfigEntry::value)
    }

    /// Entry name for messages; falls back to the key's display form.
    pub fn display_name(&self, key: EntryKey) -> String {
        self.entry(key)
            .map(|entry| entry.name().to_string())
            .unwrap_or_else(|| key.to_string())
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (EntryKey, &ConfigEntry)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(index, entry)| (EntryKey(index), entry))
    }

    pub fn read_bool(&self, key: EntryKey) -> Result<bool> {
        let entry = self.require(key)?;
        entry
            .value()
            .as_bool()
            .ok_or_else(|| entry.mismatch(ValueType::Bool))
    }

    pub fn read_str(&self, key: EntryKey) -> Result<&str> {
        let entry = self.require(key)?;
        entry
            .value()
            .as_str()
            .ok_or_else(|| entry.mismatch(ValueType::String))
    }

    pub fn read_number(&self, key: EntryKey, kind: NumberKind) -> Result<Number> {
        let entry = self.require(key)?;
        entry
            .value()
            .as_number(kind)
            .ok_or_else(|| entry.mismatch(kind.value_type()))
    }

    /// Fails unless the entry holds a value of exactly `expected`.
    pub fn expect_type(&self, key: EntryKey, expected: ValueType) -> Result<()> {
        let entry = self.require(key)?;
        if entry.value_type() == expected {
            Ok(())
        } else {
            Err(entry.mismatch(expected))
        }
    }

    /// Fails unless the entry holds an array of any element type.
    pub fn expect_array(&self, key: EntryKey) -> Result<()> {
        let entry = self.require(key)?;
        if entry.value_type().is_array() {
            Ok(())
        } else {
            Err(entry.mismatch(ValueType::DoubleArray))
        }
    }

    /// Names of entries whose value their own validator rejects.
    pub fn validate_entries(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|entry| {
                entry
                    .validator()
                    .is_some_and(|validator| !validator.accepts(entry.value()))
            })
            .map(ConfigEntry::name)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_inserts_then_replaces() {
        let mut list = ParameterList::new("Solver");
        let key = list.set("tolerance", 1e-6).unwrap();
        assert_eq!(list.set("tolerance", 1e-8).unwrap(), key);
        assert_eq!(list.get("tolerance"), Some(&EntryValue::Double(1e-8)));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn set_rejects_other_type() {
        let mut list = ParameterList::new("Solver");
        list.set("max iterations", 100).unwrap();
        let err = list.set("max iterations", 10.5).unwrap_err();
        assert_eq!(
            err,
            ModelError::TypeMismatch {
                entry: "max iterations".to_string(),
                expected: ValueType::Int,
                found: ValueType::Double,
            }
        );
        assert_eq!(list.get("max iterations"), Some(&EntryValue::Int(100)));
    }

    #[test]
    fn insert_rejects_duplicate_names() {
        let mut list = ParameterList::new("Solver");
        list.insert(ConfigEntry::new("method", "GMRES")).unwrap();
        let err = list.insert(ConfigEntry::new("method", "CG")).unwrap_err();
        assert!(matches!(err, ModelError::DuplicateEntry { .. }));
    }

    #[test]
    fn iteration_follows_insertion_order() {
        let mut list = ParameterList::new("Order");
        list.set("b", 1).unwrap();
        list.set("a", 2).unwrap();
        list.set("c", 3).unwrap();
        let names: Vec<&str> = list.iter().map(|(_, entry)| entry.name()).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }

    #[test]
    fn read_number_requires_exact_kind() {
        let mut list = ParameterList::new("Numbers");
        let key = list.set("count", 4).unwrap();
        assert_eq!(list.read_number(key, NumberKind::Int), Ok(Number::Int(4)));
        assert!(matches!(
            list.read_number(key, NumberKind::Double),
            Err(ModelError::TypeMismatch { .. })
        ));
    }
}
