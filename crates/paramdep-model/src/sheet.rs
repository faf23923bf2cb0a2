//! Index of every dependency in a configuration, keyed by dependee.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::dependency::{Dependency, DependencyFamily};
use crate::error::Result;
use crate::list::{EntryKey, ParameterList};
use crate::validator::Validator;

/// Named collection of dependencies.
///
/// Built once by a single writer and consulted read-only afterwards. Lookups by
/// dependee return dependencies in insertion order.
#[derive(Debug, Clone, Default)]
pub struct DependencySheet {
    name: String,
    dependencies: Vec<Arc<Dependency>>,
    by_dependee: BTreeMap<EntryKey, Vec<Arc<Dependency>>>,
}

impl DependencySheet {
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
        self.dependencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }

    /// Register a dependency. Returns `false` if this exact handle is already present.
    pub fn add_dependency(&mut self, dependency: Arc<Dependency>) -> bool {
        if self
            .dependencies
            .iter()
            .any(|existing| Arc::ptr_eq(existing, &dependency))
        {
            trace!(
                dependency_type = dependency.type_tag(),
                "dependency already registered"
            );
            return false;
        }
        for dependee in dependency.dependees() {
            self.by_dependee
                .entry(dependee)
                .or_default()
                .push(Arc::clone(&dependency));
        }
        debug!(
            sheet = %self.name,
            dependency_type = dependency.type_tag(),
            dependents = dependency.dependents().len(),
            "registered dependency"
        );
        self.dependencies.push(dependency);
        true
    }

    /// Remove a dependency by handle identity. Returns whether it was present.
    pub fn remove_dependency(&mut self, dependency: &Arc<Dependency>) -> bool {
        let before = self.dependencies.len();
        self.dependencies
            .retain(|existing| !Arc::ptr_eq(existing, dependency));
        if self.dependencies.len() == before {
            return false;
        }
        for dependee in dependency.dependees() {
            if let Some(bucket) = self.by_dependee.get_mut(&dependee) {
                bucket.retain(|existing| !Arc::ptr_eq(existing, dependency));
                if bucket.is_empty() {
                    self.by_dependee.remove(&dependee);
                }
            }
        }
        true
    }

    /// Dependencies that read `dependee`, in insertion order.
    pub fn dependencies_for(&self, dependee: EntryKey) -> &[Arc<Dependency>] {
        self.by_dependee
            .get(&dependee)
            .map_or(&[], Vec::as_slice)
    }

    /// Dependencies that govern `dependent`, in insertion order.
    pub fn dependencies_of(&self, dependent: EntryKey) -> impl Iterator<Item = &Arc<Dependency>> {
        self.dependencies
            .iter()
            .filter(move |dependency| dependency.has_dependent(dependent))
    }

    pub fn has_dependents(&self, dependee: EntryKey) -> bool {
        self.by_dependee.contains_key(&dependee)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Arc<Dependency>> {
        self.dependencies.iter()
    }

    /// True unless some visual dependency governing `entry` hides it.
    pub fn is_visible(&self, list: &ParameterList, entry: EntryKey) -> Result<bool> {
        for dependency in self.dependencies_of(entry) {
            if dependency.is_family(DependencyFamily::Visual)
                && !dependency.is_dependent_visible(list, entry)?
            {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// First validator chosen by a validator dependency governing `entry`,
    /// falling back to the entry's own validator.
    pub fn effective_validator(
        &self,
        list: &ParameterList,
        entry: EntryKey,
    ) -> Result<Option<Arc<Validator>>> {
        for dependency in self.dependencies_of(entry) {
            if dependency.is_family(DependencyFamily::Validator)
                && let Some(validator) = dependency.validator_for(list, entry)?
            {
                return Ok(Some(validator));
            }
        }
        Ok(list.require(entry)?.validator().cloned())
    }

    /// Type-check every registered dependency against `list`.
    pub fn check_types(&self, list: &ParameterList) -> Result<()> {
        self.dependencies
            .iter()
            .try_for_each(|dependency| dependency.check_types(list))
    }
}

impl<'a> IntoIterator for &'a DependencySheet {
    type Item = &'a Arc<Dependency>;
    type IntoIter = std::slice::Iter<'a, Arc<Dependency>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dependency::DependencyKind;
    use crate::validator::{EnhancedNumberValidator, FileNameValidator};
    use crate::value::NumberKind;

    fn bool_visual(dependee: EntryKey, dependent: EntryKey) -> Arc<Dependency> {
        Arc::new(
            Dependency::new(
                DependencyKind::BoolVisual {
                    dependee,
                    show_if: true,
                },
                [dependent],
            )
            .unwrap(),
        )
    }

    #[test]
    fn adding_same_handle_twice_is_noop() {
        let mut list = ParameterList::new("Sheet");
        let flag = list.set("flag", true).unwrap();
        let value = list.set("value", 1).unwrap();
        let dependency = bool_visual(flag, value);
        let mut sheet = DependencySheet::new("deps");
        assert!(sheet.add_dependency(Arc::clone(&dependency)));
        assert!(!sheet.add_dependency(Arc::clone(&dependency)));
        assert_eq!(sheet.len(), 1);
        assert_eq!(sheet.dependencies_for(flag).len(), 1);
    }

    #[test]
    fn lookups_preserve_insertion_order() {
        let mut list = ParameterList::new("Sheet");
        let flag = list.set("flag", true).unwrap();
        let a = list.set("a", 1).unwrap();
        let b = list.set("b", 2).unwrap();
        let first = bool_visual(flag, b);
        let second = bool_visual(flag, a);
        let mut sheet = DependencySheet::new("deps");
        sheet.add_dependency(Arc::clone(&first));
        sheet.add_dependency(Arc::clone(&second));
        let found = sheet.dependencies_for(flag);
        assert!(Arc::ptr_eq(&found[0], &first));
        assert!(Arc::ptr_eq(&found[1], &second));
        assert!(sheet.dependencies_for(a).is_empty());
    }

    #[test]
    fn remove_dependency_clears_index() {
        let mut list = ParameterList::new("Sheet");
        let flag = list.set("flag", true).unwrap();
        let value = list.set("value", 1).unwrap();
        let dependency = bool_visual(flag, value);
        let mut sheet = DependencySheet::new("deps");
        sheet.add_dependency(Arc::clone(&dependency));
        assert!(sheet.remove_dependency(&dependency));
        assert!(!sheet.remove_dependency(&dependency));
        assert!(sheet.is_empty());
        assert!(!sheet.has_dependents(flag));
    }

    #[test]
    fn effective_validator_prefers_dependency_over_entry() {
        let own = Arc::new(Validator::from(
            EnhancedNumberValidator::new(NumberKind::Double, 0.0, 1.0).unwrap(),
        ));
        let strict = Arc::new(Validator::from(
            EnhancedNumberValidator::new(NumberKind::Double, 0.0, 0.5).unwrap(),
        ));
        let mut list = ParameterList::new("Sheet");
        let flag = list.set("strict", false).unwrap();
        let tolerance = list
            .insert(crate::list::ConfigEntry::new("tolerance", 0.75).with_validator(Arc::clone(&own)))
            .unwrap();
        let mut sheet = DependencySheet::new("deps");
        sheet.add_dependency(Arc::new(
            Dependency::new(
                DependencyKind::BoolValidator {
                    dependee: flag,
                    true_validator: Some(Arc::clone(&strict)),
                    false_validator: None,
                },
                [tolerance],
            )
            .unwrap(),
        ));
        let chosen = sheet.effective_validator(&list, tolerance).unwrap().unwrap();
        assert!(Arc::ptr_eq(&chosen, &own));
        list.set_value(flag, true).unwrap();
        let chosen = sheet.effective_validator(&list, tolerance).unwrap().unwrap();
        assert!(Arc::ptr_eq(&chosen, &strict));
        assert!(!chosen.accepts(list.value(tolerance).unwrap()));
    }

    #[test]
    fn is_visible_requires_every_visual_dependency() {
        let mut list = ParameterList::new("Sheet");
        let a = list.set("a", true).unwrap();
        let b = list.set("b", false).unwrap();
        let target = list.set("target", "x").unwrap();
        let mut sheet = DependencySheet::new("deps");
        sheet.add_dependency(bool_visual(a, target));
        sheet.add_dependency(bool_visual(b, target));
        sheet.add_dependency(Arc::new(
            Dependency::new(
                DependencyKind::BoolValidator {
                    dependee: a,
                    true_validator: Some(Arc::new(Validator::from(FileNameValidator::default()))),
                    false_validator: None,
                },
                [target],
            )
            .unwrap(),
        ));
        assert!(!sheet.is_visible(&list, target).unwrap());
        list.set_value(b, true).unwrap();
        assert!(sheet.is_visible(&list, target).unwrap());
        assert!(sheet.is_visible(&list, a).unwrap());
    }
}
