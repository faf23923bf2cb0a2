use std::sync::Arc;

use super::{Dependency, DependencyFamily, DependencyKind};
use crate::error::{ModelError, Result};
use crate::list::{EntryKey, ParameterList};
use crate::validator::Validator;
use crate::value::{Number, ValueType};

impl Dependency {
    /// Whether `dependent` is currently shown.
    pub fn is_dependent_visible(&self, list: &ParameterList, dependent: EntryKey) -> Result<bool> {
        self.ensure_dependent(list, dependent)?;
        let Some(show_if) = self.show_if() else {
            return Err(self.wrong_family("visibility"));
        };
        Ok(self.trigger(list)? == show_if)
    }

    /// Raw trigger value of a visual dependency, before `show_if` is applied.
    pub fn trigger(&self, list: &ParameterList) -> Result<bool> {
        match &self.kind {
            DependencyKind::BoolVisual { dependee, .. } => list.read_bool(*dependee),
            DependencyKind::StringVisual {
                dependee, values, ..
            } => {
                let value = list.read_str(*dependee)?;
                Ok(values.iter().any(|candidate| candidate == value))
            }
            DependencyKind::NumberVisual {
                dependee,
                kind,
                function,
                ..
            } => {
                let number = list.read_number(*dependee, *kind)?;
                Ok(function.map_or(number, |f| f.apply(number)).is_truthy())
            }
            DependencyKind::ConditionVisual { condition, .. } => condition.evaluate(list),
            _ => Err(self.wrong_family("visibility")),
        }
    }

    /// The validator currently governing `dependent`, if any.
    pub fn validator_for(
        &self,
        list: &ParameterList,
        dependent: EntryKey,
    ) -> Result<Option<Arc<Validator>>> {
        self.ensure_dependent(list, dependent)?;
        let chosen = match &self.kind {
            DependencyKind::BoolValidator {
                dependee,
                true_validator,
                false_validator,
            } => {
                if list.read_bool(*dependee)? {
                    true_validator.clone()
                } else {
                    false_validator.clone()
                }
            }
            DependencyKind::StringValidator {
                dependee,
                validators,
                default_validator,
            } => {
                let value = list.read_str(*dependee)?;
                validators
                    .get(value)
                    .or(default_validator.as_ref())
                    .cloned()
            }
            DependencyKind::RangeValidator {
                dependee,
                kind,
                ranges,
                default_validator,
            } => {
                let value = list.read_number(*dependee, *kind)?.as_f64();
                ranges
                    .iter()
                    .find(|(range, _)| range.contains(value))
                    .map(|(_, validator)| validator)
                    .or(default_validator.as_ref())
                    .cloned()
            }
            _ => return Err(self.wrong_family("validator")),
        };
        Ok(chosen)
    }

    /// Length the array entry `dependent` should have. Negative results clamp to zero.
    pub fn required_array_length(&self, list: &ParameterList, dependent: EntryKey) -> Result<usize> {
        self.ensure_dependent(list, dependent)?;
        let DependencyKind::NumberArrayLength {
            dependee,
            kind,
            function,
        } = &self.kind
        else {
            return Err(self.wrong_family("array length"));
        };
        list.expect_array(dependent)?;
        let number = list.read_number(*dependee, *kind)?;
        let length = match function.map_or(number, |f| f.apply(number)) {
            Number::Int(value) => usize::try_from(value.max(0)).unwrap_or(usize::MAX),
            Number::Double(value) if value.is_nan() || value <= 0.0 => 0,
            // Saturating float-to-int cast.
            Number::Double(value) => value as usize,
        };
        Ok(length)
    }

    /// Check every dependee and dependent holds a value of the type this
    /// dependency reads, without evaluating anything.
    pub fn check_types(&self, list: &ParameterList) -> Result<()> {
        for dependent in &self.dependents {
            list.require(*dependent)?;
        }
        match &self.kind {
            DependencyKind::BoolVisual { dependee, .. }
            | DependencyKind::BoolValidator { dependee, .. } => {
                list.expect_type(*dependee, ValueType::Bool)
            }
            DependencyKind::StringVisual { dependee, .. }
            | DependencyKind::StringValidator { dependee, .. } => {
                list.expect_type(*dependee, ValueType::String)
            }
            DependencyKind::NumberVisual { dependee, kind, .. }
            | DependencyKind::RangeValidator { dependee, kind, .. } => {
                list.expect_type(*dependee, kind.value_type())
            }
            DependencyKind::NumberArrayLength { dependee, kind, .. } => {
                list.expect_type(*dependee, kind.value_type())?;
                self.dependents
                    .iter()
                    .try_for_each(|dependent| list.expect_array(*dependent))
            }
            DependencyKind::ConditionVisual { condition, .. } => condition.check_types(list),
        }
    }

    fn ensure_dependent(&self, list: &ParameterList, dependent: EntryKey) -> Result<()> {
        if self.dependents.contains(&dependent) {
            Ok(())
        } else {
            Err(ModelError::NotADependent {
                entry: list.display_name(dependent),
                dependency_type: self.type_tag(),
            })
        }
    }

    fn wrong_family(&self, query: &'static str) -> ModelError {
        ModelError::WrongFamily {
            dependency_type: self.type_tag(),
            query,
        }
    }

    pub(crate) fn is_family(&self, family: DependencyFamily) -> bool {
        self.family() == family
    }
}
