//! `<Dependency>` elements and the converter registry that dispatches on their type.
//!
//! The shared envelope (type tag, `showIf`, `Dependee` and `Dependent` children) is
//! handled by [`ConverterRegistry`]; each [`DependencyConverter`] only reads and writes
//! its variant's payload.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::{Arc, OnceLock};

use paramdep_model::{
    DependeeArity, Dependency, DependencyKind, EntryKey, NumberFunction, NumberKind, Validator,
    ValueRange,
};
use tracing::debug;

use crate::conditions::{
    CONDITION_TAG, FUNCTION_TAG, condition_from_xml, condition_to_xml, function_from_xml,
    function_to_xml, split_kind, string_values_from_xml, string_values_to_xml,
};
use crate::element::XmlElement;
use crate::error::{Reference, Result, XmlError};
use crate::ids::{EntryIdMap, IdToEntryMap, IdToValidatorMap, ValidatorIdMap};

pub const DEPENDENCY_TAG: &str = "Dependency";
pub const DEPENDENCIES_TAG: &str = "Dependencies";
const DEPENDEE_TAG: &str = "Dependee";
const DEPENDENT_TAG: &str = "Dependent";
const VALUES_AND_VALIDATORS_TAG: &str = "ValuesAndValidators";
const RANGES_AND_VALIDATORS_TAG: &str = "RangesAndValidators";
const DEFAULT_VALIDATOR_TAG: &str = "DefaultValidator";
const TRUE_VALIDATOR_TAG: &str = "TrueValidator";
const FALSE_VALIDATOR_TAG: &str = "FalseValidator";
const PAIR_TAG: &str = "Pair";

/// What a converter sees while writing one dependency.
pub struct WriteContext<'a> {
    entries: &'a EntryIdMap,
    validators: &'a ValidatorIdMap,
    dependency_type: &'static str,
}

impl WriteContext<'_> {
    pub fn dependency_type(&self) -> &'static str {
        self.dependency_type
    }

    pub fn entries(&self) -> &EntryIdMap {
        self.entries
    }

    pub fn validator_id(&self, validator: &Arc<Validator>) -> Result<u32> {
        self.validators
            .id(validator)
            .ok_or_else(|| XmlError::MissingValidator {
                dependency_type: self.dependency_type.to_string(),
                reference: Reference::Validator(validator.to_string()),
            })
    }

    /// `<tag validatorId="…"/>`
    pub fn validator_ref(&self, tag: &str, validator: &Arc<Validator>) -> Result<XmlElement> {
        Ok(XmlElement::new(tag).with_attribute("validatorId", self.validator_id(validator)?))
    }
}

/// What a converter sees while reading one dependency.
///
/// Dependees are already resolved and checked against the converter's arity.
pub struct ReadContext<'a> {
    entries: &'a IdToEntryMap,
    validators: &'a IdToValidatorMap,
    dependency_type: &'a str,
    dependees: Vec<EntryKey>,
}

impl ReadContext<'_> {
    pub fn dependency_type(&self) -> &str {
        self.dependency_type
    }

    pub fn entries(&self) -> &IdToEntryMap {
        self.entries
    }

    pub fn dependees(&self) -> &[EntryKey] {
        &self.dependees
    }

    /// The single dependee of a fixed-arity dependency.
    pub fn dependee(&self) -> Result<EntryKey> {
        self.dependees
            .first()
            .copied()
            .ok_or_else(|| XmlError::MissingDependees {
                dependency_type: self.dependency_type.to_string(),
            })
    }

    /// Number kind from a `Name(kind)` type tag.
    pub fn number_kind(&self) -> Result<NumberKind> {
        split_kind(self.dependency_type)
            .map(|(_, kind)| kind)
            .ok_or_else(|| XmlError::UnknownDependencyType {
                type_name: self.dependency_type.to_string(),
            })
    }

    pub fn validator(&self, id: u32) -> Result<Arc<Validator>> {
        self.validators
            .get(id)
            .cloned()
            .ok_or_else(|| XmlError::MissingValidator {
                dependency_type: self.dependency_type.to_string(),
                reference: Reference::Id(id),
            })
    }

    /// Resolve the `validatorId` attribute of `element`.
    pub fn validator_ref(&self, element: &XmlElement) -> Result<Arc<Validator>> {
        self.validator(element.parse_attribute("validatorId")?)
    }

    /// Resolve the optional `<tag validatorId/>` child of `parent`.
    pub fn optional_validator(
        &self,
        parent: &XmlElement,
        tag: &str,
    ) -> Result<Option<Arc<Validator>>> {
        parent
            .child(tag)
            .map(|child| self.validator_ref(child))
            .transpose()
    }

    fn optional_function(
        &self,
        element: &XmlElement,
        kind: NumberKind,
    ) -> Result<Option<NumberFunction>> {
        element
            .child(FUNCTION_TAG)
            .map(|function| function_from_xml(function, kind))
            .transpose()
    }
}

/// Reads and writes the payload of one or more dependency type tags.
pub trait DependencyConverter: Send + Sync {
    /// Type tags handled by this converter.
    fn type_names(&self) -> &'static [&'static str];

    fn arity(&self) -> DependeeArity {
        DependeeArity::Exactly(1)
    }

    /// Add variant attributes and children to an element whose envelope is
    /// already written.
    fn write_body(
        &self,
        kind: &DependencyKind,
        element: &mut XmlElement,
        context: &WriteContext<'_>,
    ) -> Result<()>;

    /// Rebuild the kind from an element whose envelope is already resolved.
    fn read_kind(&self, element: &XmlElement, context: &ReadContext<'_>) -> Result<DependencyKind>;
}

fn show_if(element: &XmlElement) -> Result<bool> {
    Ok(element.parse_optional_attribute("showIf")?.unwrap_or(true))
}

fn unsupported(context: &WriteContext<'_>) -> XmlError {
    XmlError::UnknownDependencyType {
        type_name: context.dependency_type.to_string(),
    }
}

struct BoolVisualConverter;

impl DependencyConverter for BoolVisualConverter {
    fn type_names(&self) -> &'static [&'static str] {
        &["BoolVisualDependency"]
    }

    fn write_body(
        &self,
        kind: &DependencyKind,
        _: &mut XmlElement,
        context: &WriteContext<'_>,
    ) -> Result<()> {
        match kind {
            DependencyKind::BoolVisual { .. } => Ok(()),
            _ => Err(unsupported(context)),
        }
    }

    fn read_kind(&self, element: &XmlElement, context: &ReadContext<'_>) -> Result<DependencyKind> {
        Ok(DependencyKind::BoolVisual {
            dependee: context.dependee()?,
            show_if: show_if(element)?,
        })
    }
}

struct StringVisualConverter;

impl DependencyConverter for StringVisualConverter {
    fn type_names(&self) -> &'static [&'static str] {
        &["StringVisualDependency"]
    }

    fn write_body(
        &self,
        kind: &DependencyKind,
        element: &mut XmlElement,
        context: &WriteContext<'_>,
    ) -> Result<()> {
        let DependencyKind::StringVisual { values, .. } = kind else {
            return Err(unsupported(context));
        };
        element.push_child(string_values_to_xml(values));
        Ok(())
    }

    fn read_kind(&self, element: &XmlElement, context: &ReadContext<'_>) -> Result<DependencyKind> {
        Ok(DependencyKind::StringVisual {
            dependee: context.dependee()?,
            values: string_values_from_xml(element, context.dependency_type())?,
            show_if: show_if(element)?,
        })
    }
}

struct NumberVisualConverter;

impl DependencyConverter for NumberVisualConverter {
    fn type_names(&self) -> &'static [&'static str] {
        &["NumberVisualDependency(int)", "NumberVisualDependency(double)"]
    }

    fn write_body(
        &self,
        kind: &DependencyKind,
        element: &mut XmlElement,
        context: &WriteContext<'_>,
    ) -> Result<()> {
        let DependencyKind::NumberVisual { function, .. } = kind else {
            return Err(unsupported(context));
        };
        if let Some(function) = function {
            element.push_child(function_to_xml(function));
        }
        Ok(())
    }

    fn read_kind(&self, element: &XmlElement, context: &ReadContext<'_>) -> Result<DependencyKind> {
        let kind = context.number_kind()?;
        Ok(DependencyKind::NumberVisual {
            dependee: context.dependee()?,
            kind,
            function: context.optional_function(element, kind)?,
            show_if: show_if(element)?,
        })
    }
}

struct ConditionVisualConverter;

impl DependencyConverter for ConditionVisualConverter {
    fn type_names(&self) -> &'static [&'static str] {
        &["ConditionVisualDependency"]
    }

    fn arity(&self) -> DependeeArity {
        DependeeArity::FromCondition
    }

    fn write_body(
        &self,
        kind: &DependencyKind,
        element: &mut XmlElement,
        context: &WriteContext<'_>,
    ) -> Result<()> {
        let DependencyKind::ConditionVisual { condition, .. } = kind else {
            return Err(unsupported(context));
        };
        element.push_child(condition_to_xml(
            condition,
            context.entries(),
            context.dependency_type(),
        )?);
        Ok(())
    }

    fn read_kind(&self, element: &XmlElement, context: &ReadContext<'_>) -> Result<DependencyKind> {
        let dependency_type = context.dependency_type();
        let condition_element =
            element
                .child(CONDITION_TAG)
                .ok_or_else(|| XmlError::MissingConditionTag {
                    dependency_type: dependency_type.to_string(),
                })?;
        let condition = condition_from_xml(condition_element, context.entries(), dependency_type)?;
        let declared: BTreeSet<EntryKey> = context.dependees().iter().copied().collect();
        let derived = condition.entries();
        if declared != derived {
            let ids = |keys: &BTreeSet<EntryKey>| {
                keys.iter()
                    .filter_map(|key| context.entries().id_of(*key))
                    .map(|id| id.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            return Err(XmlError::ConditionDependeeMismatch {
                dependency_type: dependency_type.to_string(),
                declared: ids(&declared),
                derived: ids(&derived),
            });
        }
        Ok(DependencyKind::ConditionVisual {
            condition: Arc::new(condition),
            show_if: show_if(element)?,
        })
    }
}

struct BoolValidatorConverter;

impl DependencyConverter for BoolValidatorConverter {
    fn type_names(&self) -> &'static [&'static str] {
        &["BoolValidatorDependency"]
    }

    fn write_body(
        &self,
        kind: &DependencyKind,
        element: &mut XmlElement,
        context: &WriteContext<'_>,
    ) -> Result<()> {
        let DependencyKind::BoolValidator {
            true_validator,
            false_validator,
            ..
        } = kind
        else {
            return Err(unsupported(context));
        };
        if let Some(validator) = true_validator {
            element.push_child(context.validator_ref(TRUE_VALIDATOR_TAG, validator)?);
        }
        if let Some(validator) = false_validator {
            element.push_child(context.validator_ref(FALSE_VALIDATOR_TAG, validator)?);
        }
        Ok(())
    }

    fn read_kind(&self, element: &XmlElement, context: &ReadContext<'_>) -> Result<DependencyKind> {
        Ok(DependencyKind::BoolValidator {
            dependee: context.dependee()?,
            true_validator: context.optional_validator(element, TRUE_VALIDATOR_TAG)?,
            false_validator: context.optional_validator(element, FALSE_VALIDATOR_TAG)?,
        })
    }
}

struct StringValidatorConverter;

impl DependencyConverter for StringValidatorConverter {
    fn type_names(&self) -> &'static [&'static str] {
        &["StringValidatorDependency"]
    }

    fn write_body(
        &self,
        kind: &DependencyKind,
        element: &mut XmlElement,
        context: &WriteContext<'_>,
    ) -> Result<()> {
        let DependencyKind::StringValidator {
            validators,
            default_validator,
            ..
        } = kind
        else {
            return Err(unsupported(context));
        };
        let mut pairs = XmlElement::new(VALUES_AND_VALIDATORS_TAG);
        for (value, validator) in validators {
            pairs.push_child(
                context
                    .validator_ref(PAIR_TAG, validator)?
                    .with_attribute("value", value),
            );
        }
        element.push_child(pairs);
        if let Some(validator) = default_validator {
            element.push_child(context.validator_ref(DEFAULT_VALIDATOR_TAG, validator)?);
        }
        Ok(())
    }

    fn read_kind(&self, element: &XmlElement, context: &ReadContext<'_>) -> Result<DependencyKind> {
        let pairs = element.child(VALUES_AND_VALIDATORS_TAG).ok_or_else(|| {
            XmlError::MissingValuesAndValidatorsTag {
                dependency_type: context.dependency_type().to_string(),
            }
        })?;
        let mut validators = BTreeMap::new();
        for pair in pairs.children_named(PAIR_TAG) {
            let value = pair.require_attribute("value")?;
            if validators.contains_key(value) {
                return Err(pair.invalid_attribute("value", value, "value listed twice"));
            }
            validators.insert(value.to_string(), context.validator_ref(pair)?);
        }
        Ok(DependencyKind::StringValidator {
            dependee: context.dependee()?,
            validators,
            default_validator: context.optional_validator(element, DEFAULT_VALIDATOR_TAG)?,
        })
    }
}

struct RangeValidatorConverter;

impl DependencyConverter for RangeValidatorConverter {
    fn type_names(&self) -> &'static [&'static str] {
        &["RangeValidatorDependency(int)", "RangeValidatorDependency(double)"]
    }

    fn write_body(
        &self,
        kind: &DependencyKind,
        element: &mut XmlElement,
        context: &WriteContext<'_>,
    ) -> Result<()> {
        let DependencyKind::RangeValidator {
            ranges,
            default_validator,
            ..
        } = kind
        else {
            return Err(unsupported(context));
        };
        let mut pairs = XmlElement::new(RANGES_AND_VALIDATORS_TAG);
        for (range, validator) in ranges {
            pairs.push_child(
                context
                    .validator_ref(PAIR_TAG, validator)?
                    .with_attribute("min", range.min())
                    .with_attribute("max", range.max()),
            );
        }
        element.push_child(pairs);
        if let Some(validator) = default_validator {
            element.push_child(context.validator_ref(DEFAULT_VALIDATOR_TAG, validator)?);
        }
        Ok(())
    }

    fn read_kind(&self, element: &XmlElement, context: &ReadContext<'_>) -> Result<DependencyKind> {
        let pairs = element.child(RANGES_AND_VALIDATORS_TAG).ok_or_else(|| {
            XmlError::MissingRangesAndValidatorsTag {
                dependency_type: context.dependency_type().to_string(),
            }
        })?;
        let ranges = pairs
            .children_named(PAIR_TAG)
            .map(|pair| {
                let range =
                    ValueRange::new(pair.parse_attribute("min")?, pair.parse_attribute("max")?)?;
                Ok((range, context.validator_ref(pair)?))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(DependencyKind::RangeValidator {
            dependee: context.dependee()?,
            kind: context.number_kind()?,
            ranges,
            default_validator: context.optional_validator(element, DEFAULT_VALIDATOR_TAG)?,
        })
    }
}

struct NumberArrayLengthConverter;

impl DependencyConverter for NumberArrayLengthConverter {
    fn type_names(&self) -> &'static [&'static str] {
        &[
            "NumberArrayLengthDependency(int)",
            "NumberArrayLengthDependency(double)",
        ]
    }

    fn write_body(
        &self,
        kind: &DependencyKind,
        element: &mut XmlElement,
        context: &WriteContext<'_>,
    ) -> Result<()> {
        let DependencyKind::NumberArrayLength { function, .. } = kind else {
            return Err(unsupported(context));
        };
        if let Some(function) = function {
            element.push_child(function_to_xml(function));
        }
        Ok(())
    }

    fn read_kind(&self, element: &XmlElement, context: &ReadContext<'_>) -> Result<DependencyKind> {
        let kind = context.number_kind()?;
        Ok(DependencyKind::NumberArrayLength {
            dependee: context.dependee()?,
            kind,
            function: context.optional_function(element, kind)?,
        })
    }
}

/// Type tag → converter table, used in both directions.
///
/// Build it once and share it; [`ConverterRegistry::standard`] covers every
/// dependency kind.
#[derive(Clone, Default)]
pub struct ConverterRegistry {
    converters: BTreeMap<String, Arc<dyn DependencyConverter>>,
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.converters.keys()).finish()
    }
}

impl ConverterRegistry {
    /// A registry without converters.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every standard converter, ready to extend.
    pub fn with_standard_converters() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(BoolVisualConverter));
        registry.register(Arc::new(StringVisualConverter));
        registry.register(Arc::new(NumberVisualConverter));
        registry.register(Arc::new(ConditionVisualConverter));
        registry.register(Arc::new(BoolValidatorConverter));
        registry.register(Arc::new(StringValidatorConverter));
        registry.register(Arc::new(RangeValidatorConverter));
        registry.register(Arc::new(NumberArrayLengthConverter));
        registry
    }

    /// Process-wide standard registry, built on first use.
    pub fn standard() -> &'static ConverterRegistry {
        static STANDARD: OnceLock<ConverterRegistry> = OnceLock::new();
        STANDARD.get_or_init(Self::with_standard_converters)
    }

    /// Register `converter` under each of its type names, replacing earlier entries.
    pub fn register(&mut self, converter: Arc<dyn DependencyConverter>) {
        for name in converter.type_names() {
            self.converters
                .insert((*name).to_string(), Arc::clone(&converter));
        }
    }

    pub fn get(&self, type_name: &str) -> Option<&dyn DependencyConverter> {
        self.converters.get(type_name).map(AsRef::as_ref)
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.converters.keys().map(String::as_str)
    }

    fn converter(&self, type_name: &str) -> Result<&dyn DependencyConverter> {
        self.get(type_name)
            .ok_or_else(|| XmlError::UnknownDependencyType {
                type_name: type_name.to_string(),
            })
    }

    /// Encode one dependency. Every entry and validator it references needs an ID.
    pub fn convert_dependency(
        &self,
        dependency: &Dependency,
        entries: &EntryIdMap,
        validators: &ValidatorIdMap,
    ) -> Result<XmlElement> {
        let dependency_type = dependency.type_tag();
        let converter = self.converter(dependency_type)?;
        let mut element = XmlElement::new(DEPENDENCY_TAG).with_attribute("type", dependency_type);
        if let Some(show_if) = dependency.show_if() {
            element.set_attribute("showIf", show_if);
        }
        for dependee in dependency.dependees() {
            let id = entries.id(dependee).ok_or_else(|| XmlError::MissingDependee {
                dependency_type: dependency_type.to_string(),
                reference: Reference::Entry(dependee.to_string()),
            })?;
            element.push_child(XmlElement::new(DEPENDEE_TAG).with_attribute("parameterId", id));
        }
        for dependent in dependency.dependents() {
            let id = entries.id(*dependent).ok_or_else(|| XmlError::MissingDependent {
                dependency_type: dependency_type.to_string(),
                reference: Reference::Entry(dependent.to_string()),
            })?;
            element.push_child(XmlElement::new(DEPENDENT_TAG).with_attribute("parameterId", id));
        }
        let context = WriteContext {
            entries,
            validators,
            dependency_type,
        };
        converter.write_body(dependency.kind(), &mut element, &context)?;
        Ok(element)
    }

    /// Decode one `<Dependency>` against ID maps from an earlier load.
    ///
    /// Nothing is constructed unless every reference resolves.
    pub fn convert_xml(
        &self,
        element: &XmlElement,
        entries: &IdToEntryMap,
        validators: &IdToValidatorMap,
    ) -> Result<Dependency> {
        element.expect_tag(DEPENDENCY_TAG)?;
        let dependency_type = element.require_attribute("type")?;
        let converter = self.converter(dependency_type)?;

        let dependee_ids = reference_ids(element, DEPENDEE_TAG)?;
        if dependee_ids.is_empty() {
            return Err(XmlError::MissingDependees {
                dependency_type: dependency_type.to_string(),
            });
        }
        if let DependeeArity::Exactly(allowed) = converter.arity()
            && dependee_ids.len() > allowed
        {
            return Err(XmlError::TooManyDependees {
                dependency_type: dependency_type.to_string(),
                found: dependee_ids.len(),
                allowed,
            });
        }
        let dependees = dependee_ids
            .iter()
            .map(|id| {
                entries.get(*id).ok_or_else(|| XmlError::MissingDependee {
                    dependency_type: dependency_type.to_string(),
                    reference: Reference::Id(*id),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let dependent_ids = reference_ids(element, DEPENDENT_TAG)?;
        if dependent_ids.is_empty() {
            return Err(XmlError::MissingDependents {
                dependency_type: dependency_type.to_string(),
            });
        }
        let dependents = dependent_ids
            .iter()
            .map(|id| {
                entries.get(*id).ok_or_else(|| XmlError::MissingDependent {
                    dependency_type: dependency_type.to_string(),
                    reference: Reference::Id(*id),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let context = ReadContext {
            entries,
            validators,
            dependency_type,
            dependees,
        };
        let kind = converter.read_kind(element, &context)?;
        let dependency = Dependency::new(kind, dependents)?;
        debug!(
            dependency_type,
            dependents = dependency.dependents().len(),
            "decoded dependency"
        );
        Ok(dependency)
    }
}

fn reference_ids(element: &XmlElement, tag: &'static str) -> Result<Vec<u32>> {
    element
        .children_named(tag)
        .map(|child| child.parse_attribute("parameterId"))
        .collect()
}
