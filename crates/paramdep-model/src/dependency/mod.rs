//! Dependencies: rules linking dependee entries to dependent entries.
//!
//! A dependency's [`DependencyKind`] decides its effect:
//!
//! - **Visual** kinds decide whether each dependent is shown.
//! - **Validator** kinds pick the validator that currently constrains each dependent.
//! - The **structural** array-length kind answers how long dependent arrays should be.
//!
//! Every kind except `ConditionVisual` reads exactly one dependee. A condition
//! dependency reads whatever entries its condition reads.

mod eval;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::condition::Condition;
use crate::error::{ModelError, Result};
use crate::function::NumberFunction;
use crate::list::EntryKey;
use crate::validator::Validator;
use crate::value::NumberKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencyFamily {
    Visual,
    Validator,
    Structural,
}

/// How many dependees a kind may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependeeArity {
    Exactly(usize),
    /// Derived from the entries a condition reads.
    FromCondition,
}

/// Closed numeric interval `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueRange {
    min: f64,
    max: f64,
}

impl ValueRange {
    pub fn new(min: f64, max: f64) -> Result<Self> {
        if min.is_nan() || max.is_nan() || min > max {
            return Err(ModelError::InvalidRange {
                min,
                max,
                reason: "minimum must not exceed maximum",
            });
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }

    fn overlaps(&self, other: &ValueRange) -> bool {
        self.min <= other.max && other.min <= self.max
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DependencyKind {
    BoolVisual {
        dependee: EntryKey,
        show_if: bool,
    },
    StringVisual {
        dependee: EntryKey,
        values: Vec<String>,
        show_if: bool,
    },
    NumberVisual {
        dependee: EntryKey,
        kind: NumberKind,
        function: Option<NumberFunction>,
        show_if: bool,
    },
    ConditionVisual {
        condition: Arc<Condition>,
        show_if: bool,
    },
    BoolValidator {
        dependee: EntryKey,
        true_validator: Option<Arc<Validator>>,
        false_validator: Option<Arc<Validator>>,
    },
    StringValidator {
        dependee: EntryKey,
        validators: BTreeMap<String, Arc<Validator>>,
        default_validator: Option<Arc<Validator>>,
    },
    /// Ranges are kept sorted by lower bound and never overlap.
    RangeValidator {
        dependee: EntryKey,
        kind: NumberKind,
        ranges: Vec<(ValueRange, Arc<Validator>)>,
        default_validator: Option<Arc<Validator>>,
    },
    NumberArrayLength {
        dependee: EntryKey,
        kind: NumberKind,
        function: Option<NumberFunction>,
    },
}

impl DependencyKind {
    pub fn type_tag(&self) -> &'static str {
        match self {
            DependencyKind::BoolVisual { .. } => "BoolVisualDependency",
            DependencyKind::StringVisual { .. } => "StringVisualDependency",
            DependencyKind::NumberVisual { kind, .. } => match kind {
                NumberKind::Int => "NumberVisualDependency(int)",
                NumberKind::Double => "NumberVisualDependency(double)",
            },
            DependencyKind::ConditionVisual { .. } => "ConditionVisualDependency",
            DependencyKind::BoolValidator { .. } => "BoolValidatorDependency",
            DependencyKind::StringValidator { .. } => "StringValidatorDependency",
            DependencyKind::RangeValidator { kind, .. } => match kind {
                NumberKind::Int => "RangeValidatorDependency(int)",
                NumberKind::Double => "RangeValidatorDependency(double)",
            },
            DependencyKind::NumberArrayLength { kind, .. } => match kind {
                NumberKind::Int => "NumberArrayLengthDependency(int)",
                NumberKind::Double => "NumberArrayLengthDependency(double)",
            },
        }
    }

    pub fn family(&self) -> DependencyFamily {
        match self {
            DependencyKind::BoolVisual { .. }
            | DependencyKind::StringVisual { .. }
            | DependencyKind::NumberVisual { .. }
            | DependencyKind::ConditionVisual { .. } => DependencyFamily::Visual,
            DependencyKind::BoolValidator { .. }
            | DependencyKind::StringValidator { .. }
            | DependencyKind::RangeValidator { .. } => DependencyFamily::Validator,
            DependencyKind::NumberArrayLength { .. } => DependencyFamily::Structural,
        }
    }

    pub fn arity(&self) -> DependeeArity {
        match self {
            DependencyKind::ConditionVisual { .. } => DependeeArity::FromCondition,
            _ => DependeeArity::Exactly(1),
        }
    }

    /// The single dependee, for every kind but `ConditionVisual`.
    pub fn dependee(&self) -> Option<EntryKey> {
        match self {
            DependencyKind::BoolVisual { dependee, .. }
            | DependencyKind::StringVisual { dependee, .. }
            | DependencyKind::NumberVisual { dependee, .. }
            | DependencyKind::BoolValidator { dependee, .. }
            | DependencyKind::StringValidator { dependee, .. }
            | DependencyKind::RangeValidator { dependee, .. }
            | DependencyKind::NumberArrayLength { dependee, .. } => Some(*dependee),
            DependencyKind::ConditionVisual { .. } => None,
        }
    }

    pub fn show_if(&self) -> Option<bool> {
        match self {
            DependencyKind::BoolVisual { show_if, .. }
            | DependencyKind::StringVisual { show_if, .. }
            | DependencyKind::NumberVisual { show_if, .. }
            | DependencyKind::ConditionVisual { show_if, .. } => Some(*show_if),
            _ => None,
        }
    }

    /// Every validator the kind references, in serialization order.
    pub fn validators(&self) -> Vec<&Arc<Validator>> {
        match self {
            DependencyKind::BoolValidator {
                true_validator,
                false_validator,
                ..
            } => true_validator.iter().chain(false_validator.iter()).collect(),
            DependencyKind::StringValidator {
                validators,
                default_validator,
                ..
            } => validators
                .values()
                .chain(default_validator.iter())
                .collect(),
            DependencyKind::RangeValidator {
                ranges,
                default_validator,
                ..
            } => ranges
                .iter()
                .map(|(_, validator)| validator)
                .chain(default_validator.iter())
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// A validated rule: a kind plus a non-empty set of dependents.
#[derive(Debug, Clone, PartialEq)]
pub struct Dependency {
    kind: DependencyKind,
    dependents: BTreeSet<EntryKey>,
}

impl Dependency {
    /// Build a dependency, checking the invariants every kind shares.
    ///
    /// Range validator ranges are sorted by lower bound; overlapping ranges are
    /// rejected with [`ModelError::OverlappingRanges`].
    pub fn new(kind: DependencyKind, dependents: impl IntoIterator<Item = EntryKey>) -> Result<Self> {
        let dependents: BTreeSet<EntryKey> = dependents.into_iter().collect();
        let dependency_type = kind.type_tag();
        if dependents.is_empty() {
            return Err(ModelError::EmptyDependents { dependency_type });
        }
        let kind = normalize(kind)?;
        Ok(Self { kind, dependents })
    }

    pub fn kind(&self) -> &DependencyKind {
        &self.kind
    }

    pub fn type_tag(&self) -> &'static str {
        self.kind.type_tag()
    }

    pub fn family(&self) -> DependencyFamily {
        self.kind.family()
    }

    pub fn dependents(&self) -> &BTreeSet<EntryKey> {
        &self.dependents
    }

    pub fn has_dependent(&self, entry: EntryKey) -> bool {
        self.dependents.contains(&entry)
    }

    pub fn dependees(&self) -> BTreeSet<EntryKey> {
        match &self.kind {
            DependencyKind::ConditionVisual { condition, .. } => condition.entries(),
            kind => kind.dependee().into_iter().collect(),
        }
    }

    pub fn show_if(&self) -> Option<bool> {
        self.kind.show_if()
    }
}

fn normalize(kind: DependencyKind) -> Result<DependencyKind> {
    let dependency_type = kind.type_tag();
    match kind {
        DependencyKind::NumberVisual {
            kind: number_kind,
            function: Some(function),
            ..
        }
        | DependencyKind::NumberArrayLength {
            kind: number_kind,
            function: Some(function),
            ..
        } => {
            function.ensure_kind(number_kind)?;
            Ok(kind)
        }
        DependencyKind::ConditionVisual { ref condition, .. } if condition.entries().is_empty() => {
            Err(ModelError::EmptyDependees { dependency_type })
        }
        DependencyKind::RangeValidator {
            dependee,
            kind: number_kind,
            mut ranges,
            default_validator,
        } => {
            ranges.sort_by(|(a, _), (b, _)| a.min.total_cmp(&b.min));
            for (range, _) in &ranges {
                if number_kind == NumberKind::Int
                    && (range.min.fract() != 0.0 || range.max.fract() != 0.0)
                {
                    return Err(ModelError::InvalidRange {
                        min: range.min,
                        max: range.max,
                        reason: "integer ranges need integral bounds",
                    });
                }
            }
            for pair in ranges.windows(2) {
                let (first, second) = (&pair[0].0, &pair[1].0);
                if first.overlaps(second) {
                    return Err(ModelError::OverlappingRanges {
                        first_min: first.min,
                        first_max: first.max,
                        second_min: second.min,
                        second_max: second.max,
                    });
                }
            }
            Ok(DependencyKind::RangeValidator {
                dependee,
                kind: number_kind,
                ranges,
                default_validator,
            })
        }
        kind => Ok(kind),
    }
}
