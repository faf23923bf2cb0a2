//! Error types for the rule model.

use thiserror::Error;

use crate::list::EntryKey;
use crate::value::{NumberKind, ValueType};

/// Errors raised while building or evaluating rules.
///
/// These describe programming or configuration-author mistakes (wrong value types,
/// malformed ranges). Document-format problems live in the codec crate.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum ModelError {
    /// An entry holds a value of a different type than the rule expects.
    #[error("entry '{entry}' holds a {found} value, expected {expected}")]
    TypeMismatch {
        entry: String,
        expected: ValueType,
        found: ValueType,
    },

    /// A dependency was built without dependents.
    #[error("{dependency_type} requires at least one dependent")]
    EmptyDependents { dependency_type: &'static str },

    /// A condition dependency whose condition reads no entries.
    #[error("{dependency_type} requires a condition that reads at least one entry")]
    EmptyDependees { dependency_type: &'static str },

    /// Two ranges of a range validator dependency share values.
    #[error("range [{first_min}, {first_max}] overlaps range [{second_min}, {second_max}]")]
    OverlappingRanges {
        first_min: f64,
        first_max: f64,
        second_min: f64,
        second_max: f64,
    },

    /// A range or bound pair that cannot describe an interval.
    #[error("invalid range [{min}, {max}]: {reason}")]
    InvalidRange {
        min: f64,
        max: f64,
        reason: &'static str,
    },

    /// A key that does not belong to the parameter list.
    #[error("no entry for key {key}")]
    UnknownEntry { key: EntryKey },

    /// A query about an entry the dependency does not govern.
    #[error("entry '{entry}' is not a dependent of this {dependency_type}")]
    NotADependent {
        entry: String,
        dependency_type: &'static str,
    },

    /// A visibility query on a validator dependency, or the reverse.
    #[error("{dependency_type} does not answer {query} queries")]
    WrongFamily {
        dependency_type: &'static str,
        query: &'static str,
    },

    /// An entry name that is already taken.
    #[error("entry '{name}' already exists")]
    DuplicateEntry { name: String },

    /// Text that does not parse as the requested value type.
    #[error("cannot parse '{text}' as {value_type}")]
    InvalidValue { value_type: ValueType, text: String },

    /// A function operand that does not fit the number kind it is applied to.
    #[error("operand {operand} is not a valid {kind} operand")]
    InvalidOperand { operand: f64, kind: NumberKind },
}

pub type Result<T> = std::result::Result<T, ModelError>;
