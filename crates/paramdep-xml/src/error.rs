//! Error types for the document codec.

use std::fmt;
use std::path::PathBuf;

use paramdep_model::ModelError;
use thiserror::Error;

/// What a failed cross-reference pointed at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    /// A document ID with no object behind it.
    Id(u32),
    /// An in-memory object with no document ID.
    Entry(String),
    Validator(String),
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reference::Id(id) => write!(f, "ID {id}"),
            Reference::Entry(name) => write!(f, "entry '{name}'"),
            Reference::Validator(description) => write!(f, "validator '{description}'"),
        }
    }
}

/// Errors raised while converting rules to or from documents.
///
/// Every variant names the dependency type, element, or ID that triggered it.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum XmlError {
    // =========================================================================
    // CROSS-REFERENCE ERRORS
    // =========================================================================
    /// A dependency element without any `Dependee` child.
    #[error("{dependency_type}: no dependees listed")]
    MissingDependees { dependency_type: String },

    /// A dependency element without any `Dependent` child.
    #[error("{dependency_type}: no dependents listed")]
    MissingDependents { dependency_type: String },

    /// A dependee that cannot be resolved.
    #[error("{dependency_type}: no dependee for {reference}")]
    MissingDependee {
        dependency_type: String,
        reference: Reference,
    },

    /// A dependent that cannot be resolved.
    #[error("{dependency_type}: no dependent for {reference}")]
    MissingDependent {
        dependency_type: String,
        reference: Reference,
    },

    /// More dependees than the dependency type accepts.
    #[error("{dependency_type}: {found} dependees listed, at most {allowed} allowed")]
    TooManyDependees {
        dependency_type: String,
        found: usize,
        allowed: usize,
    },

    /// A validator that cannot be resolved.
    #[error("{dependency_type}: no validator for {reference}")]
    MissingValidator {
        dependency_type: String,
        reference: Reference,
    },

    /// Declared dependees that differ from the entries a condition reads.
    #[error(
        "{dependency_type}: declared dependees [{declared}] differ from the condition's entries [{derived}]"
    )]
    ConditionDependeeMismatch {
        dependency_type: String,
        declared: String,
        derived: String,
    },

    /// Two objects of the same kind sharing an ID.
    #[error("duplicate {kind} ID {id}")]
    DuplicateId { kind: &'static str, id: u32 },

    // =========================================================================
    // STRUCTURE ERRORS
    // =========================================================================
    #[error("{dependency_type}: missing ValuesAndValidators element")]
    MissingValuesAndValidatorsTag { dependency_type: String },

    #[error("{dependency_type}: missing RangesAndValidators element")]
    MissingRangesAndValidatorsTag { dependency_type: String },

    #[error("{dependency_type}: missing StringValues element")]
    MissingStringValuesTag { dependency_type: String },

    #[error("{dependency_type}: missing Condition element")]
    MissingConditionTag { dependency_type: String },

    #[error("unknown dependency type '{type_name}'")]
    UnknownDependencyType { type_name: String },

    #[error("unknown condition type '{type_name}'")]
    UnknownConditionType { type_name: String },

    #[error("unknown validator type '{type_name}'")]
    UnknownValidatorType { type_name: String },

    /// A required attribute is absent.
    #[error("<{element}> is missing attribute '{attribute}'")]
    MissingAttribute {
        element: String,
        attribute: &'static str,
    },

    /// An attribute whose text does not parse.
    #[error("<{element}> attribute '{attribute}' has invalid value '{value}': {reason}")]
    InvalidAttribute {
        element: String,
        attribute: String,
        value: String,
        reason: String,
    },

    /// An element, or content, where something else was required.
    #[error("expected {expected}, found {found}")]
    UnexpectedTag { expected: String, found: String },

    // =========================================================================
    // UNDERLYING ERRORS
    // =========================================================================
    /// The rebuilt rule violates a model invariant.
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("XML syntax error: {0}")]
    Syntax(#[from] quick_xml::Error),

    #[error("XML attribute error: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),

    #[error("document is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Reading or writing a document file failed.
    #[error("failed to access {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl XmlError {
    pub(crate) fn unexpected(expected: impl Into<String>, found: impl Into<String>) -> Self {
        XmlError::UnexpectedTag {
            expected: expected.into(),
            found: found.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, XmlError>;
