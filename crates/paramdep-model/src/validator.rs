//! Value validators.
//!
//! Validators are stateless: they never look at an entry, only at a candidate
//! value. They are shared through `Arc` by entries and dependencies alike.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::error::{ModelError, Result};
use crate::value::{EntryValue, NumberKind};

/// Accepts or rejects candidate values.
#[derive(Debug, Clone, PartialEq)]
pub enum Validator {
    /// Numeric bounds, inclusive on both ends.
    EnhancedNumber(EnhancedNumberValidator),
    /// File paths, optionally required to exist.
    FileName(FileNameValidator),
    /// Strings drawn from a fixed list.
    StringEnumeration(StringEnumerationValidator),
    /// Arrays whose every element passes a prototype validator.
    Array(ArrayValidator),
}

impl Validator {
    /// Tag used for serialization dispatch.
    pub fn type_tag(&self) -> &'static str {
        match self {
            Validator::EnhancedNumber(validator) => match validator.kind {
                NumberKind::Int => "EnhancedNumberValidator(int)",
                NumberKind::Double => "EnhancedNumberValidator(double)",
            },
            Validator::FileName(_) => "FileNameValidator",
            Validator::StringEnumeration(_) => "StringValidator",
            Validator::Array(_) => "ArrayValidator",
        }
    }

    pub fn accepts(&self, value: &EntryValue) -> bool {
        match self {
            Validator::EnhancedNumber(validator) => validator.accepts(value),
            Validator::FileName(validator) => validator.accepts(value),
            Validator::StringEnumeration(validator) => validator.accepts(value),
            Validator::Array(validator) => validator.accepts(value),
        }
    }
}

impl fmt::Display for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Validator::EnhancedNumber(validator) => {
                write!(f, "{} in [{}, {}]", validator.kind, validator.min, validator.max)
            }
            Validator::FileName(validator) if validator.must_already_exist => {
                f.write_str("existing file")
            }
            Validator::FileName(_) => f.write_str("file name"),
            Validator::StringEnumeration(validator) => {
                write!(f, "one of {}", validator.values.join("|"))
            }
            Validator::Array(validator) => write!(f, "each {}", validator.prototype),
        }
    }
}

impl From<EnhancedNumberValidator> for Validator {
    fn from(validator: EnhancedNumberValidator) -> Self {
        Validator::EnhancedNumber(validator)
    }
}

impl From<FileNameValidator> for Validator {
    fn from(validator: FileNameValidator) -> Self {
        Validator::FileName(validator)
    }
}

impl From<StringEnumerationValidator> for Validator {
    fn from(validator: StringEnumerationValidator) -> Self {
        Validator::StringEnumeration(validator)
    }
}

impl From<ArrayValidator> for Validator {
    fn from(validator: ArrayValidator) -> Self {
        Validator::Array(validator)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnhancedNumberValidator {
    kind: NumberKind,
    min: f64,
    max: f64,
    step: f64,
    precision: u32,
}

impl EnhancedNumberValidator {
    /// Bounds must be ordered; integer validators need integral bounds.
    pub fn new(kind: NumberKind, min: f64, max: f64) -> Result<Self> {
        if min.is_nan() || max.is_nan() || min > max {
            return Err(ModelError::InvalidRange {
                min,
                max,
                reason: "minimum must not exceed maximum",
            });
        }
        if kind == NumberKind::Int && (min.fract() != 0.0 || max.fract() != 0.0) {
            return Err(ModelError::InvalidRange {
                min,
                max,
                reason: "integer bounds must be integral",
            });
        }
        Ok(Self {
            kind,
            min,
            max,
            step: 1.0,
            precision: 0,
        })
    }

    #[must_use]
    pub fn with_step(mut self, step: f64) -> Self {
        self.step = step;
        self
    }

    #[must_use]
    pub fn with_precision(mut self, precision: u32) -> Self {
        self.precision = precision;
        self
    }

    pub fn kind(&self) -> NumberKind {
        self.kind
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn precision(&self) -> u32 {
        self.precision
    }

    pub fn accepts(&self, value: &EntryValue) -> bool {
        value
            .as_number(self.kind)
            .map(|number| number.as_f64())
            .is_some_and(|number| self.min <= number && number <= self.max)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileNameValidator {
    must_already_exist: bool,
}

impl FileNameValidator {
    pub fn new(must_already_exist: bool) -> Self {
        Self { must_already_exist }
    }

    pub fn must_already_exist(&self) -> bool {
        self.must_already_exist
    }

    pub fn accepts(&self, value: &EntryValue) -> bool {
        match value.as_str() {
            Some(path) if self.must_already_exist => Path::new(path).exists(),
            Some(_) => true,
            None => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringEnumerationValidator {
    values: Vec<String>,
}

impl StringEnumerationValidator {
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn accepts(&self, value: &EntryValue) -> bool {
        value
            .as_str()
            .is_some_and(|text| self.values.iter().any(|allowed| allowed == text))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayValidator {
    prototype: Arc<Validator>,
}

impl ArrayValidator {
    pub fn new(prototype: Arc<Validator>) -> Self {
        Self { prototype }
    }

    pub fn prototype(&self) -> &Arc<Validator> {
        &self.prototype
    }

    pub fn accepts(&self, value: &EntryValue) -> bool {
        value.as_array().is_some_and(|array| {
            array
                .scalars()
                .iter()
                .all(|element| self.prototype.accepts(element))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_bounds_are_inclusive() {
        let validator = EnhancedNumberValidator::new(NumberKind::Double, 0.0, 10.0).unwrap();
        assert!(validator.accepts(&EntryValue::Double(0.0)));
        assert!(validator.accepts(&EntryValue::Double(10.0)));
        assert!(!validator.accepts(&EntryValue::Double(10.01)));
        assert!(!validator.accepts(&EntryValue::Int(5)));
    }

    #[test]
    fn integer_validator_needs_integral_bounds() {
        let err = EnhancedNumberValidator::new(NumberKind::Int, 0.0, 2.5).unwrap_err();
        assert!(matches!(err, ModelError::InvalidRange { .. }));
    }

    #[test]
    fn file_name_validator_checks_existence() {
        let dir = tempfile::tempdir().unwrap();
        let existing = dir.path().join("mesh.exo");
        std::fs::write(&existing, b"").unwrap();
        let validator = FileNameValidator::new(true);
        assert!(validator.accepts(&EntryValue::from(existing.to_string_lossy().as_ref())));
        assert!(!validator.accepts(&EntryValue::from(
            dir.path().join("missing.exo").to_string_lossy().as_ref()
        )));
        assert!(FileNameValidator::new(false).accepts(&EntryValue::from("anything")));
    }

    #[test]
    fn array_validator_checks_every_element() {
        let prototype = Arc::new(Validator::from(
            EnhancedNumberValidator::new(NumberKind::Int, 1.0, 3.0).unwrap(),
        ));
        let validator = ArrayValidator::new(prototype);
        assert!(validator.accepts(&EntryValue::from(vec![1_i64, 2, 3])));
        assert!(!validator.accepts(&EntryValue::from(vec![1_i64, 4])));
        assert!(!validator.accepts(&EntryValue::Int(2)));
    }

    #[test]
    fn type_tags_follow_number_kind() {
        let int = Validator::from(EnhancedNumberValidator::new(NumberKind::Int, 0.0, 1.0).unwrap());
        assert_eq!(int.type_tag(), "EnhancedNumberValidator(int)");
        assert_eq!(
            Validator::from(StringEnumerationValidator::new(["a"])).type_tag(),
            "StringValidator"
        );
    }
}
