//! Typed parameter values.
//!
//! Every entry in a [`ParameterList`](crate::ParameterList) carries one
//! [`EntryValue`]. The value's [`ValueType`] is fixed when the entry is created;
//! later updates must keep the same type.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Numeric flavor used by number conditions, validators and dependencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumberKind {
    Int,
    Double,
}

impl NumberKind {
    /// Name used inside type tags, e.g. `NumberVisualDependency(int)`.
    pub fn as_str(&self) -> &'static str {
        match self {
            NumberKind::Int => "int",
            NumberKind::Double => "double",
        }
    }

    /// The scalar value type holding numbers of this kind.
    pub fn value_type(&self) -> ValueType {
        match self {
            NumberKind::Int => ValueType::Int,
            NumberKind::Double => ValueType::Double,
        }
    }
}

impl fmt::Display for NumberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NumberKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "int" => Ok(NumberKind::Int),
            "double" => Ok(NumberKind::Double),
            other => Err(format!("unknown number kind: {other}")),
        }
    }
}

/// A numeric value tagged with its kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Number {
    Int(i64),
    Double(f64),
}

impl Number {
    pub fn kind(&self) -> NumberKind {
        match self {
            Number::Int(_) => NumberKind::Int,
            Number::Double(_) => NumberKind::Double,
        }
    }

    pub fn as_f64(&self) -> f64 {
        match self {
            Number::Int(value) => *value as f64,
            Number::Double(value) => *value,
        }
    }

    /// Numeric truthiness: anything but zero.
    pub fn is_truthy(&self) -> bool {
        match self {
            Number::Int(value) => *value != 0,
            Number::Double(value) => *value != 0.0,
        }
    }

    /// Parse `text` as a number of the given kind.
    pub fn parse(kind: NumberKind, text: &str) -> Result<Self> {
        let trimmed = text.trim();
        let parsed = match kind {
            NumberKind::Int => trimmed.parse::<i64>().ok().map(Number::Int),
            NumberKind::Double => trimmed.parse::<f64>().ok().map(Number::Double),
        };
        parsed.ok_or_else(|| ModelError::InvalidValue {
            value_type: kind.value_type(),
            text: text.to_string(),
        })
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(value) => write!(f, "{value}"),
            Number::Double(value) => write!(f, "{value}"),
        }
    }
}

impl From<Number> for EntryValue {
    fn from(number: Number) -> Self {
        match number {
            Number::Int(value) => EntryValue::Int(value),
            Number::Double(value) => EntryValue::Double(value),
        }
    }
}

/// The shape of an entry value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ValueType {
    Bool,
    Int,
    Double,
    String,
    BoolArray,
    IntArray,
    DoubleArray,
    StringArray,
}

impl ValueType {
    /// Stable textual form used in documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Bool => "bool",
            ValueType::Int => "int",
            ValueType::Double => "double",
            ValueType::String => "string",
            ValueType::BoolArray => "Array(bool)",
            ValueType::IntArray => "Array(int)",
            ValueType::DoubleArray => "Array(double)",
            ValueType::StringArray => "Array(string)",
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(
            self,
            ValueType::BoolArray
                | ValueType::IntArray
                | ValueType::DoubleArray
                | ValueType::StringArray
        )
    }

    /// Element type for array types, the type itself for scalars.
    pub fn element_type(&self) -> ValueType {
        match self {
            ValueType::BoolArray => ValueType::Bool,
            ValueType::IntArray => ValueType::Int,
            ValueType::DoubleArray => ValueType::Double,
            ValueType::StringArray => ValueType::String,
            scalar => *scalar,
        }
    }

    /// Parse a scalar value of this type from text.
    pub fn parse_scalar(&self, text: &str) -> Result<EntryValue> {
        let invalid = || ModelError::InvalidValue {
            value_type: *self,
            text: text.to_string(),
        };
        match self {
            ValueType::Bool => match text.trim() {
                "true" => Ok(EntryValue::Bool(true)),
                "false" => Ok(EntryValue::Bool(false)),
                _ => Err(invalid()),
            },
            ValueType::Int => Number::parse(NumberKind::Int, text).map(EntryValue::from),
            ValueType::Double => Number::parse(NumberKind::Double, text).map(EntryValue::from),
            ValueType::String => Ok(EntryValue::String(text.to_string())),
            _ => Err(invalid()),
        }
    }

    /// Parse an array value of this type from its item texts.
    pub fn parse_array<'a, I>(&self, items: I) -> Result<EntryValue>
    where
        I: IntoIterator<Item = &'a str>,
    {
        if !self.is_array() {
            return Err(ModelError::InvalidValue {
                value_type: *self,
                text: "array".to_string(),
            });
        }
        let element = self.element_type();
        let scalars = items
            .into_iter()
            .map(|item| element.parse_scalar(item))
            .collect::<Result<Vec<_>>>()?;
        let array = match element {
            ValueType::Bool => ArrayValue::Bool(
                scalars.iter().filter_map(EntryValue::as_bool).collect(),
            ),
            ValueType::Int => ArrayValue::Int(scalars.iter().filter_map(EntryValue::as_int).collect()),
            ValueType::Double => ArrayValue::Double(
                scalars.iter().filter_map(EntryValue::as_double).collect(),
            ),
            _ => ArrayValue::String(
                scalars
                    .iter()
                    .filter_map(EntryValue::as_str)
                    .map(str::to_string)
                    .collect(),
            ),
        };
        Ok(EntryValue::Array(array))
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "bool" => Ok(ValueType::Bool),
            "int" => Ok(ValueType::Int),
            "double" => Ok(ValueType::Double),
            "string" => Ok(ValueType::String),
            "Array(bool)" => Ok(ValueType::BoolArray),
            "Array(int)" => Ok(ValueType::IntArray),
            "Array(double)" => Ok(ValueType::DoubleArray),
            "Array(string)" => Ok(ValueType::StringArray),
            other => Err(format!("unknown value type: {other}")),
        }
    }
}

/// An ordered array of one primitive type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ArrayValue {
    Bool(Vec<bool>),
    Int(Vec<i64>),
    Double(Vec<f64>),
    String(Vec<String>),
}

impl ArrayValue {
    pub fn len(&self) -> usize {
        match self {
            ArrayValue::Bool(items) => items.len(),
            ArrayValue::Int(items) => items.len(),
            ArrayValue::Double(items) => items.len(),
            ArrayValue::String(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Each element as a scalar value, in order.
    pub fn scalars(&self) -> Vec<EntryValue> {
        match self {
            ArrayValue::Bool(items) => items.iter().copied().map(EntryValue::Bool).collect(),
            ArrayValue::Int(items) => items.iter().copied().map(EntryValue::Int).collect(),
            ArrayValue::Double(items) => items.iter().copied().map(EntryValue::Double).collect(),
            ArrayValue::String(items) => items.iter().cloned().map(EntryValue::String).collect(),
        }
    }

    /// Element texts as written to documents.
    pub fn item_strings(&self) -> Vec<String> {
        self.scalars().iter().map(EntryValue::to_string).collect()
    }
}

/// The value stored in a configuration entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EntryValue {
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
    Array(ArrayValue),
}

impl EntryValue {
    pub fn value_type(&self) -> ValueType {
        match self {
            EntryValue::Bool(_) => ValueType::Bool,
            EntryValue::Int(_) => ValueType::Int,
            EntryValue::Double(_) => ValueType::Double,
            EntryValue::String(_) => ValueType::String,
            EntryValue::Array(ArrayValue::Bool(_)) => ValueType::BoolArray,
            EntryValue::Array(ArrayValue::Int(_)) => ValueType::IntArray,
            EntryValue::Array(ArrayValue::Double(_)) => ValueType::DoubleArray,
            EntryValue::Array(ArrayValue::String(_)) => ValueType::StringArray,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            EntryValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            EntryValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            EntryValue::Double(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            EntryValue::String(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayValue> {
        match self {
            EntryValue::Array(array) => Some(array),
            _ => None,
        }
    }

    /// The value as a number of exactly `kind`, without conversion.
    pub fn as_number(&self, kind: NumberKind) -> Option<Number> {
        match (kind, self) {
            (NumberKind::Int, EntryValue::Int(value)) => Some(Number::Int(*value)),
            (NumberKind::Double, EntryValue::Double(value)) => Some(Number::Double(*value)),
            _ => None,
        }
    }
}

impl fmt::Display for EntryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryValue::Bool(value) => write!(f, "{value}"),
            EntryValue::Int(value) => write!(f, "{value}"),
            EntryValue::Double(value) => write!(f, "{value}"),
            EntryValue::String(value) => f.write_str(value),
            EntryValue::Array(array) => write!(f, "{{{}}}", array.item_strings().join(", ")),
        }
    }
}

impl From<bool> for EntryValue {
    fn from(value: bool) -> Self {
        EntryValue::Bool(value)
    }
}

impl From<i64> for EntryValue {
    fn from(value: i64) -> Self {
        EntryValue::Int(value)
    }
}

impl From<i32> for EntryValue {
    fn from(value: i32) -> Self {
        EntryValue::Int(i64::from(value))
    }
}

impl From<f64> for EntryValue {
    fn from(value: f64) -> Self {
        EntryValue::Double(value)
    }
}

impl From<&str> for EntryValue {
    fn from(value: &str) -> Self {
        EntryValue::String(value.to_string())
    }
}

impl From<String> for EntryValue {
    fn from(value: String) -> Self {
        EntryValue::String(value)
    }
}

impl From<Vec<bool>> for EntryValue {
    fn from(value: Vec<bool>) -> Self {
        EntryValue::Array(ArrayValue::Bool(value))
    }
}

impl From<Vec<i64>> for EntryValue {
    fn from(value: Vec<i64>) -> Self {
        EntryValue::Array(ArrayValue::Int(value))
    }
}

impl From<Vec<f64>> for EntryValue {
    fn from(value: Vec<f64>) -> Self {
        EntryValue::Array(ArrayValue::Double(value))
    }
}

impl From<Vec<String>> for EntryValue {
    fn from(value: Vec<String>) -> Self {
        EntryValue::Array(ArrayValue::String(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_type_text_is_stable() {
        for value_type in [
            ValueType::Bool,
            ValueType::Int,
            ValueType::Double,
            ValueType::String,
            ValueType::BoolArray,
            ValueType::IntArray,
            ValueType::DoubleArray,
            ValueType::StringArray,
        ] {
            assert_eq!(value_type.as_str().parse::<ValueType>(), Ok(value_type));
        }
    }

    #[test]
    fn parse_scalar_rejects_fractional_int() {
        let err = ValueType::Int.parse_scalar("10.5").unwrap_err();
        assert!(matches!(
            err,
            ModelError::InvalidValue {
                value_type: ValueType::Int,
                ..
            }
        ));
    }

    #[test]
    fn parse_array_keeps_order() {
        let value = ValueType::IntArray.parse_array(["3", "1", "2"]).unwrap();
        assert_eq!(value, EntryValue::from(vec![3_i64, 1, 2]));
    }

    #[test]
    fn double_display_round_trips() {
        for value in [5.0_f64, 0.1, -2.5e-8, 1e300] {
            let text = EntryValue::Double(value).to_string();
            assert_eq!(ValueType::Double.parse_scalar(&text), Ok(EntryValue::Double(value)));
        }
    }

    #[test]
    fn number_truthiness() {
        assert!(Number::Int(-3).is_truthy());
        assert!(!Number::Int(0).is_truthy());
        assert!(!Number::Double(0.0).is_truthy());
        assert!(Number::Double(0.25).is_truthy());
    }

    #[test]
    fn values_serialize_untagged() {
        let json = serde_json::to_string(&[
            EntryValue::Bool(true),
            EntryValue::Int(3),
            EntryValue::from("mesh.exo"),
            EntryValue::from(vec![1.5, 2.0]),
        ])
        .unwrap();
        assert_eq!(json, r#"[true,3,"mesh.exo",[1.5,2.0]]"#);
    }
}
