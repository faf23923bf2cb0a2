//! Boolean predicates over entry values.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::error::Result;
use crate::function::NumberFunction;
use crate::list::{EntryKey, ParameterList};
use crate::value::{NumberKind, ValueType};

/// A predicate over the current values of one or more entries.
///
/// Combinators hold shared subconditions and nest to any depth.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// True iff the boolean entry is true.
    Bool { entry: EntryKey },
    /// True iff membership of the string entry in `values` equals `when_in_set`.
    String {
        entry: EntryKey,
        values: Vec<String>,
        when_in_set: bool,
    },
    /// True iff the (transformed) numeric entry is non-zero.
    Number {
        entry: EntryKey,
        kind: NumberKind,
        function: Option<NumberFunction>,
    },
    /// All subconditions hold; vacuously true when empty.
    And(Vec<Arc<Condition>>),
    /// Any subcondition holds; false when empty.
    Or(Vec<Arc<Condition>>),
    Not(Arc<Condition>),
    /// All subconditions evaluate to the same value; true when empty.
    Equals(Vec<Arc<Condition>>),
}

impl Condition {
    pub fn bool(entry: EntryKey) -> Self {
        Condition::Bool { entry }
    }

    pub fn string<I, S>(entry: EntryKey, values: I, when_in_set: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Condition::String {
            entry,
            values: values.into_iter().map(Into::into).collect(),
            when_in_set,
        }
    }

    pub fn number(entry: EntryKey, kind: NumberKind) -> Self {
        Condition::Number {
            entry,
            kind,
            function: None,
        }
    }

    /// Number condition that transforms the value first; the function must match `kind`.
    pub fn number_with(entry: EntryKey, kind: NumberKind, function: NumberFunction) -> Result<Self> {
        function.ensure_kind(kind)?;
        Ok(Condition::Number {
            entry,
            kind,
            function: Some(function),
        })
    }

    pub fn and(conditions: impl IntoIterator<Item = Arc<Condition>>) -> Self {
        Condition::And(conditions.into_iter().collect())
    }

    pub fn or(conditions: impl IntoIterator<Item = Arc<Condition>>) -> Self {
        Condition::Or(conditions.into_iter().collect())
    }

    pub fn not(condition: Arc<Condition>) -> Self {
        Condition::Not(condition)
    }

    pub fn equals(conditions: impl IntoIterator<Item = Arc<Condition>>) -> Self {
        Condition::Equals(conditions.into_iter().collect())
    }

    pub fn type_tag(&self) -> &'static str {
        match self {
            Condition::Bool { .. } => "BoolCondition",
            Condition::String { .. } => "StringCondition",
            Condition::Number {
                kind: NumberKind::Int,
                ..
            } => "NumberCondition(int)",
            Condition::Number {
                kind: NumberKind::Double,
                ..
            } => "NumberCondition(double)",
            Condition::And(_) => "AndCondition",
            Condition::Or(_) => "OrCondition",
            Condition::Not(_) => "NotCondition",
            Condition::Equals(_) => "EqualsCondition",
        }
    }

    /// Subconditions in order; empty for leaf conditions.
    pub fn children(&self) -> &[Arc<Condition>] {
        match self {
            Condition::And(children) | Condition::Or(children) | Condition::Equals(children) => {
                children.as_slice()
            }
            Condition::Not(child) => std::slice::from_ref(child),
            _ => &[],
        }
    }

    /// Every entry the condition reads, at any depth.
    pub fn entries(&self) -> BTreeSet<EntryKey> {
        let mut entries = BTreeSet::new();
        self.collect_entries(&mut entries);
        entries
    }

    fn collect_entries(&self, into: &mut BTreeSet<EntryKey>) {
        match self {
            Condition::Bool { entry }
            | Condition::String { entry, .. }
            | Condition::Number { entry, .. } => {
                into.insert(*entry);
            }
            _ => {
                for child in self.children() {
                    child.collect_entries(into);
                }
            }
        }
    }

    /// Evaluate against current values, short-circuiting left to right.
    pub fn evaluate(&self, list: &ParameterList) -> Result<bool> {
        match self {
            Condition::Bool { entry } => list.read_bool(*entry),
            Condition::String {
                entry,
                values,
                when_in_set,
            } => {
                let value = list.read_str(*entry)?;
                let in_set = values.iter().any(|candidate| candidate == value);
                Ok(in_set == *when_in_set)
            }
            Condition::Number {
                entry,
                kind,
                function,
            } => {
                let mut number = list.read_number(*entry, *kind)?;
                if let Some(function) = function {
                    number = function.apply(number);
                }
                Ok(number.is_truthy())
            }
            Condition::And(children) => {
                for child in children {
                    if !child.evaluate(list)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Condition::Or(children) => {
                for child in children {
                    if child.evaluate(list)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Condition::Not(child) => Ok(!child.evaluate(list)?),
            Condition::Equals(children) => {
                let mut first = None;
                for child in children {
                    let value = child.evaluate(list)?;
                    match first {
                        None => first = Some(value),
                        Some(expected) if expected != value => return Ok(false),
                        Some(_) => {}
                    }
                }
                Ok(true)
            }
        }
    }

    /// Check every leaf's entry type without evaluating.
    pub fn check_types(&self, list: &ParameterList) -> Result<()> {
        match self {
            Condition::Bool { entry } => list.expect_type(*entry, ValueType::Bool),
            Condition::String { entry, .. } => list.expect_type(*entry, ValueType::String),
            Condition::Number { entry, kind, .. } => list.expect_type(*entry, kind.value_type()),
            _ => self
                .children()
                .iter()
                .try_for_each(|child| child.check_types(list)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;

    fn list() -> (ParameterList, EntryKey, EntryKey, EntryKey) {
        let mut list = ParameterList::new("Conditions");
        let flag = list.set("use preconditioner", true).unwrap();
        let level = list.set("levels", 3).unwrap();
        let method = list.set("method", "GMRES").unwrap();
        (list, flag, level, method)
    }

    #[test]
    fn entries_cover_nested_conditions() {
        let (_, flag, level, method) = list();
        let condition = Condition::and([
            Arc::new(Condition::bool(flag)),
            Arc::new(Condition::not(Arc::new(Condition::or([
                Arc::new(Condition::number(level, NumberKind::Int)),
                Arc::new(Condition::string(method, ["CG"], true)),
            ])))),
        ]);
        assert_eq!(
            condition.entries().into_iter().collect::<Vec<_>>(),
            vec![flag, level, method]
        );
    }

    #[test]
    fn string_condition_respects_polarity() {
        let (list, _, _, method) = list();
        assert!(Condition::string(method, ["GMRES", "CG"], true).evaluate(&list).unwrap());
        assert!(!Condition::string(method, ["GMRES", "CG"], false).evaluate(&list).unwrap());
        assert!(Condition::string(method, ["BiCGStab"], false).evaluate(&list).unwrap());
    }

    #[test]
    fn string_condition_on_number_is_type_mismatch() {
        let (list, _, level, _) = list();
        let err = Condition::string(level, ["3"], true).evaluate(&list).unwrap_err();
        assert!(matches!(
            err,
            ModelError::TypeMismatch {
                expected: ValueType::String,
                found: ValueType::Int,
                ..
            }
        ));
    }

    #[test]
    fn equals_compares_all_children() {
        let (list, flag, level, _) = list();
        let same = Condition::equals([
            Arc::new(Condition::bool(flag)),
            Arc::new(Condition::number(level, NumberKind::Int)),
        ]);
        assert!(same.evaluate(&list).unwrap());
        let different = Condition::equals([
            Arc::new(Condition::bool(flag)),
            Arc::new(Condition::not(Arc::new(Condition::bool(flag)))),
        ]);
        assert!(!different.evaluate(&list).unwrap());
    }

    #[test]
    fn empty_or_is_false() {
        let (list, ..) = list();
        assert!(!Condition::or([]).evaluate(&list).unwrap());
        assert!(Condition::and([]).evaluate(&list).unwrap());
    }
}
