//! Evaluated state of a loaded document, shaped for tables and JSON.

use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use paramdep_model::{
    DependencyFamily, DependencySheet, EntryKey, EntryValue, ParameterList, ValueType,
};
use serde::Serialize;
use tracing::debug;

/// One `--set NAME=VALUE` override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub name: String,
    pub text: String,
}

impl FromStr for Assignment {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (name, text) = s
            .split_once('=')
            .ok_or_else(|| format!("expected NAME=VALUE, found '{s}'"))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(format!("missing entry name in '{s}'"));
        }
        Ok(Self {
            name: name.to_string(),
            text: text.to_string(),
        })
    }
}

/// Parse `text` as a new value for an entry currently holding `value_type`.
///
/// Array items are comma separated; an empty text is an empty array.
pub fn parse_value(value_type: ValueType, text: &str) -> paramdep_model::Result<EntryValue> {
    if !value_type.is_array() {
        return value_type.parse_scalar(text);
    }
    if text.trim().is_empty() {
        value_type.parse_array(std::iter::empty())
    } else {
        value_type.parse_array(text.split(','))
    }
}

/// Apply overrides in order. Each keeps the entry's value type.
pub fn apply_assignments(list: &mut ParameterList, assignments: &[Assignment]) -> Result<()> {
    for assignment in assignments {
        let key = list
            .key(&assignment.name)
            .ok_or_else(|| anyhow!("no entry named '{}'", assignment.name))?;
        let value_type = list.require(key)?.value_type();
        let value = parse_value(value_type, &assignment.text)
            .with_context(|| format!("set {}", assignment.name))?;
        list.set_value(key, value)
            .with_context(|| format!("set {}", assignment.name))?;
        debug!(entry = %assignment.name, value = %assignment.text, "applied override");
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryStatus {
    pub name: String,
    pub value_type: String,
    pub value: EntryValue,
    pub visible: bool,
    /// Description of the validator in effect, if any.
    pub validator: Option<String>,
    /// Length demanded by an array length dependency.
    pub required_length: Option<usize>,
    pub valid: bool,
}

/// Visibility, effective validator and validity of every entry, in list order.
pub fn entry_statuses(list: &ParameterList, sheet: &DependencySheet) -> Result<Vec<EntryStatus>> {
    list.iter()
        .map(|(key, entry)| {
            let validator = sheet.effective_validator(list, key)?;
            let required_length = required_length(list, sheet, key)?;
            let accepted = validator
                .as_ref()
                .is_none_or(|validator| validator.accepts(entry.value()));
            let length_ok = required_length.is_none_or(|length| {
                entry
                    .value()
                    .as_array()
                    .is_some_and(|array| array.len() == length)
            });
            Ok(EntryStatus {
                name: entry.name().to_string(),
                value_type: entry.value_type().to_string(),
                value: entry.value().clone(),
                visible: sheet.is_visible(list, key)?,
                validator: validator.map(|validator| validator.to_string()),
                required_length,
                valid: accepted && length_ok,
            })
        })
        .collect()
}

fn required_length(
    list: &ParameterList,
    sheet: &DependencySheet,
    key: EntryKey,
) -> Result<Option<usize>> {
    for dependency in sheet.dependencies_of(key) {
        if dependency.family() == DependencyFamily::Structural {
            return Ok(Some(dependency.required_array_length(list, key)?));
        }
    }
    Ok(None)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyRow {
    #[serde(rename = "type")]
    pub dependency_type: String,
    pub family: String,
    pub dependees: Vec<String>,
    pub dependents: Vec<String>,
    pub show_if: Option<bool>,
}

pub fn dependency_rows(list: &ParameterList, sheet: &DependencySheet) -> Vec<DependencyRow> {
    sheet
        .iter()
        .map(|dependency| DependencyRow {
            dependency_type: dependency.type_tag().to_string(),
            family: family_label(dependency.family()).to_string(),
            dependees: dependency
                .dependees()
                .into_iter()
                .map(|key| list.display_name(key))
                .collect(),
            dependents: dependency
                .dependents()
                .iter()
                .map(|key| list.display_name(*key))
                .collect(),
            show_if: dependency.show_if(),
        })
        .collect()
}

fn family_label(family: DependencyFamily) -> &'static str {
    match family {
        DependencyFamily::Visual => "visual",
        DependencyFamily::Validator => "validator",
        DependencyFamily::Structural => "structural",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignment_splits_on_first_equals() {
        let assignment: Assignment = "expr=a=b".parse().unwrap();
        assert_eq!(assignment.name, "expr");
        assert_eq!(assignment.text, "a=b");
    }

    #[test]
    fn assignment_requires_name() {
        insta::assert_snapshot!(
            "=3".parse::<Assignment>().unwrap_err(),
            @"missing entry name in '=3'"
        );
        insta::assert_snapshot!(
            "count".parse::<Assignment>().unwrap_err(),
            @"expected NAME=VALUE, found 'count'"
        );
    }

    #[test]
    fn array_values_split_on_commas() {
        assert_eq!(
            parse_value(ValueType::IntArray, "1, 2,3").unwrap(),
            EntryValue::from(vec![1_i64, 2, 3])
        );
        assert_eq!(
            parse_value(ValueType::StringArray, "").unwrap(),
            EntryValue::from(Vec::<String>::new())
        );
    }

    #[test]
    fn overrides_keep_value_type() {
        let mut list = ParameterList::new("Overrides");
        list.set("count", 3).unwrap();
        let err = apply_assignments(
            &mut list,
            &[Assignment {
                name: "count".to_string(),
                text: "many".to_string(),
            }],
        )
        .unwrap_err();
        assert_eq!(format!("{err:#}"), "set count: cannot parse 'many' as int");
    }
}
