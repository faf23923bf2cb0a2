//! `<Condition>` and `<Function>` elements nested inside dependencies.

use std::sync::Arc;

use paramdep_model::{Condition, EntryKey, FunctionOp, Number, NumberFunction, NumberKind};

use crate::element::XmlElement;
use crate::error::{Reference, Result, XmlError};
use crate::ids::{EntryIdMap, IdToEntryMap};

pub const CONDITION_TAG: &str = "Condition";
pub const FUNCTION_TAG: &str = "Function";
pub const STRING_VALUES_TAG: &str = "StringValues";

pub fn function_to_xml(function: &NumberFunction) -> XmlElement {
    XmlElement::new(FUNCTION_TAG)
        .with_attribute("type", function.type_tag())
        .with_attribute("operand", function.operand())
}

/// Decode a `<Function>`; its kind must match `kind`.
pub fn function_from_xml(element: &XmlElement, kind: NumberKind) -> Result<NumberFunction> {
    element.expect_tag(FUNCTION_TAG)?;
    let type_name = element.require_attribute("type")?;
    let unknown = || element.invalid_attribute("type", type_name, "unknown function type");
    let (prefix, function_kind) = split_kind(type_name).ok_or_else(unknown)?;
    let op = FunctionOp::from_tag_prefix(prefix).ok_or_else(unknown)?;
    let operand_text = element.require_attribute("operand")?;
    let operand = Number::parse(function_kind, operand_text)
        .map_err(|err| element.invalid_attribute("operand", operand_text, err))?;
    let function = NumberFunction::new(op, operand);
    function.ensure_kind(kind)?;
    Ok(function)
}

/// Split `Name(kind)` into its parts.
pub(crate) fn split_kind(type_name: &str) -> Option<(&str, NumberKind)> {
    let (prefix, rest) = type_name.split_once('(')?;
    let kind = rest.strip_suffix(')')?.parse().ok()?;
    Some((prefix, kind))
}

pub(crate) fn string_values_to_xml<'a>(values: impl IntoIterator<Item = &'a String>) -> XmlElement {
    let mut block = XmlElement::new(STRING_VALUES_TAG);
    for value in values {
        block.push_child(XmlElement::new("String").with_attribute("value", value));
    }
    block
}

pub(crate) fn string_values_from_xml(
    parent: &XmlElement,
    dependency_type: &str,
) -> Result<Vec<String>> {
    let block = parent
        .child(STRING_VALUES_TAG)
        .ok_or_else(|| XmlError::MissingStringValuesTag {
            dependency_type: dependency_type.to_string(),
        })?;
    block
        .children_named("String")
        .map(|child| child.require_attribute("value").map(str::to_string))
        .collect()
}

/// Encode `condition`; every entry it reads must have an ID.
pub fn condition_to_xml(
    condition: &Condition,
    ids: &EntryIdMap,
    dependency_type: &str,
) -> Result<XmlElement> {
    let mut element = XmlElement::new(CONDITION_TAG).with_attribute("type", condition.type_tag());
    let entry_id = |entry: EntryKey| {
        ids.id(entry).ok_or_else(|| XmlError::MissingDependee {
            dependency_type: dependency_type.to_string(),
            reference: Reference::Entry(entry.to_string()),
        })
    };
    match condition {
        Condition::Bool { entry } => {
            element.set_attribute("parameterId", entry_id(*entry)?);
        }
        Condition::String {
            entry,
            values,
            when_in_set,
        } => {
            element.set_attribute("parameterId", entry_id(*entry)?);
            element.set_attribute("whenInSet", when_in_set);
            element.push_child(string_values_to_xml(values));
        }
        Condition::Number {
            entry, function, ..
        } => {
            element.set_attribute("parameterId", entry_id(*entry)?);
            if let Some(function) = function {
                element.push_child(function_to_xml(function));
            }
        }
        _ => {
            for child in condition.children() {
                element.push_child(condition_to_xml(child, ids, dependency_type)?);
            }
        }
    }
    Ok(element)
}

/// Decode a `<Condition>` tree.
pub fn condition_from_xml(
    element: &XmlElement,
    entries: &IdToEntryMap,
    dependency_type: &str,
) -> Result<Condition> {
    element.expect_tag(CONDITION_TAG)?;
    let type_name = element.require_attribute("type")?;
    let entry = || -> Result<EntryKey> {
        let id: u32 = element.parse_attribute("parameterId")?;
        entries.get(id).ok_or_else(|| XmlError::MissingDependee {
            dependency_type: dependency_type.to_string(),
            reference: Reference::Id(id),
        })
    };
    let children = || -> Result<Vec<Arc<Condition>>> {
        element
            .children_named(CONDITION_TAG)
            .map(|child| condition_from_xml(child, entries, dependency_type).map(Arc::new))
            .collect()
    };
    let condition = match type_name {
        "BoolCondition" => Condition::bool(entry()?),
        "StringCondition" => Condition::String {
            entry: entry()?,
            values: string_values_from_xml(element, dependency_type)?,
            when_in_set: element
                .parse_optional_attribute("whenInSet")?
                .unwrap_or(true),
        },
        "AndCondition" => Condition::and(children()?),
        "OrCondition" => Condition::or(children()?),
        "EqualsCondition" => Condition::equals(children()?),
        "NotCondition" => {
            let child = element
                .child(CONDITION_TAG)
                .ok_or_else(|| XmlError::MissingConditionTag {
                    dependency_type: dependency_type.to_string(),
                })?;
            Condition::not(Arc::new(condition_from_xml(
                child,
                entries,
                dependency_type,
            )?))
        }
        other => match split_kind(other) {
            Some(("NumberCondition", kind)) => {
                let entry = entry()?;
                match element.child(FUNCTION_TAG) {
                    Some(function) => {
                        Condition::number_with(entry, kind, function_from_xml(function, kind)?)?
                    }
                    None => Condition::number(entry, kind),
                }
            }
            _ => {
                return Err(XmlError::UnknownConditionType {
                    type_name: other.to_string(),
                });
            }
        },
    };
    Ok(condition)
}
