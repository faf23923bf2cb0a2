//! Standalone `<Validator>` elements.

use std::sync::Arc;

use paramdep_model::{
    ArrayValidator, EnhancedNumberValidator, FileNameValidator, NumberKind,
    StringEnumerationValidator, Validator,
};

use crate::element::XmlElement;
use crate::error::{Reference, Result, XmlError};
use crate::ids::{IdToValidatorMap, ValidatorIdMap};

pub const VALIDATOR_TAG: &str = "Validator";
pub const VALIDATORS_TAG: &str = "Validators";

/// Encode `validator` under `id`. Array prototypes must already have IDs.
pub fn validator_to_xml(
    validator: &Validator,
    id: u32,
    ids: &ValidatorIdMap,
) -> Result<XmlElement> {
    let mut element = XmlElement::new(VALIDATOR_TAG)
        .with_attribute("type", validator.type_tag())
        .with_attribute("validatorId", id);
    match validator {
        Validator::EnhancedNumber(number) => {
            element.set_attribute("min", number.min());
            element.set_attribute("max", number.max());
            element.set_attribute("step", number.step());
            element.set_attribute("precision", number.precision());
        }
        Validator::FileName(file) => {
            element.set_attribute("mustAlreadyExist", file.must_already_exist());
        }
        Validator::StringEnumeration(strings) => {
            for value in strings.values() {
                element.push_child(XmlElement::new("String").with_attribute("value", value));
            }
        }
        Validator::Array(array) => {
            let prototype_id =
                ids.id(array.prototype())
                    .ok_or_else(|| XmlError::MissingValidator {
                        dependency_type: validator.type_tag().to_string(),
                        reference: Reference::Validator(array.prototype().to_string()),
                    })?;
            element.set_attribute("prototypeId", prototype_id);
        }
    }
    Ok(element)
}

/// Decode one `<Validator>`; array prototypes resolve against `known`.
pub fn validator_from_xml(
    element: &XmlElement,
    known: &IdToValidatorMap,
) -> Result<(u32, Arc<Validator>)> {
    element.expect_tag(VALIDATOR_TAG)?;
    let id: u32 = element.parse_attribute("validatorId")?;
    let type_name = element.require_attribute("type")?;
    let validator = match type_name {
        "EnhancedNumberValidator(int)" => number_validator(element, NumberKind::Int)?,
        "EnhancedNumberValidator(double)" => number_validator(element, NumberKind::Double)?,
        "FileNameValidator" => {
            let must_exist = element
                .parse_optional_attribute("mustAlreadyExist")?
                .unwrap_or(false);
            Validator::from(FileNameValidator::new(must_exist))
        }
        "StringValidator" => Validator::from(StringEnumerationValidator::new(
            element
                .children_named("String")
                .map(|child| child.require_attribute("value"))
                .collect::<Result<Vec<_>>>()?,
        )),
        "ArrayValidator" => {
            let prototype_id: u32 = element.parse_attribute("prototypeId")?;
            let prototype = known
                .get(prototype_id)
                .ok_or_else(|| XmlError::MissingValidator {
                    dependency_type: type_name.to_string(),
                    reference: Reference::Id(prototype_id),
                })?;
            Validator::from(ArrayValidator::new(Arc::clone(prototype)))
        }
        other => {
            return Err(XmlError::UnknownValidatorType {
                type_name: other.to_string(),
            });
        }
    };
    Ok((id, Arc::new(validator)))
}

fn number_validator(element: &XmlElement, kind: NumberKind) -> Result<Validator> {
    let mut validator = EnhancedNumberValidator::new(
        kind,
        element.parse_attribute("min")?,
        element.parse_attribute("max")?,
    )?;
    if let Some(step) = element.parse_optional_attribute("step")? {
        validator = validator.with_step(step);
    }
    if let Some(precision) = element.parse_optional_attribute("precision")? {
        validator = validator.with_precision(precision);
    }
    Ok(Validator::from(validator))
}

/// Encode every validator in `ids` as a `<Validators>` block, in ID order.
pub fn validators_to_xml(ids: &ValidatorIdMap) -> Result<XmlElement> {
    let mut block = XmlElement::new(VALIDATORS_TAG);
    for (validator, id) in ids.iter() {
        block.push_child(validator_to_xml(validator, id, ids)?);
    }
    Ok(block)
}

/// Decode a `<Validators>` block. Prototypes must precede the arrays using them.
pub fn validators_from_xml(block: &XmlElement) -> Result<IdToValidatorMap> {
    block.expect_tag(VALIDATORS_TAG)?;
    let mut validators = IdToValidatorMap::new();
    for element in block.children() {
        let (id, validator) = validator_from_xml(element, &validators)?;
        validators.insert(id, validator)?;
    }
    Ok(validators)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_validator_round_trips_with_prototype() {
        let prototype = Arc::new(Validator::from(
            EnhancedNumberValidator::new(NumberKind::Double, -1.5, 2.25)
                .unwrap()
                .with_step(0.25)
                .with_precision(2),
        ));
        let array = Arc::new(Validator::from(ArrayValidator::new(Arc::clone(&prototype))));
        let mut ids = ValidatorIdMap::new();
        ids.assign(&array);

        let block = validators_to_xml(&ids).unwrap();
        let decoded = validators_from_xml(&block).unwrap();
        assert_eq!(decoded.get(0).unwrap().as_ref(), prototype.as_ref());
        let Validator::Array(array) = decoded.get(1).unwrap().as_ref() else {
            panic!("expected array validator");
        };
        // The decoded array shares the decoded prototype handle.
        assert!(Arc::ptr_eq(array.prototype(), decoded.get(0).unwrap()));
    }

    #[test]
    fn string_validator_keeps_value_order() {
        let validator = Validator::from(StringEnumerationValidator::new(["GMRES", "CG", "BiCG"]));
        let element = validator_to_xml(&validator, 3, &ValidatorIdMap::new()).unwrap();
        let (id, decoded) = validator_from_xml(&element, &IdToValidatorMap::new()).unwrap();
        assert_eq!(id, 3);
        assert_eq!(decoded.as_ref(), &validator);
    }

    #[test]
    fn unknown_validator_type_is_reported() {
        let element = XmlElement::new(VALIDATOR_TAG)
            .with_attribute("type", "RegexValidator")
            .with_attribute("validatorId", 0);
        let err = validator_from_xml(&element, &IdToValidatorMap::new()).unwrap_err();
        insta::assert_snapshot!(err, @"unknown validator type 'RegexValidator'");
    }

    #[test]
    fn missing_prototype_is_reported() {
        let element = XmlElement::new(VALIDATOR_TAG)
            .with_attribute("type", "ArrayValidator")
            .with_attribute("validatorId", 1)
            .with_attribute("prototypeId", 0);
        let err = validator_from_xml(&element, &IdToValidatorMap::new()).unwrap_err();
        insta::assert_snapshot!(err, @"ArrayValidator: no validator for ID 0");
    }
}
