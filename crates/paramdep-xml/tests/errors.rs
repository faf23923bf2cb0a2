mod common;

use std::sync::Arc;

use paramdep_model::{Dependency, DependencyKind};
use paramdep_xml::{
    ConverterRegistry, EntryIdMap, FailurePolicy, IdToEntryMap, IdToValidatorMap, ReadOptions,
    ValidatorIdMap, XmlElement, XmlError, from_str, read_document_with, to_string,
    write_document,
};

use common::{Fixture, every_kind, fixture, sheet_of};

struct Encoded {
    element: XmlElement,
    entries: IdToEntryMap,
    validators: IdToValidatorMap,
}

fn encode(f: &Fixture, dependency: &Dependency) -> Encoded {
    let sheet = sheet_of([dependency.clone()]);
    let entry_ids = EntryIdMap::from_list(&f.list);
    let validator_ids = ValidatorIdMap::collect(&f.list, &sheet);
    let element = ConverterRegistry::standard()
        .convert_dependency(dependency, &entry_ids, &validator_ids)
        .unwrap();
    Encoded {
        element,
        entries: entry_ids.inverse(),
        validators: validator_ids.inverse(),
    }
}

fn decode(encoded: &Encoded) -> Result<Dependency, XmlError> {
    ConverterRegistry::standard().convert_xml(
        &encoded.element,
        &encoded.entries,
        &encoded.validators,
    )
}

fn find(f: &Fixture, label: &str) -> Dependency {
    every_kind(f, &[f.threshold])
        .into_iter()
        .find(|(name, _)| *name == label)
        .map(|(_, dependency)| dependency)
        .unwrap()
}

fn id_of(f: &Fixture, key: paramdep_model::EntryKey) -> u32 {
    EntryIdMap::from_list(&f.list).id(key).unwrap()
}

#[test]
fn extra_dependee_is_rejected_for_fixed_arity_kinds() {
    let f = fixture();
    let extra = id_of(&f, f.tolerance);
    for (label, dependency) in every_kind(&f, &[f.threshold]) {
        if matches!(dependency.kind(), DependencyKind::ConditionVisual { .. }) {
            continue;
        }
        let mut encoded = encode(&f, &dependency);
        encoded
            .element
            .push_child(XmlElement::new("Dependee").with_attribute("parameterId", extra));
        let err = decode(&encoded).unwrap_err();
        assert!(
            matches!(err, XmlError::TooManyDependees { found: 2, allowed: 1, .. }),
            "{label}: {err}"
        );
    }
    let mut encoded = encode(&f, &common::array_length(&f, &[f.weights]));
    encoded
        .element
        .push_child(XmlElement::new("Dependee").with_attribute("parameterId", extra));
    insta::assert_snapshot!(
        decode(&encoded).unwrap_err(),
        @"NumberArrayLengthDependency(int): 2 dependees listed, at most 1 allowed"
    );
}

#[test]
fn condition_dependees_must_match_condition() {
    let f = fixture();
    let mut encoded = encode(&f, &find(&f, "condition visual"));
    encoded.element.push_child(
        XmlElement::new("Dependee").with_attribute("parameterId", id_of(&f, f.tolerance)),
    );
    insta::assert_snapshot!(
        decode(&encoded).unwrap_err(),
        @"ConditionVisualDependency: declared dependees [0, 1, 2, 5] differ from the condition's entries [0, 1, 2]"
    );
}

#[test]
fn removed_dependee_is_reported() {
    let f = fixture();
    for (label, dependency) in every_kind(&f, &[f.threshold]) {
        let mut encoded = encode(&f, &dependency);
        let dependee = *dependency.dependees().iter().next().unwrap();
        encoded.entries.remove(id_of(&f, dependee));
        let err = decode(&encoded).unwrap_err();
        assert!(
            matches!(err, XmlError::MissingDependee { .. }),
            "{label}: {err}"
        );
    }
}

#[test]
fn removed_dependent_is_reported() {
    let f = fixture();
    let mut encoded = encode(&f, &find(&f, "bool visual"));
    encoded.entries.remove(id_of(&f, f.threshold));
    insta::assert_snapshot!(
        decode(&encoded).unwrap_err(),
        @"BoolVisualDependency: no dependent for ID 4"
    );
}

#[test]
fn removed_validator_is_reported() {
    let f = fixture();
    for label in [
        "bool validator",
        "string validator",
        "range validator",
        "range validator double",
    ] {
        let dependency = find(&f, label);
        let sheet = sheet_of([dependency.clone()]);
        let validator_ids = ValidatorIdMap::collect(&f.list, &sheet);
        let mut encoded = encode(&f, &dependency);
        encoded.validators.remove(validator_ids.id(&f.tight).unwrap());
        let err = decode(&encoded).unwrap_err();
        assert!(
            matches!(err, XmlError::MissingValidator { .. }),
            "{label}: {err}"
        );
    }
}

#[test]
fn writer_reports_unassigned_ids() {
    let f = fixture();
    let dependency = find(&f, "string validator");
    let sheet = sheet_of([dependency.clone()]);
    let registry = ConverterRegistry::standard();

    let mut entry_ids = EntryIdMap::from_list(&f.list);
    entry_ids.remove(f.mode);
    let err = registry
        .convert_dependency(&dependency, &entry_ids, &ValidatorIdMap::collect(&f.list, &sheet))
        .unwrap_err();
    insta::assert_snapshot!(err, @"StringValidatorDependency: no dependee for entry '#1'");

    let mut entry_ids = EntryIdMap::from_list(&f.list);
    entry_ids.remove(f.threshold);
    let err = registry
        .convert_dependency(&dependency, &entry_ids, &ValidatorIdMap::collect(&f.list, &sheet))
        .unwrap_err();
    assert!(matches!(err, XmlError::MissingDependent { .. }));

    let mut validator_ids = ValidatorIdMap::collect(&f.list, &sheet);
    validator_ids.remove(&f.wide);
    let err = registry
        .convert_dependency(&dependency, &EntryIdMap::from_list(&f.list), &validator_ids)
        .unwrap_err();
    insta::assert_snapshot!(
        err,
        @"StringValidatorDependency: no validator for validator 'double in [0, 100]'"
    );
}

#[test]
fn stripped_structural_children_are_reported() {
    let f = fixture();

    let mut encoded = encode(&f, &find(&f, "string validator"));
    assert_eq!(encoded.element.remove_children("ValuesAndValidators"), 1);
    insta::assert_snapshot!(
        decode(&encoded).unwrap_err(),
        @"StringValidatorDependency: missing ValuesAndValidators element"
    );

    let mut encoded = encode(&f, &find(&f, "range validator"));
    assert_eq!(encoded.element.remove_children("RangesAndValidators"), 1);
    insta::assert_snapshot!(
        decode(&encoded).unwrap_err(),
        @"RangeValidatorDependency(int): missing RangesAndValidators element"
    );

    let mut encoded = encode(&f, &find(&f, "string visual"));
    encoded.element.remove_children("StringValues");
    assert!(matches!(
        decode(&encoded).unwrap_err(),
        XmlError::MissingStringValuesTag { .. }
    ));

    let mut encoded = encode(&f, &find(&f, "condition visual"));
    encoded.element.remove_children("Condition");
    assert!(matches!(
        decode(&encoded).unwrap_err(),
        XmlError::MissingConditionTag { .. }
    ));
}

#[test]
fn missing_dependee_and_dependent_lists_are_reported() {
    let f = fixture();
    let mut encoded = encode(&f, &find(&f, "bool visual"));
    encoded.element.remove_children("Dependee");
    insta::assert_snapshot!(
        decode(&encoded).unwrap_err(),
        @"BoolVisualDependency: no dependees listed"
    );

    let mut encoded = encode(&f, &find(&f, "bool visual"));
    encoded.element.remove_children("Dependent");
    insta::assert_snapshot!(
        decode(&encoded).unwrap_err(),
        @"BoolVisualDependency: no dependents listed"
    );
}

#[test]
fn unknown_dependency_type_is_reported() {
    let f = fixture();
    let mut encoded = encode(&f, &find(&f, "bool visual"));
    encoded
        .element
        .set_attribute("type", "TwoDRowDependency(double)");
    insta::assert_snapshot!(
        decode(&encoded).unwrap_err(),
        @"unknown dependency type 'TwoDRowDependency(double)'"
    );
}

#[test]
fn repeated_string_value_is_rejected() {
    let f = fixture();
    let mut encoded = encode(&f, &find(&f, "string validator"));
    let pairs = encoded.element.child_mut("ValuesAndValidators").unwrap();
    assert_eq!(pairs.children().len(), 2);
    pairs.children_mut()[1].set_attribute("value", "auto");
    insta::assert_snapshot!(
        decode(&encoded).unwrap_err(),
        @"<Pair> attribute 'value' has invalid value 'auto': value listed twice"
    );
}

#[test]
fn overlapping_ranges_in_document_are_rejected() {
    let f = fixture();
    let mut encoded = encode(&f, &find(&f, "range validator"));
    let pairs = encoded.element.child_mut("RangesAndValidators").unwrap();
    pairs.children_mut()[1].set_attribute("min", 10);
    insta::assert_snapshot!(
        decode(&encoded).unwrap_err(),
        @"range [0, 10] overlaps range [10, 50]"
    );
}

fn document_with_broken_dependency() -> String {
    let f = fixture();
    let sheet = sheet_of(
        every_kind(&f, &[f.threshold])
            .into_iter()
            .filter(|(label, _)| label.starts_with("bool"))
            .map(|(_, dependency)| dependency),
    );
    let mut root = write_document(&f.list, &sheet).unwrap();
    let dependencies = root.child_mut("Dependencies").unwrap();
    dependencies.children_mut()[1].remove_children("Dependent");
    root.to_xml_string().unwrap()
}

#[test]
fn abort_policy_fails_whole_document() {
    let xml = document_with_broken_dependency();
    let err = from_str(&xml, &ReadOptions::default()).unwrap_err();
    assert!(matches!(err, XmlError::MissingDependents { .. }));
}

#[test]
fn skip_policy_keeps_valid_dependencies() {
    let xml = document_with_broken_dependency();
    let options = ReadOptions::skip_failures();
    assert_eq!(options.failure_policy, FailurePolicy::Skip);
    let document = from_str(&xml, &options).unwrap();
    assert_eq!(document.sheet.len(), 2);
    assert_eq!(document.skipped.len(), 1);
    let skipped = &document.skipped[0];
    assert_eq!(skipped.index, 1);
    assert_eq!(skipped.dependency_type.as_deref(), Some("BoolValidatorDependency"));
}

#[test]
fn custom_registry_without_converters_rejects_everything() {
    let f = fixture();
    let sheet = sheet_of([find(&f, "bool visual")]);
    let root = XmlElement::parse(&to_string(&f.list, &sheet).unwrap()).unwrap();
    let options = ReadOptions {
        registry: Some(Arc::new(ConverterRegistry::new())),
        ..ReadOptions::default()
    };
    let err = read_document_with(&root, &options).unwrap_err();
    assert!(matches!(err, XmlError::UnknownDependencyType { .. }));
}

#[test]
fn malformed_text_is_a_syntax_error() {
    let err = from_str("<ParameterList name=\"x\"><Parameter></ParameterList>", &ReadOptions::default())
        .unwrap_err();
    assert!(matches!(err, XmlError::Syntax(_)));
}
