#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;

use paramdep_model::{
    Condition, Dependency, DependencyKind, DependencySheet, EnhancedNumberValidator, EntryKey,
    FileNameValidator, FunctionOp, Number, NumberFunction, NumberKind, ParameterList,
    StringEnumerationValidator, Validator, ValueRange,
};

pub struct Fixture {
    pub list: ParameterList,
    pub flag: EntryKey,
    pub mode: EntryKey,
    pub count: EntryKey,
    pub scale: EntryKey,
    pub threshold: EntryKey,
    pub tolerance: EntryKey,
    pub file: EntryKey,
    pub weights: EntryKey,
    pub labels: EntryKey,
    pub tight: Arc<Validator>,
    pub wide: Arc<Validator>,
    pub existing_file: Arc<Validator>,
    pub names: Arc<Validator>,
}

pub fn fixture() -> Fixture {
    let mut list = ParameterList::new("Solver");
    let flag = list.set("flag", true).unwrap();
    let mode = list.set("mode", "auto").unwrap();
    let count = list.set("count", 4).unwrap();
    let scale = list.set("scale", 2.5).unwrap();
    let threshold = list.set("threshold", 5.0).unwrap();
    let tolerance = list.set("tolerance", 0.01).unwrap();
    let file = list.set("file", "mesh.exo").unwrap();
    let weights = list.set("weights", vec![1.0, 2.0, 3.0, 4.0]).unwrap();
    let labels = list
        .set("labels", vec!["x".to_string(), "y".to_string()])
        .unwrap();
    Fixture {
        list,
        flag,
        mode,
        count,
        scale,
        threshold,
        tolerance,
        file,
        weights,
        labels,
        tight: number_validator(0.0, 1.0),
        wide: number_validator(0.0, 100.0),
        existing_file: Arc::new(Validator::from(FileNameValidator::new(true))),
        names: Arc::new(Validator::from(StringEnumerationValidator::new([
            "mesh.exo", "grid.g",
        ]))),
    }
}

pub fn number_validator(min: f64, max: f64) -> Arc<Validator> {
    Arc::new(Validator::from(
        EnhancedNumberValidator::new(NumberKind::Double, min, max).unwrap(),
    ))
}

/// One dependency of every kind, governing `dependents`.
pub fn every_kind(f: &Fixture, dependents: &[EntryKey]) -> Vec<(&'static str, Dependency)> {
    let build = |kind: DependencyKind| Dependency::new(kind, dependents.iter().copied()).unwrap();
    vec![
        (
            "bool visual",
            build(DependencyKind::BoolVisual {
                dependee: f.flag,
                show_if: false,
            }),
        ),
        (
            "string visual",
            build(DependencyKind::StringVisual {
                dependee: f.mode,
                values: vec!["manual".to_string(), "semi <auto>".to_string()],
                show_if: true,
            }),
        ),
        (
            "number visual",
            build(DependencyKind::NumberVisual {
                dependee: f.count,
                kind: NumberKind::Int,
                function: Some(NumberFunction::new(FunctionOp::Subtract, Number::Int(4))),
                show_if: true,
            }),
        ),
        (
            "number visual double",
            build(DependencyKind::NumberVisual {
                dependee: f.scale,
                kind: NumberKind::Double,
                function: None,
                show_if: false,
            }),
        ),
        (
            "condition visual",
            build(DependencyKind::ConditionVisual {
                condition: Arc::new(Condition::and([
                    Arc::new(Condition::bool(f.flag)),
                    Arc::new(Condition::not(Arc::new(Condition::string(
                        f.mode,
                        ["manual"],
                        true,
                    )))),
                    Arc::new(Condition::number(f.count, NumberKind::Int)),
                ])),
                show_if: true,
            }),
        ),
        (
            "bool validator",
            build(DependencyKind::BoolValidator {
                dependee: f.flag,
                true_validator: Some(Arc::clone(&f.tight)),
                false_validator: Some(Arc::clone(&f.wide)),
            }),
        ),
        (
            "bool validator without false branch",
            build(DependencyKind::BoolValidator {
                dependee: f.flag,
                true_validator: Some(Arc::clone(&f.tight)),
                false_validator: None,
            }),
        ),
        (
            "string validator",
            build(DependencyKind::StringValidator {
                dependee: f.mode,
                validators: BTreeMap::from([
                    ("auto".to_string(), Arc::clone(&f.wide)),
                    ("manual".to_string(), Arc::clone(&f.tight)),
                ]),
                default_validator: Some(Arc::clone(&f.wide)),
            }),
        ),
        (
            "range validator",
            build(DependencyKind::RangeValidator {
                dependee: f.count,
                kind: NumberKind::Int,
                ranges: vec![
                    (ValueRange::new(0.0, 10.0).unwrap(), Arc::clone(&f.tight)),
                    (ValueRange::new(11.0, 50.0).unwrap(), Arc::clone(&f.wide)),
                ],
                default_validator: None,
            }),
        ),
        (
            "range validator double",
            build(DependencyKind::RangeValidator {
                dependee: f.scale,
                kind: NumberKind::Double,
                ranges: vec![(ValueRange::new(-1.5, 2.75).unwrap(), Arc::clone(&f.tight))],
                default_validator: Some(Arc::clone(&f.wide)),
            }),
        ),
    ]
}

/// Array length dependencies need array dependents.
pub fn array_length(f: &Fixture, dependents: &[EntryKey]) -> Dependency {
    Dependency::new(
        DependencyKind::NumberArrayLength {
            dependee: f.count,
            kind: NumberKind::Int,
            function: Some(NumberFunction::new(FunctionOp::Multiply, Number::Int(2))),
        },
        dependents.iter().copied(),
    )
    .unwrap()
}

pub fn sheet_of(dependencies: impl IntoIterator<Item = Dependency>) -> DependencySheet {
    let mut sheet = DependencySheet::new("Solver dependencies");
    for dependency in dependencies {
        sheet.add_dependency(Arc::new(dependency));
    }
    sheet
}
