use std::sync::Arc;

use paramdep_model::{
    Condition, FunctionOp, ModelError, Number, NumberFunction, NumberKind, ParameterList,
};
use proptest::prelude::*;

#[test]
fn and_of_bool_and_number() {
    let mut list = ParameterList::new("And");
    let flag = list.set("enabled", true).unwrap();
    let count = list.set("count", 4).unwrap();
    let condition = Condition::and([
        Arc::new(Condition::bool(flag)),
        Arc::new(Condition::number(count, NumberKind::Int)),
    ]);
    assert!(condition.evaluate(&list).unwrap());

    list.set_value(flag, false).unwrap();
    assert!(!condition.evaluate(&list).unwrap());

    list.set_value(flag, true).unwrap();
    list.set_value(count, 0).unwrap();
    assert!(!condition.evaluate(&list).unwrap());

    assert!(Condition::and([]).evaluate(&list).unwrap());
}

#[test]
fn number_condition_with_function() {
    let mut list = ParameterList::new("Number");
    let level = list.set("level", 5.0).unwrap();
    let condition = Condition::number_with(
        level,
        NumberKind::Double,
        NumberFunction::new(FunctionOp::Subtract, Number::Double(5.0)),
    )
    .unwrap();
    assert!(!condition.evaluate(&list).unwrap());
    list.set_value(level, 6.0).unwrap();
    assert!(condition.evaluate(&list).unwrap());
}

#[test]
fn function_kind_must_match_condition_kind() {
    let mut list = ParameterList::new("Number");
    let level = list.set("level", 5).unwrap();
    let err = Condition::number_with(
        level,
        NumberKind::Int,
        NumberFunction::new(FunctionOp::Add, Number::Double(0.5)),
    )
    .unwrap_err();
    insta::assert_snapshot!(err, @"operand 0.5 is not a valid int operand");
}

#[test]
fn bool_condition_on_string_fails() {
    let mut list = ParameterList::new("Types");
    let name = list.set("name", "solver").unwrap();
    let err = Condition::bool(name).evaluate(&list).unwrap_err();
    assert!(matches!(err, ModelError::TypeMismatch { .. }));
    insta::assert_snapshot!(err, @"entry 'name' holds a string value, expected bool");
}

#[test]
fn deep_nesting_reports_every_entry() {
    let mut list = ParameterList::new("Nested");
    let a = list.set("a", true).unwrap();
    let b = list.set("b", false).unwrap();
    let mut condition = Arc::new(Condition::bool(a));
    for _ in 0..64 {
        condition = Arc::new(Condition::not(Arc::new(Condition::or([
            condition,
            Arc::new(Condition::bool(b)),
        ]))));
    }
    assert_eq!(condition.entries().len(), 2);
    // Each level negates `a || false`, so an even depth restores the original value.
    assert!(condition.evaluate(&list).unwrap());
}

proptest! {
    #[test]
    fn and_is_true_iff_every_leaf_is_true(flags in proptest::collection::vec(any::<bool>(), 0..12)) {
        let mut list = ParameterList::new("Flags");
        let leaves: Vec<Arc<Condition>> = flags
            .iter()
            .enumerate()
            .map(|(index, flag)| {
                let key = list.set(&format!("flag{index}"), *flag).unwrap();
                Arc::new(Condition::bool(key))
            })
            .collect();
        let and = Condition::and(leaves.iter().cloned());
        let or = Condition::or(leaves.iter().cloned());
        prop_assert_eq!(and.evaluate(&list).unwrap(), flags.iter().all(|flag| *flag));
        prop_assert_eq!(or.evaluate(&list).unwrap(), flags.iter().any(|flag| *flag));
    }

    #[test]
    fn number_condition_is_non_zero_test(value in any::<i64>()) {
        let mut list = ParameterList::new("Numbers");
        let key = list.set("value", value).unwrap();
        let condition = Condition::number(key, NumberKind::Int);
        prop_assert_eq!(condition.evaluate(&list).unwrap(), value != 0);
    }
}
