//! The required flag decides only whether an absent target may be left
//! absent. It never changes which strategy runs.

use pipeline_weaver::{Document, Node, Operation, Strategy, WeaveError, WeaveResult, apply};
use rstest::rstest;
use serde_json::{Value, json};

const PRESENT: &str = "x:\n  y:\n    a: 1\n";
const ABSENT: &str = "other: 1\n";

fn run(text: &str, strategy: Strategy, required: bool, value: Option<Value>) -> WeaveResult<Option<Value>> {
    let mut document = Document::parse(text).expect("fixture parses");
    let operation = Operation {
        required,
        ..Operation::new("x.y", strategy, value.map(Into::into))
    };
    apply(&mut document, &[operation])?;
    Ok(document
        .get("x.y")
        .expect("valid path")
        .map(Node::to_json))
}

#[rstest]
#[case(Strategy::Set, json!({"b": 2}))]
#[case(Strategy::Overwrite, json!({"b": 2}))]
#[case(Strategy::Merge, json!({"a": 1, "b": 2}))]
#[case(Strategy::Preserve, json!({"a": 1}))]
fn present_targets_follow_the_strategy_whatever_required_says(
    #[case] strategy: Strategy,
    #[case] expected: Value,
    #[values(true, false)] required: bool,
) {
    let result = run(PRESENT, strategy, required, Some(json!({"b": 2}))).expect("operation applies");
    assert_eq!(result, Some(expected));
}

#[rstest]
#[case(Strategy::Set)]
#[case(Strategy::Overwrite)]
#[case(Strategy::Merge)]
#[case(Strategy::Preserve)]
fn required_absent_targets_are_created_from_the_value(#[case] strategy: Strategy) {
    let result = run(ABSENT, strategy, true, Some(json!({"b": 2}))).expect("operation applies");
    assert_eq!(result, Some(json!({"b": 2})));
}

#[rstest]
#[case(Strategy::Set, Some(json!({"b": 2})))]
#[case(Strategy::Overwrite, Some(json!({"b": 2})))]
#[case(Strategy::Merge, None)]
#[case(Strategy::Preserve, None)]
fn optional_absent_targets_only_appear_for_writing_strategies(
    #[case] strategy: Strategy,
    #[case] expected: Option<Value>,
) {
    let result = run(ABSENT, strategy, false, Some(json!({"b": 2}))).expect("operation applies");
    assert_eq!(result, expected);
}

#[rstest]
#[case(Strategy::Set)]
#[case(Strategy::Overwrite)]
#[case(Strategy::Merge)]
#[case(Strategy::Preserve)]
fn required_absent_targets_without_a_value_fail(#[case] strategy: Strategy) {
    let err = run(ABSENT, strategy, true, None).expect_err("nothing to create the target from");
    assert!(matches!(
        err.as_ref(),
        WeaveError::MissingRequiredTarget { path, strategy: reported } if path == "x.y" && *reported == strategy
    ));
}

#[rstest]
#[case(Strategy::Set)]
#[case(Strategy::Overwrite)]
#[case(Strategy::Merge)]
#[case(Strategy::Preserve)]
fn optional_absent_targets_without_a_value_stay_absent(#[case] strategy: Strategy) {
    let result = run(ABSENT, strategy, false, None).expect("operation is a no-op");
    assert_eq!(result, None);
}

#[test]
fn preserve_leaves_present_targets_byte_identical() {
    let text = "x:\n  y:   {a: 1,   keep: spacing}   # note\n";
    let mut document = Document::parse(text).expect("fixture parses");
    apply(&mut document, &[Operation::preserve("x.y", json!({"b": 2}))]).expect("preserve");
    assert_eq!(document.to_yaml_string(), text);
}
