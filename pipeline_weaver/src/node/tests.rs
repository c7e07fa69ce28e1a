//! Unit tests for the node model and value builder.

use rstest::rstest;
use serde_json::{Value, json};

use super::{Mapping, Node, NodeKind, OperationValue, Verbatim};

fn verbatim_item() -> Verbatim {
    Verbatim::Item {
        head: " make".to_owned(),
        body: Vec::new(),
    }
}

#[rstest]
#[case(json!({"a": 1, "b": [1, 2]}), json!({"b": [1, 2], "a": 1}), true)]
#[case(json!([1, 2]), json!([2, 1]), false)]
#[case(json!({"a": 1}), json!({"a": 1, "b": 2}), false)]
#[case(json!("1"), json!(1), false)]
#[case(json!(null), json!(null), true)]
fn value_equality_ignores_key_order_only(
    #[case] left: Value,
    #[case] right: Value,
    #[case] expected: bool,
) {
    assert_eq!(Node::from_json(&left).value_eq(&Node::from_json(&right)), expected);
}

#[test]
fn value_equality_ignores_comments_but_not_tags() {
    let plain = Node::sequence(vec![Node::from("a")]);
    let commented = plain.clone().with_comment("note");
    assert!(plain.value_eq(&commented));
    let tagged = plain.clone().with_tag("!reference");
    assert!(!plain.value_eq(&tagged));
}

#[test]
fn mutable_access_drops_verbatim_text() {
    let mut node = Node::sequence(vec![Node::from("make")]);
    node.set_verbatim(Some(verbatim_item()));
    assert!(node.is_verbatim());
    assert!(node.as_sequence().is_some());
    assert!(node.is_verbatim(), "shared access keeps the source text");
    node.as_sequence_mut().expect("sequence").push(Node::from("test"));
    assert!(!node.is_verbatim());
}

#[test]
fn mutable_access_of_other_kind_keeps_verbatim_text() {
    let mut node = Node::from("make");
    node.set_verbatim(Some(verbatim_item()));
    assert!(node.as_mapping_mut().is_none());
    assert!(node.is_verbatim());
}

#[test]
fn clones_are_independent() {
    let value = OperationValue::from(json!({"script": ["make"]}));
    let mut first = value.build().expect("build");
    let second = value.build().expect("build");
    first
        .as_mapping_mut()
        .and_then(|map| map.get_mut("script"))
        .and_then(Node::as_sequence_mut)
        .expect("script list")
        .push(Node::from("make install"));
    assert_eq!(second.to_json(), json!({"script": ["make"]}));
    assert_eq!(first.to_json(), json!({"script": ["make", "make install"]}));
}

#[test]
fn node_values_are_deep_copied() {
    let mut job = Mapping::new();
    job.insert("stage", Node::from("test"));
    let value = OperationValue::from(Node::from(job));
    let mut built = value.build().expect("build");
    built
        .as_mapping_mut()
        .expect("mapping")
        .insert("stage", Node::from("deploy"));
    let again = value.build().expect("build");
    assert_eq!(again.to_json(), json!({"stage": "test"}));
}

#[test]
fn json_objects_keep_insertion_order() {
    let node = Node::from_json(&json!({"zeta": 1, "alpha": 2, "mid": {"b": 1, "a": 2}}));
    let keys: Vec<&str> = node.as_mapping().map(|map| map.keys().collect()).unwrap_or_default();
    assert_eq!(keys, ["zeta", "alpha", "mid"]);
    assert_eq!(
        serde_json::to_string(&node.to_json()).expect("serialise"),
        r#"{"zeta":1,"alpha":2,"mid":{"b":1,"a":2}}"#
    );
}

#[test]
fn raw_values_keep_their_comments() {
    let node = OperationValue::raw("# Lint the sources\nstage: test\nscript:\n  - make lint\n")
        .build()
        .expect("raw value parses");
    assert_eq!(node.kind(), NodeKind::Mapping);
    assert_eq!(node.comment_text().as_deref(), Some("Lint the sources"));
    assert_eq!(
        node.to_json(),
        json!({"stage": "test", "script": ["make lint"]})
    );
}

#[rstest]
#[case("key: [unclosed\n")]
#[case("a: 1\na: 2\n")]
#[case("a: 1\n---\nb: 2\n")]
fn malformed_raw_values_fail(#[case] raw: &str) {
    let err = OperationValue::raw(raw).build().expect_err("must not parse");
    assert!(matches!(
        err.as_ref(),
        crate::WeaveError::ParseFailure { context, .. } if context == "raw value"
    ));
}

#[test]
fn take_comment_detaches_the_comment() {
    let mut node = Node::from("x").with_comment("gone");
    assert_eq!(node.take_comment().map(|c| c.text()).as_deref(), Some("gone"));
    assert!(node.comment().is_none());
}
