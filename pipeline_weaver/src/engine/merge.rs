//! Structural merge of one node into another.

use std::sync::Arc;

use crate::node::{Node, NodeKind};
use crate::path::DocPath;
use crate::{WeaveError, WeaveResult};

/// Merge `incoming` into `target`.
///
/// Mappings are unioned: existing keys keep their positions, new keys are
/// appended in the order `incoming` lists them, and shared keys recurse when
/// both sides are mappings or both are sequences. Otherwise the incoming
/// value wins. Sequences keep their items and gain every incoming item that
/// is not value-equal to one already present.
///
/// A merge that would not change the value leaves `target` untouched, so its
/// source text survives.
pub(super) fn merge_into(target: &mut Node, incoming: Node, path: &DocPath) -> WeaveResult<()> {
    match (target.kind(), incoming.kind()) {
        (NodeKind::Mapping, NodeKind::Mapping) | (NodeKind::Sequence, NodeKind::Sequence) => {
            merge_nodes(target, incoming);
            Ok(())
        }
        (existing, incoming) => Err(Arc::new(WeaveError::IncompatibleMergeTarget {
            path: path.to_string(),
            existing,
            incoming,
        })),
    }
}

/// Merge two nodes of the same collection kind.
fn merge_nodes(target: &mut Node, incoming: Node) {
    if !changes(target, &incoming) {
        return;
    }
    match target.kind() {
        NodeKind::Mapping => merge_mappings(target, incoming),
        NodeKind::Sequence => merge_sequences(target, incoming),
        NodeKind::Scalar => {}
    }
}

/// Returns `true` when merging `incoming` would alter `target`.
fn changes(target: &Node, incoming: &Node) -> bool {
    if let (Some(existing), Some(entries)) = (target.as_mapping(), incoming.as_mapping()) {
        return entries.iter().any(|(key, value)| {
            existing.get(key).is_none_or(|present| {
                if is_same_collection(present, value) {
                    changes(present, value)
                } else {
                    !present.value_eq(value)
                }
            })
        });
    }
    if let (Some(existing), Some(items)) = (target.as_sequence(), incoming.as_sequence()) {
        return items
            .iter()
            .any(|item| !existing.iter().any(|present| present.value_eq(item)));
    }
    !target.value_eq(incoming)
}

fn is_same_collection(a: &Node, b: &Node) -> bool {
    a.kind() == b.kind() && a.kind() != NodeKind::Scalar
}

fn merge_mappings(target: &mut Node, mut incoming: Node) {
    let entries = incoming.as_mapping_mut().map(|map| map.drain()).unwrap_or_default();
    let Some(map) = target.as_mapping_mut() else {
        return;
    };
    for (key, mut value) in entries {
        let Some(existing) = map.get_mut(&key) else {
            map.insert(key, value);
            continue;
        };
        if is_same_collection(existing, &value) {
            merge_nodes(existing, value);
        } else if !existing.value_eq(&value) {
            value.inherit_presentation(existing);
            *existing = value;
        }
    }
}

fn merge_sequences(target: &mut Node, incoming: Node) {
    let existing = target.as_sequence().unwrap_or_default();
    let fresh: Vec<Node> = incoming
        .as_sequence()
        .unwrap_or_default()
        .iter()
        .filter(|item| !existing.iter().any(|present| present.value_eq(item)))
        .cloned()
        .collect();
    if fresh.is_empty() {
        return;
    }
    if let Some(items) = target.as_sequence_mut() {
        items.extend(fresh);
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::{Value, json};

    use super::merge_into;
    use crate::WeaveError;
    use crate::node::{Node, NodeKind};
    use crate::path::DocPath;

    fn merged(existing: &Value, incoming: &Value) -> Value {
        let mut target = Node::from_json(existing);
        let path = DocPath::parse("target").expect("path parses");
        merge_into(&mut target, Node::from_json(incoming), &path).expect("merge succeeds");
        target.to_json()
    }

    #[test]
    fn mapping_merge_keeps_existing_positions_and_appends_new_keys() {
        let result = merged(&json!({"b": 1, "a": 2}), &json!({"c": 3, "a": 4, "d": 5}));
        let keys: Vec<&String> = result.as_object().map(|m| m.keys().collect()).unwrap_or_default();
        assert_eq!(keys, ["b", "a", "c", "d"]);
        assert_eq!(result, json!({"b": 1, "a": 4, "c": 3, "d": 5}));
    }

    #[test]
    fn mapping_merge_recurses_into_shared_collections() {
        let result = merged(
            &json!({"variables": {"A": "1"}, "stages": ["build"]}),
            &json!({"variables": {"B": "2"}, "stages": ["build", "test"]}),
        );
        assert_eq!(
            result,
            json!({"variables": {"A": "1", "B": "2"}, "stages": ["build", "test"]})
        );
    }

    #[test]
    fn mapping_merge_lets_incoming_win_across_kinds() {
        let result = merged(&json!({"cache": {"key": "x"}}), &json!({"cache": ["a"]}));
        assert_eq!(result, json!({"cache": ["a"]}));
    }

    #[rstest]
    #[case(json!(["a", "b"]), json!(["b", "c", "a", "d"]), json!(["a", "b", "c", "d"]))]
    #[case(json!([{"x": 1, "y": 2}]), json!([{"y": 2, "x": 1}, {"x": 3}]), json!([{"x": 1, "y": 2}, {"x": 3}]))]
    #[case(json!([]), json!(["a", "a"]), json!(["a", "a"]))]
    fn sequence_merge_drops_items_already_present(
        #[case] existing: Value,
        #[case] incoming: Value,
        #[case] expected: Value,
    ) {
        assert_eq!(merged(&existing, &incoming), expected);
    }

    #[rstest]
    #[case(json!({"a": 1}), json!(["a"]), NodeKind::Mapping, NodeKind::Sequence)]
    #[case(json!(["a"]), json!({"a": 1}), NodeKind::Sequence, NodeKind::Mapping)]
    #[case(json!("text"), json!({"a": 1}), NodeKind::Scalar, NodeKind::Mapping)]
    #[case(json!({"a": 1}), json!(3), NodeKind::Mapping, NodeKind::Scalar)]
    fn rejects_mismatched_kinds(
        #[case] existing: Value,
        #[case] incoming: Value,
        #[case] existing_kind: NodeKind,
        #[case] incoming_kind: NodeKind,
    ) {
        let mut target = Node::from_json(&existing);
        let path = DocPath::parse("jobs.build").expect("path parses");
        let err = merge_into(&mut target, Node::from_json(&incoming), &path)
            .expect_err("merge must fail");
        match err.as_ref() {
            WeaveError::IncompatibleMergeTarget {
                path,
                existing,
                incoming,
            } => {
                assert_eq!(path, "jobs.build");
                assert_eq!(*existing, existing_kind);
                assert_eq!(*incoming, incoming_kind);
            }
            other => panic!("expected IncompatibleMergeTarget, got {other:?}"),
        }
        assert_eq!(target.to_json(), existing);
    }
}
