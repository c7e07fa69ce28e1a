//! Operation dispatch.

use std::sync::Arc;

use super::merge::merge_into;
use super::{Operation, Strategy};
use crate::document::Document;
use crate::node::{Node, NodeKind};
use crate::path::{DocPath, Segment};
use crate::{WeaveError, WeaveResult};

/// Apply `operations` to `document` in order.
///
/// The document is modified in place. On error the operations before the
/// failing one have already been applied, so callers that must not persist
/// a partial result should discard the document.
///
/// # Errors
///
/// Returns the first [`WeaveError`] raised by an operation: a malformed
/// path, a missing required target, a missing value, a walk through a
/// scalar, or an incompatible merge.
///
/// # Examples
///
/// ```
/// use pipeline_weaver::{Document, Operation, apply};
/// use serde_json::json;
///
/// let mut document = Document::parse("stages:\n  - build\n")?;
/// apply(&mut document, &[Operation::merge("stages", json!(["build", "test"]))])?;
/// assert_eq!(document.to_yaml_string(), "stages:\n  - build\n  - test\n");
/// # Ok::<(), std::sync::Arc<pipeline_weaver::WeaveError>>(())
/// ```
pub fn apply(document: &mut Document, operations: &[Operation]) -> WeaveResult<()> {
    for operation in operations {
        apply_one(document, operation)?;
    }
    Ok(())
}

fn apply_one(document: &mut Document, operation: &Operation) -> WeaveResult<()> {
    let path = operation.doc_path()?;
    let present = path.resolve(document.root())?.is_some();
    tracing::debug!(
        path = %path,
        strategy = %operation.strategy,
        required = operation.required,
        present,
        "applying operation"
    );
    if !present {
        return create_missing(document, operation, &path);
    }
    match operation.strategy {
        Strategy::Preserve => Ok(()),
        Strategy::Set | Strategy::Overwrite => {
            let mut node = build_value(operation)?;
            let target = target_mut(document, operation, &path)?;
            node.inherit_presentation(target);
            *target = node;
            Ok(())
        }
        Strategy::Merge => {
            let incoming = build_value(operation)?;
            let target = target_mut(document, operation, &path)?;
            merge_into(target, incoming, &path)
        }
    }
}

/// Handles an absent target: the required check runs before any strategy.
fn create_missing(document: &mut Document, operation: &Operation, path: &DocPath) -> WeaveResult<()> {
    if !operation.required && matches!(operation.strategy, Strategy::Merge | Strategy::Preserve) {
        return Ok(());
    }
    let Some(value) = &operation.value else {
        return if operation.required {
            Err(Arc::new(WeaveError::MissingRequiredTarget {
                path: path.to_string(),
                strategy: operation.strategy,
            }))
        } else {
            Ok(())
        };
    };
    let node = value.build()?;
    synthesise(document, path, node)
}

fn build_value(operation: &Operation) -> WeaveResult<Node> {
    operation.value.as_ref().map_or_else(
        || {
            Err(Arc::new(WeaveError::MissingValue {
                path: operation.path.clone(),
                strategy: operation.strategy,
            }))
        },
        |value| value.build(),
    )
}

/// Mutable walk to a target already known to exist.
fn target_mut<'d>(
    document: &'d mut Document,
    operation: &Operation,
    path: &DocPath,
) -> WeaveResult<&'d mut Node> {
    document
        .root_mut()
        .and_then(|root| path.resolve_mut(root))
        .ok_or_else(|| {
            Arc::new(WeaveError::MissingRequiredTarget {
                path: path.to_string(),
                strategy: operation.strategy,
            })
        })
}

/// The container created for a missing parent of `next`.
fn container_for(next: &Segment) -> Node {
    match next {
        Segment::Index(_) => Node::sequence(Vec::new()),
        Segment::Key(_) => Node::mapping(),
    }
}

/// Create the absent target at `path`, building intermediate containers.
pub(crate) fn synthesise(document: &mut Document, path: &DocPath, node: Node) -> WeaveResult<()> {
    let Some((last, parents)) = path.split_last() else {
        return Err(Arc::new(WeaveError::invalid_path(path.as_str(), "path is empty")));
    };
    let first = parents.first().unwrap_or(last);
    let mut current = document.root_slot().get_or_insert_with(|| container_for(first));
    for (index, segment) in parents.iter().enumerate() {
        let next = parents.get(index + 1).unwrap_or(last);
        let kind = current.kind();
        current = match (kind, current.as_mapping_mut()) {
            (NodeKind::Mapping, Some(map)) => {
                map.get_or_insert_with(&segment.key(), || container_for(next))
            }
            _ => return Err(path.not_a_container(kind, segment)),
        };
    }
    let kind = current.kind();
    if let Some(map) = current.as_mapping_mut() {
        map.insert(last.key(), node);
        return Ok(());
    }
    match (current.as_sequence_mut(), last) {
        (Some(items), Segment::Index(index)) if *index == items.len() => {
            items.push(node);
            Ok(())
        }
        (Some(items), Segment::Index(index)) => Err(Arc::new(WeaveError::invalid_path(
            path.as_str(),
            format!("index {index} is past the end of a sequence of length {}", items.len()),
        ))),
        _ => Err(path.not_a_container(kind, last)),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::apply;
    use crate::document::Document;
    use crate::engine::Operation;
    use crate::node::NodeKind;
    use crate::WeaveError;

    fn applied(text: &str, operations: &[Operation]) -> Document {
        let mut document = Document::parse(text).expect("fixture parses");
        apply(&mut document, operations).expect("operations apply");
        document
    }

    #[test]
    fn later_operations_see_earlier_structure() {
        let document = applied(
            "",
            &[
                Operation::set("stages", json!([])),
                Operation::set("stages.0", json!("build")),
                Operation::set("stages.1", json!("test")),
            ],
        );
        assert_eq!(document.to_yaml_string(), "stages:\n  - build\n  - test\n");
    }

    #[test]
    fn trailing_index_creates_a_sequence_parent() {
        let document = applied("", &[Operation::set("jobs.build.script.0", json!("make"))]);
        let script = document.get("jobs.build.script").expect("valid path").expect("created");
        assert_eq!(script.kind(), NodeKind::Sequence);
        assert_eq!(script.to_json(), json!(["make"]));
    }

    #[test]
    fn index_past_the_end_is_rejected() {
        let mut document = Document::parse("stages: [build]\n").expect("parses");
        let err = apply(&mut document, &[Operation::set("stages.3", json!("late"))])
            .expect_err("only appending is allowed");
        assert!(matches!(
            err.as_ref(),
            WeaveError::InvalidPath { reason, .. } if reason.contains("past the end")
        ));
    }

    #[rstest]
    #[case("image: rust\n", "image.name")]
    #[case("stages: [build]\n", "stages.first")]
    fn walking_through_leaves_is_not_a_container(#[case] text: &str, #[case] path: &str) {
        let mut document = Document::parse(text).expect("parses");
        let err = apply(&mut document, &[Operation::set(path, json!(1))])
            .expect_err("cannot descend");
        assert!(matches!(err.as_ref(), WeaveError::NotAContainer { .. }));
    }

    #[test]
    fn numeric_index_on_a_mapping_is_a_key() {
        let document = applied("codes:\n  404: missing\n", &[Operation::set("codes.404", json!("gone"))]);
        assert_eq!(document.to_yaml_string(), "codes:\n  \"404\": gone\n");
    }

    #[test]
    fn replacement_keeps_the_entry_comment() {
        let document = applied(
            "a: 1\n\n# the build image\nimage: old\n",
            &[Operation::overwrite("image", json!("new"))],
        );
        assert_eq!(document.to_yaml_string(), "a: 1\n\n# the build image\nimage: new\n");
    }

    #[test]
    fn present_targets_need_a_value_to_write() {
        let mut document = Document::parse("image: old\n").expect("parses");
        let operation = Operation::new("image", crate::engine::Strategy::Set, None);
        let err = apply(&mut document, &[operation]).expect_err("no value");
        assert!(matches!(err.as_ref(), WeaveError::MissingValue { .. }));
    }

    #[test]
    fn untouched_siblings_keep_their_text() {
        let document = applied(
            "keep:   {x: 1}   # odd spacing\nchange: 1\n",
            &[Operation::set("change", json!(2))],
        );
        assert_eq!(document.to_yaml_string(), "keep:   {x: 1}   # odd spacing\nchange: 2\n");
    }
}
