//! Unit tests for error construction and aggregation behaviour.

use rstest::rstest;
use std::sync::Arc;

use super::WeaveError;
use crate::engine::Strategy;
use crate::node::NodeKind;

#[test]
fn try_aggregate_returns_none_for_no_errors() {
    assert!(WeaveError::try_aggregate(Vec::<WeaveError>::new()).is_none());
}

#[test]
fn single_owned_error_is_unwrapped() {
    let outcome = WeaveError::try_aggregate(vec![WeaveError::invalid_path("", "empty")]);
    assert!(
        matches!(outcome, Some(WeaveError::InvalidPath { .. })),
        "expected InvalidPath, got {outcome:?}"
    );
}

#[test]
fn single_shared_error_is_wrapped() {
    let shared = Arc::new(WeaveError::invalid_path("", "empty"));
    let outcome = WeaveError::try_aggregate(vec![Arc::clone(&shared)]);
    match outcome {
        Some(WeaveError::Aggregate(agg)) => assert_eq!(agg.len(), 1),
        other => panic!("expected Aggregate, got {other:?}"),
    }
}

#[test]
fn aggregate_display_numbers_entries() {
    let err = WeaveError::try_aggregate(vec![
        WeaveError::invalid_path("a..b", "empty segment"),
        WeaveError::invalid_path("", "path is empty"),
    ]);
    let text = err.map(|e| e.to_string()).unwrap_or_default();
    assert!(text.contains("1: invalid path 'a..b'"), "{text}");
    assert!(text.contains("2: invalid path ''"), "{text}");
}

#[rstest]
#[case(WeaveError::invalid_path("x", "bad"), true)]
#[case(
    WeaveError::MissingRequiredTarget { path: "x".into(), strategy: Strategy::Preserve },
    true
)]
#[case(
    WeaveError::IncompatibleMergeTarget {
        path: "x".into(),
        existing: NodeKind::Scalar,
        incoming: NodeKind::Mapping,
    },
    true
)]
#[case(WeaveError::parse_failure("raw value", "boom"), false)]
fn classifies_engine_errors(#[case] err: WeaveError, #[case] expected: bool) {
    assert_eq!(err.is_engine_error(), expected);
}

#[test]
fn incompatible_merge_message_names_both_kinds() {
    let err = WeaveError::IncompatibleMergeTarget {
        path: "jobs.build".into(),
        existing: NodeKind::Scalar,
        incoming: NodeKind::Mapping,
    };
    assert_eq!(
        err.to_string(),
        "cannot merge mapping into scalar at 'jobs.build'"
    );
}
