//! Preservation of user-authored entries in generator-managed collections.
//!
//! A managed collection is a mapping (such as the jobs of a pipeline) whose
//! entries are partly owned by the generator. [`preserve_collections`]
//! captures the entries the generator does not own, empties the
//! collection, runs the operation engine to rebuild the owned entries and
//! then appends the captured entries again.
//!
//! Captured entries are appended *after* every managed entry rather than
//! returned to their original absolute positions. Among themselves they
//! keep their original order, comments and source text.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::engine::{Operation, apply, synthesise};
use crate::node::{Node, NodeKind};
use crate::path::DocPath;
use crate::{WeaveError, WeaveResult};

/// Registry of the keys a generator owns in one collection.
///
/// A key is managed when it is *current* (produced by this run), *retired*
/// (produced by an earlier run but no longer) or starts with an owned
/// prefix. Every other key belongs to the user.
///
/// # Examples
///
/// ```
/// use pipeline_weaver::ManagedKeys;
///
/// let mut keys: ManagedKeys = ["build", "test"].into_iter().collect();
/// keys.add_prefix(".weaver-");
/// keys.retire(["deploy", "build"]);
/// assert!(keys.is_managed("deploy"));
/// assert!(keys.is_managed(".weaver-cache"));
/// assert!(!keys.is_managed("lint"));
/// assert_eq!(keys.retired().collect::<Vec<_>>(), ["deploy"]);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedKeys {
    #[serde(default)]
    current: BTreeSet<String>,
    #[serde(default)]
    retired: BTreeSet<String>,
    #[serde(default)]
    prefixes: Vec<String>,
}

impl ManagedKeys {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `key` as produced by the current run.
    pub fn insert(&mut self, key: impl Into<String>) {
        let owned = key.into();
        self.retired.remove(&owned);
        self.current.insert(owned);
    }

    /// Record keys produced by earlier runs. Keys that are current stay
    /// current.
    pub fn retire<I, K>(&mut self, keys: I)
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        for key in keys {
            let owned = key.into();
            if !self.current.contains(&owned) {
                self.retired.insert(owned);
            }
        }
    }

    /// Claim every key starting with `prefix`.
    pub fn add_prefix(&mut self, prefix: impl Into<String>) {
        self.prefixes.push(prefix.into());
    }

    /// Returns `true` when `key` belongs to the generator.
    #[must_use]
    pub fn is_managed(&self, key: &str) -> bool {
        self.current.contains(key)
            || self.retired.contains(key)
            || self.prefixes.iter().any(|prefix| key.starts_with(prefix.as_str()))
    }

    /// Keys produced by the current run, sorted.
    pub fn current(&self) -> impl Iterator<Item = &str> {
        self.current.iter().map(String::as_str)
    }

    /// Keys retired from earlier runs, sorted.
    pub fn retired(&self) -> impl Iterator<Item = &str> {
        self.retired.iter().map(String::as_str)
    }
}

impl<K: Into<String>> FromIterator<K> for ManagedKeys {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut keys = Self::new();
        for key in iter {
            keys.insert(key);
        }
        keys
    }
}

/// A collection path paired with its registry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ManagedCollection {
    /// Path of the collection mapping.
    pub path: String,
    /// Keys the generator owns in it.
    pub keys: ManagedKeys,
}

impl ManagedCollection {
    /// Pair `path` with `keys`.
    pub fn new(path: impl Into<String>, keys: ManagedKeys) -> Self {
        Self {
            path: path.into(),
            keys,
        }
    }
}

/// Rebuild the managed part of each collection while keeping user entries.
///
/// For every collection that already exists, entries whose keys are not
/// managed are captured and the collection is emptied. `operations` are
/// then applied, and the captured entries are appended to their collection,
/// recreating it as a mapping when the operations removed it.
///
/// # Errors
///
/// Returns [`WeaveError::InvalidPath`] for a malformed collection path,
/// [`WeaveError::NotAContainer`] when a collection is not a mapping, and any
/// error raised by [`apply`]. On error the document is partially modified
/// and must be discarded.
pub fn preserve_collections(
    document: &mut Document,
    collections: &[ManagedCollection],
    operations: &[Operation],
) -> WeaveResult<()> {
    let mut captured = Vec::with_capacity(collections.len());
    for collection in collections {
        let path = DocPath::parse(&collection.path)?;
        let preserved = extract(document, &path, &collection.keys)?;
        tracing::debug!(
            collection = %path,
            preserved = preserved.len(),
            "captured user entries"
        );
        captured.push((path, preserved));
    }
    apply(document, operations)?;
    for (path, preserved) in captured {
        restore(document, &path, preserved)?;
    }
    Ok(())
}

/// Empties the collection at `path`, returning its unmanaged entries.
fn extract(document: &mut Document, path: &DocPath, keys: &ManagedKeys) -> WeaveResult<Vec<(String, Node)>> {
    let Some(existing) = path.resolve(document.root())? else {
        return Ok(Vec::new());
    };
    ensure_mapping(path, existing)?;
    let entries = document
        .root_mut()
        .and_then(|root| path.resolve_mut(root))
        .and_then(Node::as_mapping_mut)
        .map(|map| map.drain())
        .unwrap_or_default();
    Ok(entries
        .into_iter()
        .filter(|(key, _)| !keys.is_managed(key))
        .collect())
}

/// Appends `preserved` to the collection at `path`.
fn restore(document: &mut Document, path: &DocPath, preserved: Vec<(String, Node)>) -> WeaveResult<()> {
    if preserved.is_empty() {
        return Ok(());
    }
    match path.resolve(document.root())? {
        Some(existing) => ensure_mapping(path, existing)?,
        None => synthesise(document, path, Node::mapping())?,
    }
    let Some(map) = document
        .root_mut()
        .and_then(|root| path.resolve_mut(root))
        .and_then(Node::as_mapping_mut)
    else {
        return Ok(());
    };
    for (key, node) in preserved {
        if map.remove(&key).is_some() {
            tracing::warn!(
                collection = %path,
                key = %key,
                "operations wrote an unmanaged key; keeping the user entry"
            );
        }
        map.insert(key, node);
    }
    Ok(())
}

fn ensure_mapping(path: &DocPath, node: &Node) -> WeaveResult<()> {
    if node.kind() == NodeKind::Mapping {
        return Ok(());
    }
    let segment = path
        .segments()
        .last()
        .map(ToString::to_string)
        .unwrap_or_default();
    Err(Arc::new(WeaveError::NotAContainer {
        path: path.to_string(),
        segment,
        found: node.kind(),
    }))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::{ManagedCollection, ManagedKeys, preserve_collections};
    use crate::document::Document;
    use crate::engine::Operation;
    use crate::WeaveError;

    fn keys(list: &[&str]) -> ManagedKeys {
        list.iter().copied().collect()
    }

    fn job_keys(document: &Document) -> Vec<String> {
        document
            .get("jobs")
            .expect("valid path")
            .and_then(|node| node.as_mapping())
            .map(|map| map.keys().map(str::to_owned).collect())
            .unwrap_or_default()
    }

    #[test]
    fn managed_entries_come_first_then_user_entries_in_order() {
        let mut document = Document::parse(
            "jobs:\n  u1: {a: 1}\n  m1: {old: true}\n  u2: {b: 2}\n  stale: {old: true}\n  u3: {c: 3}\n",
        )
        .expect("parses");
        let collections = [ManagedCollection::new("jobs", keys(&["m1", "stale"]))];
        let operations = [
            Operation::set("jobs.m1", json!({"new": true})),
            Operation::set("jobs.m2", json!({"new": true})),
        ];
        preserve_collections(&mut document, &collections, &operations).expect("pass succeeds");
        assert_eq!(job_keys(&document), ["m1", "m2", "u1", "u2", "u3"]);
    }

    #[test]
    fn missing_collection_is_created_by_operations_only() {
        let mut document = Document::parse("stages: [build]\n").expect("parses");
        let collections = [ManagedCollection::new("jobs", keys(&["build"]))];
        let operations = [Operation::set("jobs.build", json!({"stage": "build"}))];
        preserve_collections(&mut document, &collections, &operations).expect("pass succeeds");
        assert_eq!(job_keys(&document), ["build"]);
    }

    #[test]
    fn removed_collection_is_recreated_for_user_entries() {
        let mut document =
            Document::parse("pipeline:\n  jobs:\n    mine: {a: 1}\n    gen: {b: 2}\n").expect("parses");
        let collections = [ManagedCollection::new("pipeline.jobs", keys(&["gen"]))];
        let operations = [Operation::set("pipeline", json!({"version": 2}))];
        preserve_collections(&mut document, &collections, &operations).expect("pass succeeds");
        let pipeline = document.get("pipeline").expect("valid path").expect("pipeline exists");
        assert_eq!(
            pipeline.to_json(),
            json!({"version": 2, "jobs": {"mine": {"a": 1}}})
        );
    }

    #[test]
    fn collection_replaced_by_a_scalar_cannot_hold_user_entries() {
        let mut document = Document::parse("jobs:\n  mine: {a: 1}\n").expect("parses");
        let collections = [ManagedCollection::new("jobs", keys(&[]))];
        let operations = [Operation::set("jobs", json!("replaced"))];
        let err = preserve_collections(&mut document, &collections, &operations)
            .expect_err("a scalar cannot hold user entries");
        assert!(matches!(err.as_ref(), WeaveError::NotAContainer { .. }));
    }

    #[rstest]
    #[case("jobs: [a, b]\n")]
    #[case("jobs: text\n")]
    fn non_mapping_collections_are_rejected(#[case] text: &str) {
        let mut document = Document::parse(text).expect("parses");
        let collections = [ManagedCollection::new("jobs", keys(&[]))];
        let err = preserve_collections(&mut document, &collections, &[])
            .expect_err("collection must be a mapping");
        assert!(matches!(
            err.as_ref(),
            WeaveError::NotAContainer { segment, .. } if segment == "jobs"
        ));
    }

    #[test]
    fn engine_errors_abort_before_restoring() {
        let mut document = Document::parse("jobs:\n  mine: {a: 1}\n").expect("parses");
        let collections = [ManagedCollection::new("jobs", keys(&[]))];
        let operations = [Operation::merge("jobs", json!([1]))];
        let err = preserve_collections(&mut document, &collections, &operations)
            .expect_err("merge of a sequence into a mapping fails");
        assert!(matches!(
            err.as_ref(),
            WeaveError::IncompatibleMergeTarget { .. }
        ));
    }

    #[test]
    fn prefixed_keys_are_managed() {
        let mut document =
            Document::parse("jobs:\n  .gen-setup: {a: 1}\n  mine: {b: 2}\n").expect("parses");
        let mut registry = keys(&[]);
        registry.add_prefix(".gen-");
        let collections = [ManagedCollection::new("jobs", registry)];
        preserve_collections(&mut document, &collections, &[]).expect("pass succeeds");
        assert_eq!(job_keys(&document), ["mine"]);
    }

    #[test]
    fn registry_tracks_current_and_retired_keys() {
        let mut registry = keys(&["a"]);
        registry.retire(["a", "b"]);
        registry.insert("b");
        assert_eq!(registry.current().collect::<Vec<_>>(), ["a", "b"]);
        assert_eq!(registry.retired().count(), 0);
    }
}
