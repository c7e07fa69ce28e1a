//! Operation records and operation lists.

use std::sync::Arc;

use serde::{Deserialize, Deserializer};

use super::Strategy;
use crate::node::OperationValue;
use crate::path::DocPath;
use crate::{WeaveError, WeaveResult, WeaveResultExt};

const fn default_required() -> bool {
    true
}

/// Keeps an explicit `null` as a value; only a missing field is `None`.
fn present<'de, D>(deserializer: D) -> Result<Option<OperationValue>, D::Error>
where
    D: Deserializer<'de>,
{
    OperationValue::deserialize(deserializer).map(Some)
}

/// One declarative edit of a document.
///
/// Deserialises from `{path, operation, value?, required?}`; `required`
/// defaults to `true`.
#[derive(Clone, Debug, Deserialize)]
pub struct Operation {
    /// Dot-delimited path of the target node.
    pub path: String,
    /// What to do with the target.
    #[serde(rename = "operation")]
    pub strategy: Strategy,
    /// Value to write, merge or create. An explicit `null` is a value.
    #[serde(default, deserialize_with = "present")]
    pub value: Option<OperationValue>,
    /// Whether a target that is absent and cannot be created is an error.
    #[serde(default = "default_required")]
    pub required: bool,
}

impl Operation {
    /// A required operation.
    pub fn new(
        path: impl Into<String>,
        strategy: Strategy,
        value: Option<OperationValue>,
    ) -> Self {
        Self {
            path: path.into(),
            strategy,
            value,
            required: true,
        }
    }

    /// A required `set` of `value`.
    pub fn set(path: impl Into<String>, value: impl Into<OperationValue>) -> Self {
        Self::new(path, Strategy::Set, Some(value.into()))
    }

    /// A required `overwrite` with `value`.
    pub fn overwrite(path: impl Into<String>, value: impl Into<OperationValue>) -> Self {
        Self::new(path, Strategy::Overwrite, Some(value.into()))
    }

    /// A required `merge` of `value`.
    pub fn merge(path: impl Into<String>, value: impl Into<OperationValue>) -> Self {
        Self::new(path, Strategy::Merge, Some(value.into()))
    }

    /// A required `preserve` that creates the target from `value` when it is
    /// missing.
    pub fn preserve(path: impl Into<String>, value: impl Into<OperationValue>) -> Self {
        Self::new(path, Strategy::Preserve, Some(value.into()))
    }

    /// Mark the operation as not required.
    #[must_use]
    pub const fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Parse the operation's path.
    ///
    /// # Errors
    ///
    /// Returns [`WeaveError::InvalidPath`] for a malformed path.
    pub fn doc_path(&self) -> WeaveResult<DocPath> {
        DocPath::parse(&self.path)
    }
}

/// An ordered list of operations.
///
/// # Examples
///
/// ```
/// use pipeline_weaver::{OperationList, Strategy};
///
/// let list = OperationList::from_json_str(
///     r#"[{"path": "stages", "operation": "set", "value": ["build", "test"]}]"#,
/// )?;
/// assert_eq!(list.as_slice()[0].strategy, Strategy::Set);
/// assert!(list.as_slice()[0].required);
/// # Ok::<(), std::sync::Arc<pipeline_weaver::WeaveError>>(())
/// ```
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(transparent)]
pub struct OperationList {
    operations: Vec<Operation>,
}

impl OperationList {
    /// An empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON array of operations.
    ///
    /// # Errors
    ///
    /// Returns [`WeaveError::Serialization`] when the text is not a valid
    /// operation array.
    pub fn from_json_str(text: &str) -> WeaveResult<Self> {
        serde_json::from_str(text).into_weave()
    }

    /// Parse a YAML sequence of operations.
    ///
    /// Booleans follow YAML 1.2, so `required: yes` is rejected rather than
    /// read as `true`.
    ///
    /// # Errors
    ///
    /// Returns [`WeaveError::ParseFailure`] when the text is not a valid
    /// operation sequence.
    pub fn from_yaml_str(text: &str) -> WeaveResult<Self> {
        serde_saphyr::from_str_with_options(
            text,
            serde_saphyr::Options {
                strict_booleans: true,
                ..serde_saphyr::Options::default()
            },
        )
        .into_weave()
    }

    /// Append an operation.
    pub fn push(&mut self, operation: Operation) {
        self.operations.push(operation);
    }

    /// The operations in order.
    #[must_use]
    pub fn as_slice(&self) -> &[Operation] {
        &self.operations
    }

    /// Number of operations.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.operations.len()
    }

    /// Returns `true` when the list holds no operations.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Check every path up front.
    ///
    /// # Errors
    ///
    /// Returns every malformed path at once: a single
    /// [`WeaveError::InvalidPath`], or [`WeaveError::Aggregate`] when several
    /// paths are malformed.
    pub fn validate(&self) -> WeaveResult<()> {
        let errors: Vec<Arc<WeaveError>> = self
            .operations
            .iter()
            .filter_map(|operation| operation.doc_path().err())
            .collect();
        WeaveError::try_aggregate(errors).map_or(Ok(()), |err| Err(Arc::new(err)))
    }
}

impl From<Vec<Operation>> for OperationList {
    fn from(operations: Vec<Operation>) -> Self {
        Self { operations }
    }
}

impl FromIterator<Operation> for OperationList {
    fn from_iter<I: IntoIterator<Item = Operation>>(iter: I) -> Self {
        Self {
            operations: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a OperationList {
    type Item = &'a Operation;
    type IntoIter = std::slice::Iter<'a, Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.iter()
    }
}
