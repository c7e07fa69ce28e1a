//! Construction of nodes from plain values and raw YAML fragments.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::{Mapping, Node, Scalar};
use crate::{Document, WeaveResult};

impl Node {
    /// Build a node tree from a plain JSON value.
    ///
    /// Objects become mappings in their insertion order, arrays become
    /// sequences and everything else becomes a scalar. Integers outside the
    /// `i64` range are stored as floats.
    ///
    /// # Examples
    ///
    /// ```
    /// use pipeline_weaver::Node;
    /// use serde_json::json;
    ///
    /// let node = Node::from_json(&json!({"b": 1, "a": [true, null]}));
    /// let keys: Vec<&str> = node.as_mapping().map(|m| m.keys().collect()).unwrap_or_default();
    /// assert_eq!(keys, ["b", "a"]);
    /// ```
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::null(),
            Value::Bool(flag) => Self::scalar(*flag),
            Value::Number(number) => Self::scalar(number.as_i64().map_or_else(
                || Scalar::Float(number.as_f64().unwrap_or(f64::NAN)),
                Scalar::Int,
            )),
            Value::String(text) => Self::scalar(text.as_str()),
            Value::Array(items) => Self::sequence(items.iter().map(Self::from_json).collect()),
            Value::Object(map) => Self::from(
                map.iter()
                    .map(|(key, value)| (key.clone(), Self::from_json(value)))
                    .collect::<Mapping>(),
            ),
        }
    }

    /// Build a node from a raw YAML fragment.
    ///
    /// The fragment is parsed as a standalone document and its root content
    /// node is returned. Comment lines leading the fragment become the
    /// returned node's comment, and every entry keeps its source text.
    ///
    /// # Errors
    ///
    /// Returns [`crate::WeaveError::ParseFailure`] when the fragment is not
    /// well-formed YAML or holds no content.
    ///
    /// # Examples
    ///
    /// ```
    /// use pipeline_weaver::Node;
    ///
    /// let node = Node::from_yaml_fragment("# lint job\nscript: make lint\n")?;
    /// assert_eq!(node.comment_text().as_deref(), Some("lint job"));
    /// # Ok::<_, std::sync::Arc<pipeline_weaver::WeaveError>>(())
    /// ```
    pub fn from_yaml_fragment(raw: &str) -> WeaveResult<Self> {
        Document::parse_with_context(raw, "raw value")?.into_content()
    }
}

impl From<&Value> for Node {
    fn from(value: &Value) -> Self {
        Self::from_json(value)
    }
}

/// The value carried by an operation.
///
/// Deserialised operation lists always carry [`OperationValue::Plain`]
/// values; the other variants are for generators working in code.
#[derive(Clone, Debug)]
pub enum OperationValue {
    /// A plain value built into a fresh node tree.
    Plain(Value),
    /// An already-built node, deep-copied on every use.
    Node(Node),
    /// Raw YAML text parsed on every use.
    Raw(String),
}

impl OperationValue {
    /// Build a fresh, independently owned node for this value.
    ///
    /// Each call returns a new tree, so one value can feed several operations
    /// without any of them observing edits made through another.
    ///
    /// # Errors
    ///
    /// Returns [`crate::WeaveError::ParseFailure`] when a raw value is not
    /// well-formed YAML.
    pub fn build(&self) -> WeaveResult<Node> {
        match self {
            Self::Plain(value) => Ok(Node::from_json(value)),
            Self::Node(node) => Ok(node.clone()),
            Self::Raw(raw) => Node::from_yaml_fragment(raw),
        }
    }

    /// Wrap raw YAML text.
    #[must_use]
    pub fn raw(text: impl Into<String>) -> Self {
        Self::Raw(text.into())
    }
}

impl From<Value> for OperationValue {
    fn from(value: Value) -> Self {
        Self::Plain(value)
    }
}

impl From<Node> for OperationValue {
    fn from(node: Node) -> Self {
        Self::Node(node)
    }
}

impl From<&str> for OperationValue {
    fn from(text: &str) -> Self {
        Self::Plain(Value::String(text.to_owned()))
    }
}

impl<'de> Deserialize<'de> for OperationValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer).map(Self::Plain)
    }
}
