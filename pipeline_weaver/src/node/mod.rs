//! In-memory document tree.
//!
//! A [`Node`] is a mapping, a sequence or a scalar. Besides its value every
//! node carries the presentation details that must survive regeneration: the
//! comment written above it, an optional YAML tag, and layout hints recorded
//! by the parser. The most important hint is the node's *verbatim* source
//! text: an untouched node is emitted exactly as it was read. Any mutable
//! access to a node's contents discards that text, so edits always show up in
//! the output while untouched siblings keep their original bytes.

mod builder;
mod comment;
mod mapping;
mod scalar;

use std::fmt;

use serde_json::Value;

pub use builder::OperationValue;
pub use comment::Comment;
pub use mapping::Mapping;
pub use scalar::Scalar;

pub(crate) use scalar::{Rendered, render_key, resolve_plain};

/// The three kinds of node in a document tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Ordered key to node map.
    Mapping,
    /// Ordered list of nodes.
    Sequence,
    /// Leaf value.
    Scalar,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Mapping => "mapping",
            Self::Sequence => "sequence",
            Self::Scalar => "scalar",
        })
    }
}

#[derive(Clone, Debug)]
enum Content {
    Mapping(Mapping),
    Sequence(Vec<Node>),
    Scalar(Scalar),
}

/// Original source text of a node, recorded relative to the line that
/// introduces it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Verbatim {
    /// Value of a block mapping entry: `{key_text}:{head}` then `body`.
    Entry {
        key: String,
        key_text: String,
        head: String,
        body: Vec<String>,
    },
    /// Item of a block sequence: `-{head}` then `body`.
    Item { head: String, body: Vec<String> },
}

#[derive(Clone, Debug, Default)]
struct Layout {
    blank_lines_before: usize,
    verbatim: Option<Verbatim>,
}

/// A node of the document tree.
///
/// Nodes own their children, so cloning a node deep-copies the subtree and no
/// two locations of a tree can ever share mutable state.
///
/// # Examples
///
/// ```
/// use pipeline_weaver::{Mapping, Node};
///
/// let mut job = Mapping::new();
/// job.insert("stage", Node::from("test"));
/// let node = Node::from(job).with_comment("generated");
/// assert_eq!(node.comment_text().as_deref(), Some("generated"));
/// assert_eq!(node.as_mapping().map(Mapping::len), Some(1));
/// ```
#[derive(Clone, Debug)]
pub struct Node {
    content: Content,
    comment: Option<Comment>,
    tag: Option<String>,
    layout: Layout,
}

impl Node {
    fn with_content(content: Content) -> Self {
        Self {
            content,
            comment: None,
            tag: None,
            layout: Layout::default(),
        }
    }

    /// An empty mapping node.
    #[must_use]
    pub fn mapping() -> Self {
        Self::with_content(Content::Mapping(Mapping::new()))
    }

    /// A sequence node holding `items`.
    #[must_use]
    pub fn sequence(items: Vec<Self>) -> Self {
        Self::with_content(Content::Sequence(items))
    }

    /// A scalar node.
    #[must_use]
    pub fn scalar(value: impl Into<Scalar>) -> Self {
        Self::with_content(Content::Scalar(value.into()))
    }

    /// A null scalar node.
    #[must_use]
    pub fn null() -> Self {
        Self::scalar(Scalar::Null)
    }

    /// Returns the kind of this node.
    #[must_use]
    pub const fn kind(&self) -> NodeKind {
        match self.content {
            Content::Mapping(_) => NodeKind::Mapping,
            Content::Sequence(_) => NodeKind::Sequence,
            Content::Scalar(_) => NodeKind::Scalar,
        }
    }

    /// Borrow the entries of a mapping node.
    #[must_use]
    pub const fn as_mapping(&self) -> Option<&Mapping> {
        match &self.content {
            Content::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// Mutably borrow the entries of a mapping node.
    ///
    /// The node's verbatim source text is discarded.
    pub fn as_mapping_mut(&mut self) -> Option<&mut Mapping> {
        match &mut self.content {
            Content::Mapping(map) => {
                self.layout.verbatim = None;
                Some(map)
            }
            _ => None,
        }
    }

    /// Borrow the items of a sequence node.
    #[must_use]
    pub fn as_sequence(&self) -> Option<&[Self]> {
        match &self.content {
            Content::Sequence(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// Mutably borrow the items of a sequence node.
    ///
    /// The node's verbatim source text is discarded.
    pub fn as_sequence_mut(&mut self) -> Option<&mut Vec<Self>> {
        match &mut self.content {
            Content::Sequence(items) => {
                self.layout.verbatim = None;
                Some(items)
            }
            _ => None,
        }
    }

    /// Borrow the value of a scalar node.
    #[must_use]
    pub const fn as_scalar(&self) -> Option<&Scalar> {
        match &self.content {
            Content::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }

    /// Borrow the text of a string scalar.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.as_scalar().and_then(Scalar::as_str)
    }

    /// The comment written above this node, if any.
    #[must_use]
    pub const fn comment(&self) -> Option<&Comment> {
        self.comment.as_ref()
    }

    /// The comment text without `#` markers.
    #[must_use]
    pub fn comment_text(&self) -> Option<String> {
        self.comment.as_ref().map(Comment::text)
    }

    /// Replace the comment above this node.
    pub fn set_comment(&mut self, comment: Option<Comment>) {
        self.comment = comment;
    }

    /// Remove and return the comment above this node.
    pub fn take_comment(&mut self) -> Option<Comment> {
        self.comment.take()
    }

    /// Builder-style variant of [`Node::set_comment`] taking plain text.
    #[must_use]
    pub fn with_comment(mut self, text: &str) -> Self {
        self.comment = Some(Comment::new(text));
        self
    }

    /// The YAML tag of this node (for example `!reference`).
    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// Attach a YAML tag written in source form, such as `!reference`.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self.layout.verbatim = None;
        self
    }

    /// Number of blank lines emitted above this node.
    #[must_use]
    pub const fn blank_lines_before(&self) -> usize {
        self.layout.blank_lines_before
    }

    /// Set the number of blank lines emitted above this node.
    pub const fn set_blank_lines_before(&mut self, count: usize) {
        self.layout.blank_lines_before = count;
    }

    /// Returns `true` when the node will be emitted from its original source
    /// text.
    #[must_use]
    pub const fn is_verbatim(&self) -> bool {
        self.layout.verbatim.is_some()
    }

    pub(crate) const fn verbatim(&self) -> Option<&Verbatim> {
        self.layout.verbatim.as_ref()
    }

    pub(crate) fn set_verbatim(&mut self, verbatim: Option<Verbatim>) {
        self.layout.verbatim = verbatim;
    }

    /// Copies the entry-level presentation (comment and spacing) of `previous`
    /// onto `self` when `self` has no comment of its own.
    pub(crate) fn inherit_presentation(&mut self, previous: &Self) {
        if self.comment.is_none() {
            self.comment.clone_from(&previous.comment);
            self.layout.blank_lines_before = previous.layout.blank_lines_before;
        }
    }

    /// Structural equality that ignores comments and layout.
    ///
    /// Mappings compare equal when they hold the same keys with equal values,
    /// regardless of key order.
    #[must_use]
    pub fn value_eq(&self, other: &Self) -> bool {
        if self.tag != other.tag {
            return false;
        }
        match (&self.content, &other.content) {
            (Content::Scalar(a), Content::Scalar(b)) => a == b,
            (Content::Sequence(a), Content::Sequence(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.value_eq(y))
            }
            (Content::Mapping(a), Content::Mapping(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(key, value)| b.get(key).is_some_and(|other| value.value_eq(other)))
            }
            _ => false,
        }
    }

    /// Convert the tree into a JSON value, dropping comments, tags and
    /// layout.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match &self.content {
            Content::Scalar(scalar) => scalar.to_json(),
            Content::Sequence(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            Content::Mapping(map) => Value::Object(
                map.iter()
                    .map(|(key, value)| (key.to_owned(), value.to_json()))
                    .collect(),
            ),
        }
    }
}

impl From<Mapping> for Node {
    fn from(map: Mapping) -> Self {
        Self::with_content(Content::Mapping(map))
    }
}

impl From<Vec<Node>> for Node {
    fn from(items: Vec<Node>) -> Self {
        Self::sequence(items)
    }
}

impl From<Scalar> for Node {
    fn from(scalar: Scalar) -> Self {
        Self::scalar(scalar)
    }
}

impl From<&str> for Node {
    fn from(text: &str) -> Self {
        Self::scalar(text)
    }
}

impl From<String> for Node {
    fn from(text: String) -> Self {
        Self::scalar(text)
    }
}

impl From<bool> for Node {
    fn from(flag: bool) -> Self {
        Self::scalar(flag)
    }
}

impl From<i64> for Node {
    fn from(number: i64) -> Self {
        Self::scalar(number)
    }
}

#[cfg(test)]
mod tests;
