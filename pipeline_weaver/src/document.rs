//! Whole YAML documents.

use std::sync::Arc;

use crate::node::{Comment, Node};
use crate::path::DocPath;
use crate::yaml::{emit_document, parse_document};
use crate::{WeaveError, WeaveResult};

/// A YAML document: an optional root node framed by the verbatim lines that
/// precede and follow it.
///
/// The prologue holds header comments, directives and `---` markers found
/// before the first entry; the trailer holds comments after the last one.
/// Both are written back unchanged. A document read with `\r\n` line
/// breaks is written with them too.
///
/// # Examples
///
/// ```
/// use pipeline_weaver::Document;
///
/// let text = "# CI pipeline\n\nstages:\n  - build # first\n";
/// let document = Document::parse(text)?;
/// assert_eq!(document.to_yaml_string(), text);
/// # Ok::<(), std::sync::Arc<pipeline_weaver::WeaveError>>(())
/// ```
#[derive(Clone, Debug, Default)]
pub struct Document {
    prologue: Vec<String>,
    root: Option<Node>,
    trailer: Vec<String>,
    crlf: bool,
}

impl Document {
    /// An empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A document holding `root` and nothing else.
    #[must_use]
    pub fn from_root(root: Node) -> Self {
        Self {
            root: Some(root),
            ..Self::default()
        }
    }

    pub(crate) const fn from_parts(prologue: Vec<String>, root: Option<Node>, trailer: Vec<String>) -> Self {
        Self {
            prologue,
            root,
            trailer,
            crlf: false,
        }
    }

    pub(crate) const fn with_crlf(mut self, crlf: bool) -> Self {
        self.crlf = crlf;
        self
    }

    /// Parse YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`WeaveError::ParseFailure`] for malformed YAML, for more than
    /// one document, for duplicate keys and for non-scalar keys.
    pub fn parse(text: &str) -> WeaveResult<Self> {
        Self::parse_with_context(text, "document")
    }

    /// Parse YAML text, naming the input as `context` in errors.
    ///
    /// # Errors
    ///
    /// See [`Document::parse`].
    pub fn parse_with_context(text: &str, context: &str) -> WeaveResult<Self> {
        parse_document(text, context)
    }

    /// The root node, if the document has content.
    #[must_use]
    pub const fn root(&self) -> Option<&Node> {
        self.root.as_ref()
    }

    /// Mutable access to the root node.
    pub const fn root_mut(&mut self) -> Option<&mut Node> {
        self.root.as_mut()
    }

    /// Replace the root node, returning the previous one.
    pub fn set_root(&mut self, root: Node) -> Option<Node> {
        self.root.replace(root)
    }

    pub(crate) const fn root_slot(&mut self) -> &mut Option<Node> {
        &mut self.root
    }

    /// Returns `true` when the document has no root node.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Lines written before the root node.
    #[must_use]
    pub fn prologue(&self) -> &[String] {
        &self.prologue
    }

    /// Lines written after the root node.
    #[must_use]
    pub fn trailer(&self) -> &[String] {
        &self.trailer
    }

    /// Returns `true` when the document is written with `\r\n` line breaks.
    #[must_use]
    pub const fn uses_crlf(&self) -> bool {
        self.crlf
    }

    /// Look up the node at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`WeaveError::InvalidPath`] for a malformed path and
    /// [`WeaveError::NotAContainer`] when the path walks through a scalar.
    pub fn get(&self, path: &str) -> WeaveResult<Option<&Node>> {
        DocPath::parse(path)?.resolve(self.root.as_ref())
    }

    /// Take the root node as a standalone value.
    ///
    /// The comment lines of the prologue, followed by the comment of the
    /// first entry or item, become the comment of the returned node.
    ///
    /// # Errors
    ///
    /// Returns [`WeaveError::ParseFailure`] when the document has no content.
    pub fn into_content(self) -> WeaveResult<Node> {
        let Self {
            prologue,
            root: slot,
            ..
        } = self;
        let mut root = slot.ok_or_else(|| {
            Arc::new(WeaveError::parse_failure("raw value", "document has no content"))
        })?;
        let header: Vec<Option<String>> = prologue
            .iter()
            .filter_map(|line| {
                let trimmed = line.trim_start();
                if trimmed.is_empty() {
                    Some(None)
                } else {
                    trimmed.strip_prefix('#').map(|body| Some(body.to_owned()))
                }
            })
            .skip_while(Option::is_none)
            .collect();
        let first = first_child_comment(&mut root);
        let mut comment = (!header.is_empty()).then(|| Comment::from_source(header));
        if let Some(first) = first {
            match comment.as_mut() {
                Some(existing) => existing.extend(first),
                None => comment = Some(first),
            }
        }
        if comment.is_some() && root.comment().is_none() {
            root.set_comment(comment);
        }
        Ok(root)
    }

    /// Serialise to YAML text.
    #[must_use]
    pub fn to_yaml_string(&self) -> String {
        emit_document(self)
    }
}

/// Detaches the comment of the first entry or item of a collection.
fn first_child_comment(root: &mut Node) -> Option<Comment> {
    if root.as_mapping().is_some_and(|map| !map.is_empty()) {
        return root
            .as_mapping_mut()
            .and_then(|map| map.first_mut())
            .and_then(|(_, first)| first.take_comment());
    }
    if root.as_sequence().is_some_and(|items| !items.is_empty()) {
        return root
            .as_sequence_mut()
            .and_then(|items| items.first_mut())
            .and_then(Node::take_comment);
    }
    None
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::Document;
    use crate::node::NodeKind;

    #[test]
    fn lifts_header_and_first_entry_comments() {
        let raw = "# header\n\n# about image\nimage: rust:latest\nscript:\n  - cargo test\n";
        let node = Document::parse(raw)
            .expect("fragment parses")
            .into_content()
            .expect("fragment has content");
        assert_eq!(node.kind(), NodeKind::Mapping);
        assert_eq!(node.comment_text().as_deref(), Some("header\n\nabout image"));
        let image = node
            .as_mapping()
            .and_then(|map| map.get("image"))
            .expect("image entry");
        assert!(image.comment().is_none());
    }

    #[rstest]
    #[case("")]
    #[case("# just a comment\n")]
    fn empty_fragments_have_no_content(#[case] raw: &str) {
        let document = Document::parse(raw).expect("parses");
        assert!(document.is_empty());
        assert!(document.into_content().is_err());
    }

    #[test]
    fn get_reads_nested_values() {
        let document = Document::parse("jobs:\n  build:\n    stage: build\n").expect("parses");
        let stage = document.get("jobs.build.stage").expect("valid path");
        assert_eq!(stage.and_then(|node| node.as_str()), Some("build"));
        assert!(document.get("jobs.test").expect("valid path").is_none());
    }
}
