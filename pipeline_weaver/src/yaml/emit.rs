//! Block-style YAML writer.

use crate::document::Document;
use crate::node::{Mapping, Node, NodeKind, Rendered, Verbatim, render_key};

const STEP: usize = 2;

/// Render `document` as YAML text.
///
/// Output is empty for an empty document and otherwise ends with a newline.
pub(crate) fn emit_document(document: &Document) -> String {
    let mut emitter = Emitter::new(if document.uses_crlf() { "\r\n" } else { "\n" });
    for line in document.prologue() {
        emitter.raw(line);
    }
    if let Some(root) = document.root() {
        emitter.root(root);
    }
    for line in document.trailer() {
        emitter.raw(line);
    }
    emitter.out
}

struct Emitter {
    out: String,
    newline: &'static str,
}

impl Emitter {
    const fn new(newline: &'static str) -> Self {
        Self {
            out: String::new(),
            newline,
        }
    }

    fn raw(&mut self, text: &str) {
        self.out.push_str(text);
        self.out.push_str(self.newline);
    }

    fn line(&mut self, indent: usize, text: &str) {
        if !text.is_empty() {
            self.out.extend(std::iter::repeat_n(' ', indent));
            self.out.push_str(text);
        }
        self.out.push_str(self.newline);
    }

    fn leading(&mut self, indent: usize, node: &Node) {
        for _ in 0..node.blank_lines_before() {
            self.out.push_str(self.newline);
        }
        self.comment(indent, node);
    }

    fn comment(&mut self, indent: usize, node: &Node) {
        if let Some(comment) = node.comment() {
            for line in comment.render_lines() {
                self.line(indent, &line);
            }
        }
    }

    fn body(&mut self, indent: usize, body: &[String]) {
        for line in body {
            self.line(indent, line);
        }
    }

    fn root(&mut self, node: &Node) {
        self.comment(0, node);
        match block_children(node) {
            Some(Block::Mapping(map)) => {
                if let Some(tag) = node.tag() {
                    self.line(0, tag);
                }
                self.entries(0, map);
            }
            Some(Block::Sequence(items)) => {
                if let Some(tag) = node.tag() {
                    self.line(0, tag);
                }
                self.items(0, items);
            }
            None => self.leaf(0, "", node),
        }
    }

    fn entries(&mut self, indent: usize, map: &Mapping) {
        for (key, node) in map.iter() {
            self.entry(indent, key, node);
        }
    }

    fn entry(&mut self, indent: usize, key: &str, node: &Node) {
        self.leading(indent, node);
        if let Some(Verbatim::Entry {
            key: source_key,
            key_text,
            head,
            body,
        }) = node.verbatim()
        {
            if source_key == key {
                self.line(indent, &format!("{key_text}:{head}"));
                self.body(indent, body);
                return;
            }
        }
        let key = render_key(key);
        match block_children(node) {
            Some(block) => {
                self.line(indent, &format!("{key}:{}", tag_suffix(node)));
                self.block(indent + STEP, block);
            }
            None => self.leaf(indent, &format!("{key}: "), node),
        }
    }

    fn items(&mut self, indent: usize, items: &[Node]) {
        for node in items {
            self.item(indent, node);
        }
    }

    fn item(&mut self, indent: usize, node: &Node) {
        self.leading(indent, node);
        if let Some(Verbatim::Item { head, body }) = node.verbatim() {
            self.line(indent, &format!("-{head}"));
            self.body(indent, body);
            return;
        }
        match block_children(node) {
            Some(Block::Mapping(map)) if node.tag().is_none() && !opens_with_decoration(map) => {
                let mut nested = Self::new(self.newline);
                nested.entries(indent + STEP, map);
                self.out.extend(std::iter::repeat_n(' ', indent));
                self.out.push_str("- ");
                self.out
                    .push_str(nested.out.get(indent + STEP..).unwrap_or_default());
            }
            Some(block) => {
                self.line(indent, &format!("-{}", tag_suffix(node)));
                self.block(indent + STEP, block);
            }
            None => self.leaf(indent, "- ", node),
        }
    }

    fn block(&mut self, indent: usize, block: Block<'_>) {
        match block {
            Block::Mapping(map) => self.entries(indent, map),
            Block::Sequence(items) => self.items(indent, items),
        }
    }

    /// Writes a scalar or empty collection after `prefix`.
    fn leaf(&mut self, indent: usize, prefix: &str, node: &Node) {
        let tag = node.tag().map(|tag| format!("{tag} ")).unwrap_or_default();
        let rendered = match node.kind() {
            NodeKind::Mapping => Rendered::Inline("{}".to_owned()),
            NodeKind::Sequence => Rendered::Inline("[]".to_owned()),
            NodeKind::Scalar => node
                .as_scalar()
                .map_or_else(|| Rendered::Inline("null".to_owned()), |scalar| scalar.render()),
        };
        match rendered {
            Rendered::Inline(text) => self.line(indent, &format!("{prefix}{tag}{text}")),
            Rendered::Literal { indicator, lines } => {
                self.line(indent, &format!("{prefix}{tag}{indicator}"));
                for line in lines {
                    self.line(indent + STEP, &line);
                }
            }
        }
    }
}

#[derive(Clone, Copy)]
enum Block<'a> {
    Mapping(&'a Mapping),
    Sequence(&'a [Node]),
}

/// Children of a non-empty collection, which is written in block style.
fn block_children(node: &Node) -> Option<Block<'_>> {
    if let Some(map) = node.as_mapping() {
        return (!map.is_empty()).then_some(Block::Mapping(map));
    }
    node.as_sequence()
        .filter(|items| !items.is_empty())
        .map(Block::Sequence)
}

/// A first entry with a comment or spacing cannot share the dash line.
fn opens_with_decoration(map: &Mapping) -> bool {
    map.iter()
        .next()
        .is_some_and(|(_, first)| first.comment().is_some() || first.blank_lines_before() > 0)
}

fn tag_suffix(node: &Node) -> String {
    node.tag().map(|tag| format!(" {tag}")).unwrap_or_default()
}
