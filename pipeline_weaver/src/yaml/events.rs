//! Event receiver that assembles a positioned tree from `yaml-rust2` events.

use std::collections::HashMap;

use yaml_rust2::parser::{Event, MarkedEventReceiver, Tag};
use yaml_rust2::scanner::{Marker, TScalarStyle};

use super::lines::SourceLines;
use crate::node::{Scalar, resolve_plain};

/// Zero-based line and column of a node's first character.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(super) struct Pos {
    pub(super) line: usize,
    pub(super) col: usize,
}

/// A parsed node before comments and layout are attached.
#[derive(Clone, Debug)]
pub(super) struct RawNode {
    pub(super) pos: Pos,
    /// Flow collections and alias expansions have no block layout.
    pub(super) inline: bool,
    pub(super) tag: Option<String>,
    pub(super) content: RawContent,
}

#[derive(Clone, Debug)]
pub(super) enum RawContent {
    /// Resolved value and the scalar's source text.
    Scalar(Scalar, String),
    Sequence(Vec<RawNode>),
    Mapping(Vec<RawEntry>),
}

#[derive(Clone, Debug)]
pub(super) struct RawEntry {
    pub(super) key: String,
    pub(super) pos: Pos,
    pub(super) value: RawNode,
}

enum Frame {
    Sequence {
        head: RawNode,
        anchor: usize,
        items: Vec<RawNode>,
    },
    Mapping {
        head: RawNode,
        anchor: usize,
        entries: Vec<RawEntry>,
        pending: Option<(String, Pos)>,
    },
}

/// Builds a [`RawNode`] tree for the first and only document of a stream.
pub(super) struct TreeBuilder<'s, 'a> {
    source: &'s SourceLines<'a>,
    stack: Vec<Frame>,
    anchors: HashMap<usize, RawNode>,
    root: Option<RawNode>,
    documents: usize,
    error: Option<String>,
}

impl<'s, 'a> TreeBuilder<'s, 'a> {
    pub(super) fn new(source: &'s SourceLines<'a>) -> Self {
        Self {
            source,
            stack: Vec::new(),
            anchors: HashMap::new(),
            root: None,
            documents: 0,
            error: None,
        }
    }

    /// The root node, or the first structural problem found.
    pub(super) fn finish(self) -> Result<Option<RawNode>, String> {
        match self.error {
            Some(message) => Err(message),
            None => Ok(self.root),
        }
    }

    fn position(&self, mark: &Marker) -> Pos {
        self.source.position(mark.index()).map_or(
            Pos {
                line: mark.line().saturating_sub(1),
                col: mark.col(),
            },
            |(line, col)| Pos { line, col },
        )
    }

    fn head(&self, pos: Pos, tag: Option<&Tag>, flow_open: char) -> RawNode {
        RawNode {
            pos,
            inline: self.source.char_at(pos.line, pos.col) == Some(flow_open),
            tag: tag.map(tag_source),
            content: RawContent::Sequence(Vec::new()),
        }
    }

    fn remember(&mut self, anchor: usize, node: &RawNode) {
        if anchor > 0 {
            self.anchors.insert(anchor, node.clone());
        }
    }

    fn complete(&mut self, node: RawNode) {
        let Some(frame) = self.stack.last_mut() else {
            if self.root.is_none() {
                self.root = Some(node);
            }
            return;
        };
        match frame {
            Frame::Sequence { items, .. } => items.push(node),
            Frame::Mapping {
                entries, pending, ..
            } => match pending.take() {
                None => match node.content {
                    RawContent::Scalar(_, text) => *pending = Some((text, node.pos)),
                    _ => {
                        self.error = Some(format!(
                            "complex mapping key at line {} is not supported",
                            node.pos.line + 1
                        ));
                    }
                },
                Some((key, pos)) => {
                    if entries.iter().any(|entry| entry.key == key) {
                        self.error = Some(format!(
                            "duplicate key '{key}' at line {}",
                            pos.line + 1
                        ));
                    } else {
                        entries.push(RawEntry {
                            key,
                            pos,
                            value: node,
                        });
                    }
                }
            },
        }
    }

    fn close(&mut self) {
        let Some(frame) = self.stack.pop() else {
            return;
        };
        let (mut node, anchor) = match frame {
            Frame::Sequence {
                mut head,
                anchor,
                items,
            } => {
                head.content = RawContent::Sequence(items);
                (head, anchor)
            }
            Frame::Mapping {
                mut head,
                anchor,
                entries,
                ..
            } => {
                head.content = RawContent::Mapping(entries);
                (head, anchor)
            }
        };
        if node.inline {
            flatten(&mut node);
        }
        self.remember(anchor, &node);
        self.complete(node);
    }
}

impl MarkedEventReceiver for TreeBuilder<'_, '_> {
    fn on_event(&mut self, ev: Event, mark: Marker) {
        if self.error.is_some() {
            return;
        }
        let pos = self.position(&mark);
        match ev {
            Event::DocumentStart => {
                self.documents += 1;
                if self.documents > 1 {
                    self.error = Some("multiple YAML documents are not supported".to_owned());
                }
            }
            Event::Scalar(text, style, anchor, tag) => {
                let value = scalar_value(&text, style, tag.as_ref());
                let node = RawNode {
                    pos,
                    inline: true,
                    tag: tag.as_ref().map(tag_source),
                    content: RawContent::Scalar(value, text),
                };
                self.remember(anchor, &node);
                self.complete(node);
            }
            Event::SequenceStart(anchor, tag) => {
                let head = self.head(pos, tag.as_ref(), '[');
                self.stack.push(Frame::Sequence {
                    head,
                    anchor,
                    items: Vec::new(),
                });
            }
            Event::MappingStart(anchor, tag) => {
                let head = self.head(pos, tag.as_ref(), '{');
                self.stack.push(Frame::Mapping {
                    head,
                    anchor,
                    entries: Vec::new(),
                    pending: None,
                });
            }
            Event::SequenceEnd | Event::MappingEnd => self.close(),
            Event::Alias(anchor) => match self.anchors.get(&anchor).cloned() {
                Some(mut node) => {
                    node.pos = pos;
                    flatten(&mut node);
                    self.complete(node);
                }
                None => self.error = Some(format!("unknown alias at line {}", pos.line + 1)),
            },
            _ => {}
        }
    }
}

/// Marks a subtree as having no block layout.
fn flatten(node: &mut RawNode) {
    node.inline = true;
    match &mut node.content {
        RawContent::Scalar(..) => {}
        RawContent::Sequence(items) => items.iter_mut().for_each(flatten),
        RawContent::Mapping(entries) => entries
            .iter_mut()
            .for_each(|entry| flatten(&mut entry.value)),
    }
}

fn scalar_value(text: &str, style: TScalarStyle, tag: Option<&Tag>) -> Scalar {
    let core = tag.and_then(|tag| {
        (tag.handle == "tag:yaml.org,2002:" || tag.handle == "!!").then_some(tag.suffix.as_str())
    });
    match core {
        Some("str") => Scalar::String(text.to_owned()),
        Some(_) => resolve_plain(text),
        None if style == TScalarStyle::Plain && tag.is_none() => resolve_plain(text),
        None => Scalar::String(text.to_owned()),
    }
}

/// Source form of a tag: `!!str`, `!reference` or `!<verbatim>`.
fn tag_source(tag: &Tag) -> String {
    match tag.handle.as_str() {
        "tag:yaml.org,2002:" | "!!" => format!("!!{}", tag.suffix),
        "!" => format!("!{}", tag.suffix),
        handle => format!("!<{handle}{}>", tag.suffix),
    }
}
