//! Attaches comments, spacing and verbatim source text to a parsed tree.
//!
//! A block entry owns the lines from its key line down to the start of the
//! next sibling's leading region (or the end of its parent), minus trailing
//! blank lines. The leading region of an entry is the run of blank lines and
//! comment lines directly above it whose indentation does not exceed the
//! entry's own column.

use std::sync::Arc;

use yaml_rust2::parser::Parser;

use super::events::{Pos, RawContent, RawEntry, RawNode, TreeBuilder};
use super::lines::SourceLines;
use crate::document::Document;
use crate::node::{Comment, Mapping, Node, Scalar, Verbatim};
use crate::{WeaveError, WeaveResult};

/// Parse `text` into a document.
///
/// `context` names the input in error messages.
pub(crate) fn parse_document(text: &str, context: &str) -> WeaveResult<Document> {
    let source = SourceLines::new(text);
    let mut builder = TreeBuilder::new(&source);
    let mut parser = Parser::new_from_str(text);
    parser
        .load(&mut builder, true)
        .map_err(|err| Arc::new(WeaveError::parse_failure(context, err)))?;
    let root = builder
        .finish()
        .map_err(|message| Arc::new(WeaveError::parse_failure(context, message)))?;
    Ok(Layouter { source: &source }
        .document(root)
        .with_crlf(source.crlf()))
}

struct Region {
    start: usize,
    blank_lines: usize,
    comment: Option<Comment>,
}

struct Layouter<'s, 'a> {
    source: &'s SourceLines<'a>,
}

impl Layouter<'_, '_> {
    fn document(&self, root: Option<RawNode>) -> Document {
        let total = self.source.len();
        let Some(root) = root.filter(|root| !is_empty_document(root)) else {
            return Document::from_parts(self.source.slice(0, total), None, Vec::new());
        };
        let trailer_start = self.trailer_start(root.pos);
        let body_start = match (&root.content, root.inline) {
            (RawContent::Mapping(entries), false) => entries.first().map(|entry| entry.pos),
            (RawContent::Sequence(items), false) if !items.is_empty() => Some(root.pos),
            _ => None,
        };
        let Some(first) = body_start else {
            let prologue = self.source.slice(0, root.pos.line);
            let trailer = self.source.slice(trailer_start, total);
            return Document::from_parts(prologue, Some(plain(root)), trailer);
        };
        let region_start = if self.source.starts_at(first.line, first.col) {
            self.region(first.line, first.col, 0).start
        } else {
            first.line
        };
        let prologue_end = (region_start..first.line)
            .rev()
            .find(|line| self.source.is_blank(*line))
            .map_or(region_start, |line| line + 1);
        let node = self.node(root, prologue_end, trailer_start);
        Document::from_parts(
            self.source.slice(0, prologue_end),
            Some(node),
            self.source.slice(trailer_start, total),
        )
    }

    /// First line of the comment and blank run that closes the document.
    fn trailer_start(&self, root: Pos) -> usize {
        let mut start = self.source.len();
        while start > root.line + 1 {
            let line = start - 1;
            let trailing = self.source.is_blank(line)
                || (self.source.is_comment(line) && self.source.indent(line) <= root.col);
            if !trailing {
                break;
            }
            start = line;
        }
        start
    }

    fn region(&self, line: usize, col: usize, lower: usize) -> Region {
        let mut start = line;
        while start > lower {
            let above = start - 1;
            let leading = self.source.is_blank(above)
                || (self.source.is_comment(above) && self.source.indent(above) <= col);
            if !leading {
                break;
            }
            start = above;
        }
        let mut cursor = start;
        while cursor < line && self.source.is_blank(cursor) {
            cursor += 1;
        }
        let lines: Vec<Option<String>> = (cursor..line)
            .map(|index| self.source.comment_body(index))
            .collect();
        Region {
            start,
            blank_lines: cursor - start,
            comment: (!lines.is_empty()).then(|| Comment::from_source(lines)),
        }
    }

    /// Leading region of a child starting at `pos`, or an empty one when the
    /// child shares its line with an earlier token.
    fn child_region(&self, pos: Pos, lower: usize) -> Region {
        if self.source.starts_at(pos.line, pos.col) {
            self.region(pos.line, pos.col, lower)
        } else {
            Region {
                start: pos.line,
                blank_lines: 0,
                comment: None,
            }
        }
    }

    fn node(&self, raw: RawNode, lower: usize, end: usize) -> Node {
        if raw.inline {
            return plain(raw);
        }
        let RawNode {
            pos, tag, content, ..
        } = raw;
        let node = match content {
            RawContent::Scalar(scalar, _) => Node::scalar(scalar),
            RawContent::Mapping(entries) => Node::from(self.mapping(entries, lower, end)),
            RawContent::Sequence(items) => Node::sequence(self.sequence(items, pos, lower, end)),
        };
        match tag {
            Some(tag) => node.with_tag(tag),
            None => node,
        }
    }

    fn mapping(&self, entries: Vec<RawEntry>, lower: usize, end: usize) -> Mapping {
        let mut regions = Vec::with_capacity(entries.len());
        let mut floor = lower;
        for entry in &entries {
            regions.push(self.child_region(entry.pos, floor));
            floor = entry.pos.line + 1;
        }
        let starts: Vec<usize> = regions.iter().map(|region| region.start).collect();
        entries
            .into_iter()
            .zip(regions)
            .enumerate()
            .map(|(index, (entry, region))| {
                let limit = starts.get(index + 1).copied().unwrap_or(end);
                let span_end = self.source.trim_blank_tail(entry.pos.line + 1, limit);
                let verbatim = self.entry_verbatim(&entry.key, entry.pos, span_end);
                let mut node = self.node(entry.value, entry.pos.line + 1, span_end);
                decorate(&mut node, region, verbatim);
                (entry.key, node)
            })
            .collect()
    }

    fn sequence(&self, items: Vec<RawNode>, pos: Pos, lower: usize, end: usize) -> Vec<Node> {
        let dashes: Vec<usize> = (pos.line..end)
            .filter(|line| self.source.is_dash_at(*line, pos.col))
            .collect();
        if dashes.len() != items.len() || dashes.first() != Some(&pos.line) {
            return items.into_iter().map(plain).collect();
        }
        let mut regions = Vec::with_capacity(items.len());
        let mut floor = lower;
        for dash in &dashes {
            regions.push(self.region(*dash, pos.col, floor));
            floor = dash + 1;
        }
        let starts: Vec<usize> = regions.iter().map(|region| region.start).collect();
        items
            .into_iter()
            .zip(regions)
            .zip(dashes)
            .enumerate()
            .map(|(index, ((item, region), dash))| {
                let limit = starts.get(index + 1).copied().unwrap_or(end);
                let span_end = self.source.trim_blank_tail(dash + 1, limit);
                let verbatim = self.item_verbatim(dash, pos.col, span_end);
                let mut node = self.node(item, dash + 1, span_end);
                decorate(&mut node, region, verbatim);
                node
            })
            .collect()
    }

    fn entry_verbatim(&self, key: &str, pos: Pos, end: usize) -> Option<Verbatim> {
        let line = self.source.get(pos.line)?;
        let rest: String = line.chars().skip(pos.col).collect();
        let colon = key_colon(&rest)?;
        let key_text = rest.get(..colon)?.to_owned();
        let head = rest.get(colon + 1..)?.to_owned();
        Some(Verbatim::Entry {
            key: key.to_owned(),
            key_text,
            head,
            body: self.body(pos.line + 1, end, pos.col)?,
        })
    }

    fn item_verbatim(&self, dash: usize, col: usize, end: usize) -> Option<Verbatim> {
        let head = self.source.get(dash)?.chars().skip(col + 1).collect();
        Some(Verbatim::Item {
            head,
            body: self.body(dash + 1, end, col)?,
        })
    }

    /// Lines `start..end` relative to column `col`. Comment lines indented
    /// less than `col` are pulled in; any other such line rejects the span.
    fn body(&self, start: usize, end: usize, col: usize) -> Option<Vec<String>> {
        (start..end)
            .map(|index| {
                let text = self.source.get(index)?;
                if text.trim().is_empty() {
                    Some(String::new())
                } else if self.source.indent(index) >= col {
                    Some(text.chars().skip(col).collect())
                } else if self.source.is_comment(index) {
                    Some(text.trim_start().to_owned())
                } else {
                    None
                }
            })
            .collect()
    }
}

fn decorate(node: &mut Node, region: Region, verbatim: Option<Verbatim>) {
    node.set_comment(region.comment);
    node.set_blank_lines_before(region.blank_lines);
    node.set_verbatim(verbatim);
}

/// Converts a subtree without attaching any layout.
fn plain(raw: RawNode) -> Node {
    let node = match raw.content {
        RawContent::Scalar(scalar, _) => Node::scalar(scalar),
        RawContent::Sequence(items) => Node::sequence(items.into_iter().map(plain).collect()),
        RawContent::Mapping(entries) => Node::from(
            entries
                .into_iter()
                .map(|entry| (entry.key, plain(entry.value)))
                .collect::<Mapping>(),
        ),
    };
    match raw.tag {
        Some(tag) => node.with_tag(tag),
        None => node,
    }
}

/// A stream holding only comments parses as an empty plain scalar.
fn is_empty_document(root: &RawNode) -> bool {
    matches!(&root.content, RawContent::Scalar(Scalar::Null, text) if text.is_empty())
        && root.tag.is_none()
}

/// Byte offset of the `:` that ends the key at the start of `text`.
fn key_colon(text: &str) -> Option<usize> {
    let mut chars = text.char_indices().peekable();
    match chars.peek().map(|(_, c)| *c) {
        Some(quote @ ('"' | '\'')) => {
            chars.next();
            let mut escaped = false;
            while let Some((_, c)) = chars.next() {
                if quote == '"' && escaped {
                    escaped = false;
                } else if quote == '"' && c == '\\' {
                    escaped = true;
                } else if c == quote {
                    // `''` inside single quotes is an escaped quote.
                    if quote == '\'' && chars.peek().map(|(_, next)| *next) == Some('\'') {
                        chars.next();
                        continue;
                    }
                    break;
                }
            }
            chars.find(|(_, c)| *c == ':').map(|(index, _)| index)
        }
        _ => {
            let bytes = text.as_bytes();
            text.char_indices()
                .find(|(index, c)| {
                    *c == ':' && matches!(bytes.get(index + 1), None | Some(b' ' | b'\t'))
                })
                .map(|(index, _)| index)
        }
    }
}

#[cfg(test)]
mod key_tests {
    use rstest::rstest;

    use super::key_colon;

    #[rstest]
    #[case("name: value", Some(4))]
    #[case("url: http://x", Some(3))]
    #[case("a:b: c", Some(3))]
    #[case("\"a: b\": c", Some(6))]
    #[case("'it''s': c", Some(7))]
    #[case("key:", Some(3))]
    #[case("no colon", None)]
    fn finds_the_key_colon(#[case] text: &str, #[case] expected: Option<usize>) {
        assert_eq!(key_colon(text), expected);
    }
}
