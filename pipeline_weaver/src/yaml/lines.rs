//! Line table over the source text.

/// Source text split into lines, with the character offset of each line
/// start so parser marks (character indices) can be mapped back to lines.
pub(super) struct SourceLines<'a> {
    lines: Vec<&'a str>,
    starts: Vec<usize>,
    crlf: bool,
}

impl<'a> SourceLines<'a> {
    pub(super) fn new(text: &'a str) -> Self {
        let mut lines = Vec::new();
        let mut starts = Vec::new();
        let mut offset = 0;
        let mut pieces: Vec<&str> = text.split('\n').collect();
        if text.is_empty() || text.ends_with('\n') {
            pieces.pop();
        }
        for piece in pieces {
            starts.push(offset);
            offset += piece.chars().count() + 1;
            lines.push(piece.strip_suffix('\r').unwrap_or(piece));
        }
        let crlf = uses_crlf(text);
        Self { lines, starts, crlf }
    }

    /// Whether the first line break of the text is `\r\n`.
    pub(super) const fn crlf(&self) -> bool {
        self.crlf
    }

    pub(super) const fn len(&self) -> usize {
        self.lines.len()
    }

    pub(super) fn get(&self, line: usize) -> Option<&'a str> {
        self.lines.get(line).copied()
    }

    /// Lines `start..end` as owned strings.
    pub(super) fn slice(&self, start: usize, end: usize) -> Vec<String> {
        self.lines
            .get(start..end)
            .unwrap_or_default()
            .iter()
            .map(|line| (*line).to_owned())
            .collect()
    }

    /// Line and column of a character index.
    pub(super) fn position(&self, index: usize) -> Option<(usize, usize)> {
        let line = self.starts.partition_point(|start| *start <= index).checked_sub(1)?;
        let start = self.starts.get(line)?;
        Some((line, index - start))
    }

    pub(super) fn char_at(&self, line: usize, col: usize) -> Option<char> {
        self.get(line)?.chars().nth(col)
    }

    pub(super) fn indent(&self, line: usize) -> usize {
        self.get(line)
            .map_or(0, |text| text.chars().take_while(|c| *c == ' ').count())
    }

    pub(super) fn is_blank(&self, line: usize) -> bool {
        self.get(line).is_some_and(|text| text.trim().is_empty())
    }

    pub(super) fn is_comment(&self, line: usize) -> bool {
        self.get(line)
            .is_some_and(|text| text.trim_start().starts_with('#'))
    }

    /// Text after the `#` marker of a comment line.
    pub(super) fn comment_body(&self, line: usize) -> Option<String> {
        self.get(line)?
            .trim_start()
            .strip_prefix('#')
            .map(str::to_owned)
    }

    /// Returns `true` when only spaces precede `col` on `line`.
    pub(super) fn starts_at(&self, line: usize, col: usize) -> bool {
        self.get(line)
            .is_some_and(|text| text.chars().take(col).all(|c| c == ' '))
    }

    /// Returns `true` when `line` holds a block sequence dash at `col`.
    pub(super) fn is_dash_at(&self, line: usize, col: usize) -> bool {
        self.starts_at(line, col)
            && self.char_at(line, col) == Some('-')
            && matches!(self.char_at(line, col + 1), None | Some(' ' | '\t'))
    }

    /// Last line (exclusive) of `start..end` once trailing blank lines are
    /// dropped.
    pub(super) fn trim_blank_tail(&self, start: usize, end: usize) -> usize {
        let mut trimmed = end;
        while trimmed > start && self.is_blank(trimmed - 1) {
            trimmed -= 1;
        }
        trimmed
    }
}

fn uses_crlf(text: &str) -> bool {
    text.split_once('\n')
        .is_some_and(|(first, _)| first.ends_with('\r'))
}
