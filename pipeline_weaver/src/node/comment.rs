//! Comments attached above document entries.

/// A block of `#` comment lines written directly above an entry.
///
/// Each line is stored exactly as it appeared after the `#` marker, so a
/// parsed comment is re-emitted byte for byte. Blank lines inside the block
/// are kept.
///
/// # Examples
///
/// ```
/// use pipeline_weaver::Comment;
///
/// let comment = Comment::new("keep me\nand me");
/// assert_eq!(comment.text(), "keep me\nand me");
/// assert_eq!(comment.render_lines(), vec!["# keep me", "# and me"]);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Comment {
    lines: Vec<Option<String>>,
}

impl Comment {
    /// Build a comment from plain text; every line gets a `# ` marker.
    #[must_use]
    pub fn new(text: &str) -> Self {
        let lines = text
            .lines()
            .map(|line| {
                if line.is_empty() {
                    Some(String::new())
                } else {
                    Some(format!(" {line}"))
                }
            })
            .collect();
        Self { lines }
    }

    /// Build a comment from source lines. `None` marks a blank line and
    /// `Some(rest)` a line whose text after `#` is `rest`.
    pub(crate) const fn from_source(lines: Vec<Option<String>>) -> Self {
        Self { lines }
    }

    /// Append another comment block below this one.
    pub(crate) fn extend(&mut self, other: Self) {
        self.lines.extend(other.lines);
    }

    /// The comment text, one line per `#` line, without the marker and its
    /// following space.
    #[must_use]
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|line| match line {
                Some(rest) => rest.strip_prefix(' ').unwrap_or(rest),
                None => "",
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// The comment as it is written to the document, without indentation.
    #[must_use]
    pub fn render_lines(&self) -> Vec<String> {
        self.lines
            .iter()
            .map(|line| match line {
                Some(rest) => format!("#{rest}"),
                None => String::new(),
            })
            .collect()
    }
}
