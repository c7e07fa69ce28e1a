//! Dot-delimited document paths.
//!
//! A path such as `jobs.build.script.0` names mapping keys separated by dots,
//! optionally ending with a sequence index. Inside a key `\.` stands for a
//! literal dot and `\\` for a literal backslash.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::node::{Node, NodeKind};
use crate::{WeaveError, WeaveResult};

/// One step of a [`DocPath`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment {
    /// Mapping key.
    Key(String),
    /// Sequence index. Only the last segment of a path can be an index.
    Index(usize),
}

impl Segment {
    /// The mapping key this segment addresses. An index addresses the key
    /// spelled with its decimal digits.
    #[must_use]
    pub fn key(&self) -> String {
        match self {
            Self::Key(key) => key.clone(),
            Self::Index(index) => index.to_string(),
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => f.write_str(key),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

/// A parsed document path.
///
/// # Examples
///
/// ```
/// use pipeline_weaver::{DocPath, Segment};
///
/// let path: DocPath = r"variables.app\.name".parse()?;
/// assert_eq!(
///     path.segments(),
///     &[
///         Segment::Key("variables".into()),
///         Segment::Key("app.name".into()),
///     ]
/// );
/// # Ok::<(), std::sync::Arc<pipeline_weaver::WeaveError>>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocPath {
    raw: String,
    segments: Vec<Segment>,
}

impl DocPath {
    /// Parse `raw` into segments.
    ///
    /// # Errors
    ///
    /// Returns [`WeaveError::InvalidPath`] for an empty path, an empty
    /// segment, a dangling or unknown escape, or an index that does not fit
    /// in `usize`.
    pub fn parse(raw: &str) -> WeaveResult<Self> {
        let invalid = |reason: &str| Arc::new(WeaveError::invalid_path(raw, reason));
        if raw.is_empty() {
            return Err(invalid("path is empty"));
        }
        let mut pieces: Vec<(String, bool)> = Vec::new();
        let mut current = String::new();
        let mut escaped = false;
        let mut chars = raw.chars();
        while let Some(c) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some(next @ ('.' | '\\')) => {
                        current.push(next);
                        escaped = true;
                    }
                    Some(other) => return Err(invalid(&format!("unknown escape '\\{other}'"))),
                    None => return Err(invalid("trailing backslash")),
                },
                '.' => pieces.push((std::mem::take(&mut current), std::mem::take(&mut escaped))),
                _ => current.push(c),
            }
        }
        pieces.push((current, escaped));
        if pieces.iter().any(|(piece, _)| piece.is_empty()) {
            return Err(invalid("empty segment"));
        }
        let last = pieces.len() - 1;
        let segments = pieces
            .into_iter()
            .enumerate()
            .map(|(position, (piece, escaped))| {
                if position == last && !escaped && is_index(&piece) {
                    piece
                        .parse()
                        .map(Segment::Index)
                        .map_err(|_| invalid("index is out of range"))
                } else {
                    Ok(Segment::Key(piece))
                }
            })
            .collect::<WeaveResult<Vec<_>>>()?;
        Ok(Self {
            raw: raw.to_owned(),
            segments,
        })
    }

    /// The path as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The parsed segments. Never empty.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Split into the parent segments and the final segment.
    pub(crate) fn split_last(&self) -> Option<(&Segment, &[Segment])> {
        self.segments.split_last()
    }

    /// Find the node this path addresses below `root`.
    ///
    /// Returns `Ok(None)` when some segment is absent.
    ///
    /// # Errors
    ///
    /// Returns [`WeaveError::NotAContainer`] when the walk reaches a scalar
    /// before the last segment, or applies a key segment to a sequence.
    pub fn resolve<'a>(&self, root: Option<&'a Node>) -> WeaveResult<Option<&'a Node>> {
        let mut current = root;
        for segment in &self.segments {
            let Some(node) = current else {
                return Ok(None);
            };
            current = self.step(node, segment)?;
        }
        Ok(current)
    }

    /// Resolve one segment below `node`.
    pub(crate) fn step<'a>(&self, node: &'a Node, segment: &Segment) -> WeaveResult<Option<&'a Node>> {
        if let Some(map) = node.as_mapping() {
            return Ok(map.get(&segment.key()));
        }
        match (node.as_sequence(), segment) {
            (Some(items), Segment::Index(index)) => Ok(items.get(*index)),
            _ => Err(self.not_a_container(node.kind(), segment)),
        }
    }

    /// Mutable walk to the node this path addresses below `root`.
    ///
    /// Every node on the way loses its verbatim source text.
    pub(crate) fn resolve_mut<'a>(&self, root: &'a mut Node) -> Option<&'a mut Node> {
        let mut current = root;
        for segment in &self.segments {
            current = match (current.kind(), segment) {
                (NodeKind::Mapping, _) => current.as_mapping_mut()?.get_mut(&segment.key())?,
                (NodeKind::Sequence, Segment::Index(index)) => {
                    current.as_sequence_mut()?.get_mut(*index)?
                }
                _ => return None,
            };
        }
        Some(current)
    }

    pub(crate) fn not_a_container(&self, found: NodeKind, segment: &Segment) -> Arc<WeaveError> {
        Arc::new(WeaveError::NotAContainer {
            path: self.raw.clone(),
            segment: segment.to_string(),
            found,
        })
    }
}

/// Digits without a leading zero (except `0` itself).
fn is_index(piece: &str) -> bool {
    piece.bytes().all(|b| b.is_ascii_digit()) && (piece == "0" || !piece.starts_with('0'))
}

impl FromStr for DocPath {
    type Err = Arc<WeaveError>;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::parse(raw)
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
