//! Primary error enum for document generation passes.

use camino::Utf8PathBuf;
use thiserror::Error;

use super::AggregatedErrors;
use crate::engine::Strategy;
use crate::node::NodeKind;

/// Errors that can occur while building, merging or persisting a document.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WeaveError {
    /// A path string could not be parsed, or addresses an impossible index.
    #[error("invalid path '{path}': {reason}")]
    InvalidPath {
        /// Path text as supplied by the caller.
        path: String,
        /// Why the path was rejected.
        reason: String,
    },

    /// A required operation targets an absent node and supplies no value.
    #[error("required target '{path}' is absent and the {strategy} operation has no value")]
    MissingRequiredTarget {
        /// Path of the missing target.
        path: String,
        /// Strategy of the offending operation.
        strategy: Strategy,
    },

    /// An operation that writes to a present target supplies no value.
    #[error("{strategy} operation on '{path}' has no value")]
    MissingValue {
        /// Path of the target.
        path: String,
        /// Strategy of the offending operation.
        strategy: Strategy,
    },

    /// `merge` was requested across mismatched node kinds.
    #[error("cannot merge {incoming} into {existing} at '{path}'")]
    IncompatibleMergeTarget {
        /// Path of the merge target.
        path: String,
        /// Kind of the node already in the document.
        existing: NodeKind,
        /// Kind of the node being merged in.
        incoming: NodeKind,
    },

    /// A path walks through a node that cannot hold the next segment.
    #[error("segment '{segment}' of '{path}' cannot be resolved inside a {found}")]
    NotAContainer {
        /// Full path being resolved.
        path: String,
        /// Segment that could not be resolved.
        segment: String,
        /// Kind of the node that was found instead of a container.
        found: NodeKind,
    },

    /// Structured text could not be parsed.
    #[error("failed to parse {context}: {message}")]
    ParseFailure {
        /// What was being parsed (a file path or "raw value").
        context: String,
        /// Parser diagnostic.
        message: String,
    },

    /// Reading or writing a file failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path involved in the failed operation.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Pass settings could not be extracted.
    #[error("failed to load settings: {0}")]
    Settings(#[from] Box<figment::Error>),

    /// Multiple errors were found at once.
    #[error("multiple errors:\n{0}")]
    Aggregate(Box<AggregatedErrors>),
}
