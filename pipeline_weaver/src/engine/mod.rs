//! Path-addressed operation engine.
//!
//! [`apply`] runs an ordered list of [`Operation`]s against a [`crate::Document`].
//! Each operation addresses one node by path and either replaces it
//! (`set`/`overwrite`), merges into it (`merge`) or only creates it when it
//! is missing (`preserve`). Whether a missing target is an error is decided
//! by the operation's `required` flag before the strategy is consulted; the
//! flag never changes what a strategy does to a target that exists.

mod apply;
mod merge;
mod operation;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use apply::apply;
pub(crate) use apply::synthesise;
pub use operation::{Operation, OperationList};

/// How an operation treats its target node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Replace the target.
    Set,
    /// Merge the value into the target.
    Merge,
    /// Replace the target; identical to [`Strategy::Set`].
    Overwrite,
    /// Create the target only when it is missing.
    Preserve,
}

impl Strategy {
    /// Returns `true` for the strategies that replace an existing target.
    #[must_use]
    pub const fn replaces(self) -> bool {
        matches!(self, Self::Set | Self::Overwrite)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Set => "set",
            Self::Merge => "merge",
            Self::Overwrite => "overwrite",
            Self::Preserve => "preserve",
        })
    }
}
