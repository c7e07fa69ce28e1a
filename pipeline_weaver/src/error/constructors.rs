//! Constructors and aggregation helpers for `WeaveError`.

use std::sync::Arc;

use camino::Utf8Path;

use super::{AggregatedErrors, WeaveError};

impl WeaveError {
    /// Tries to build a [`WeaveError`] from an iterator of errors.
    ///
    /// The iterator is consumed eagerly. It returns:
    /// * `None` when no errors are supplied;
    /// * the inner error when a single [`Arc`] is uniquely owned;
    /// * [`Self::Aggregate`] containing that single [`Arc`] when the error is already shared; and
    /// * [`Self::Aggregate`] combining every error for two or more inputs.
    #[must_use]
    pub fn try_aggregate<I, E>(errors: I) -> Option<Self>
    where
        I: IntoIterator<Item = E>,
        E: Into<Arc<Self>>,
    {
        let mut arcs: Vec<Arc<Self>> = errors.into_iter().map(Into::into).collect();
        if arcs.is_empty() {
            return None;
        }
        Some(if arcs.len() == 1 {
            let last = arcs.pop()?;
            match Arc::try_unwrap(last) {
                Ok(err) => err,
                Err(shared) => Self::Aggregate(Box::new(AggregatedErrors::new(vec![shared]))),
            }
        } else {
            Self::Aggregate(Box::new(AggregatedErrors::new(arcs)))
        })
    }

    /// Construct an [`WeaveError::InvalidPath`].
    ///
    /// # Examples
    ///
    /// ```
    /// use pipeline_weaver::WeaveError;
    /// let e = WeaveError::invalid_path("a..b", "empty segment");
    /// assert_eq!(e.to_string(), "invalid path 'a..b': empty segment");
    /// ```
    #[must_use]
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Construct a [`WeaveError::ParseFailure`].
    #[must_use]
    pub fn parse_failure(context: impl Into<String>, message: impl ToString) -> Self {
        Self::ParseFailure {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Construct a [`WeaveError::Io`] for `path`, wrapped for propagation.
    #[must_use]
    pub fn io(path: &Utf8Path, source: std::io::Error) -> Arc<Self> {
        Arc::new(Self::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Returns `true` for errors raised by the path operation engine or the
    /// preservation pass, as opposed to I/O or settings failures.
    #[must_use]
    pub const fn is_engine_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidPath { .. }
                | Self::MissingRequiredTarget { .. }
                | Self::MissingValue { .. }
                | Self::IncompatibleMergeTarget { .. }
                | Self::NotAContainer { .. }
        )
    }
}
