//! Aggregation container and iteration support for multiple `WeaveError`
//! values.

use std::{error::Error, fmt, sync::Arc};

use super::WeaveError;

/// Collection of [`WeaveError`]s reported together, for example every
/// malformed path in an operation list.
///
/// # Examples
///
/// ```
/// use pipeline_weaver::WeaveError;
/// let e = WeaveError::try_aggregate(vec![
///     WeaveError::invalid_path("", "path is empty"),
///     WeaveError::invalid_path("a..b", "empty segment"),
/// ]);
/// if let Some(WeaveError::Aggregate(agg)) = e {
///     assert_eq!(agg.len(), 2);
/// }
/// ```
#[derive(Debug, Default)]
pub struct AggregatedErrors(Vec<Arc<WeaveError>>);

impl AggregatedErrors {
    /// Create a new aggregation from a vector of errors.
    #[must_use]
    pub const fn new(errors: Vec<Arc<WeaveError>>) -> Self {
        Self(errors)
    }

    /// Iterate over the contained errors.
    #[must_use = "iterators should be consumed to inspect errors"]
    pub fn iter(&self) -> impl Iterator<Item = &WeaveError> {
        self.0.iter().map(Arc::as_ref)
    }

    /// Number of errors in the aggregation.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` when the aggregation holds no errors.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for AggregatedErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}: {e}", i + 1)?;
        }
        Ok(())
    }
}

impl Error for AggregatedErrors {}

impl<'a> IntoIterator for &'a AggregatedErrors {
    type Item = &'a WeaveError;
    type IntoIter = std::iter::Map<
        std::slice::Iter<'a, Arc<WeaveError>>,
        fn(&'a Arc<WeaveError>) -> &'a WeaveError,
    >;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter().map(Arc::as_ref)
    }
}

impl IntoIterator for AggregatedErrors {
    type Item = Arc<WeaveError>;
    type IntoIter = std::vec::IntoIter<Arc<WeaveError>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
