//! Extensions for mapping errors to `WeaveResult` concisely.
//!
//! These helpers reduce repetitive `.map_err(|e| WeaveError::…(e).into())`
//! patterns when converting external error types into the crate's
//! `WeaveResult<T>` alias (`Result<T, Arc<WeaveError>>`).
//!
//! # Examples
//!
//! ```
//! use pipeline_weaver::{WeaveResult, WeaveResultExt};
//!
//! fn encode() -> WeaveResult<serde_json::Value> {
//!     // serde_json::Error implements Into<WeaveError>
//!     serde_json::to_value(&42).into_weave()
//! }
//! ```

use crate::{WeaveError, WeaveResult};
use std::sync::Arc;

/// Generic extension for mapping any `Result<T, E>` with `E: Into<WeaveError>`
/// into a `WeaveResult<T>`.
pub trait WeaveResultExt<T, E> {
    /// Convert `Result<T, E>` into `WeaveResult<T>` using `Into<WeaveError>`.
    ///
    /// # Errors
    ///
    /// Propagates the original error after conversion into `Arc<WeaveError>`.
    fn into_weave(self) -> WeaveResult<T>;
}

impl<T, E> WeaveResultExt<T, E> for Result<T, E>
where
    E: Into<WeaveError>,
{
    fn into_weave(self) -> WeaveResult<T> {
        self.map_err(|e| Arc::new(e.into()))
    }
}
