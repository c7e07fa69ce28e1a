//! Error types produced by the merge engine, the preservation pass and the
//! generation driver.

mod aggregate;
mod constructors;
mod conversions;
mod types;

pub use aggregate::AggregatedErrors;
pub use types::WeaveError;

#[cfg(test)]
mod tests;
