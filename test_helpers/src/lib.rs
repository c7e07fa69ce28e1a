//! Test helpers shared across crates.
//!
//! This crate provides environment variable guards, `figment::Jail`
//! wrappers and a scratch workspace for generation pass tests.

pub mod env;
pub mod figment;
pub mod workspace;
