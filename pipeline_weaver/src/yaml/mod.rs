//! Comment-preserving YAML reading and writing.
//!
//! Parsing runs the `yaml-rust2` event parser for the structure and then
//! walks the source lines to attach comments, blank-line hints and the
//! verbatim text of every block entry. Emission writes block-style YAML and
//! reuses the verbatim text of every node that was not modified.

mod emit;
mod events;
mod layout;
mod lines;

pub(crate) use emit::emit_document;
pub(crate) use layout::parse_document;
