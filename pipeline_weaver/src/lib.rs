//! Regenerate CI pipeline documents without losing hand edits.
//!
//! `pipeline_weaver` applies declarative, path-addressed operations to a
//! comment-preserving YAML tree. Collections owned by a generator (such as
//! the jobs of a pipeline) are rebuilt on every run while entries written
//! by hand survive with their comments and original text. A fingerprint
//! cache skips passes whose configuration and inputs did not change.
//!
//! ```
//! use pipeline_weaver::{Document, ManagedCollection, Operation, preserve_collections};
//! use serde_json::json;
//!
//! let existing = "jobs:\n  build:\n    script: [old]\n  # keep me\n  lint:\n    script: [eslint .]\n";
//! let mut document = Document::parse(existing)?;
//! let collections = [ManagedCollection::new("jobs", ["build"].into_iter().collect())];
//! let operations = [Operation::set("jobs.build", json!({"script": ["cargo build"]}))];
//! preserve_collections(&mut document, &collections, &operations)?;
//! assert_eq!(
//!     document.to_yaml_string(),
//!     "jobs:\n  build:\n    script:\n      - cargo build\n  # keep me\n  lint:\n    script: [eslint .]\n",
//! );
//! # Ok::<(), std::sync::Arc<pipeline_weaver::WeaveError>>(())
//! ```

mod cache;
mod collection;
mod document;
mod engine;
mod error;
mod fs;
mod node;
mod pass;
mod path;
mod result_ext;
mod settings;
mod yaml;

pub use cache::{CACHE_VERSION, CacheRecord, ChangeDetector, FileFingerprint, config_hash, fingerprint};
pub use collection::{ManagedCollection, ManagedKeys, preserve_collections};
pub use document::Document;
pub use engine::{Operation, OperationList, Strategy, apply};
pub use error::{AggregatedErrors, WeaveError};
pub use node::{Comment, Mapping, Node, NodeKind, OperationValue, Scalar};
pub use pass::{GenerationPass, GenerationPlan, Outcome};
pub use path::{DocPath, Segment};
pub use result_ext::WeaveResultExt;
pub use settings::{ENV_PREFIX, PassSettings};

/// Result alias used throughout the crate.
///
/// Errors are reference counted so they can be shared inside
/// [`AggregatedErrors`].
pub type WeaveResult<T> = Result<T, std::sync::Arc<WeaveError>>;
