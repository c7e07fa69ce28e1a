//! Change detection for generation passes.
//!
//! A pass records a fingerprint of its configuration and of every tracked
//! input in a JSON cache file. The next pass compares fresh fingerprints
//! against that record and skips all work when nothing changed. A cache
//! that is missing, unreadable or malformed only forces regeneration.

mod detector;
mod fingerprint;
mod record;

pub use detector::ChangeDetector;
pub use fingerprint::{FileFingerprint, config_hash, fingerprint};
pub use record::{CACHE_VERSION, CacheRecord};
