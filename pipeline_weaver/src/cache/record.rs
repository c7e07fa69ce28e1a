//! The persisted cache record.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use camino::Utf8Path;
use serde::{Deserialize, Serialize};

use super::FileFingerprint;
use crate::fs::{read_optional, write_text};
use crate::{WeaveResult, WeaveResultExt};

/// Format version written to new cache files. A record with any other
/// version is ignored.
pub const CACHE_VERSION: &str = "1";

/// Contents of the cache file, stored as camelCase JSON.
///
/// # Examples
///
/// ```
/// use pipeline_weaver::CacheRecord;
///
/// let record: CacheRecord = serde_json::from_str(
///     r#"{"files": {}, "configHash": "abc", "lastGenerated": 0, "version": "1"}"#,
/// )?;
/// assert!(record.managed.is_empty());
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheRecord {
    /// Fingerprints keyed by tracked path.
    pub files: BTreeMap<String, FileFingerprint>,
    /// Hash of the canonical JSON configuration.
    pub config_hash: String,
    /// Time of the pass that wrote the record, in epoch milliseconds.
    pub last_generated: u64,
    /// Cache format version.
    pub version: String,
    /// Managed keys per collection path, used to retire keys later runs no
    /// longer produce.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub managed: BTreeMap<String, Vec<String>>,
}

impl CacheRecord {
    /// Read the record at `path`.
    ///
    /// Every failure is a cache miss: a missing file is logged at `debug`,
    /// an unreadable or malformed one at `warn`.
    #[must_use]
    pub fn load(path: &Utf8Path) -> Option<Self> {
        let text = match read_optional(path) {
            Ok(Some(text)) => text,
            Ok(None) => {
                tracing::debug!(cache = %path, "no cache file");
                return None;
            }
            Err(err) => {
                tracing::warn!(cache = %path, error = %err, "cache file is unreadable; ignoring it");
                return None;
            }
        };
        match serde_json::from_str(&text) {
            Ok(record) => Some(record),
            Err(err) => {
                tracing::warn!(cache = %path, error = %err, "cache file is malformed; ignoring it");
                None
            }
        }
    }

    /// Write the record to `path` as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns [`crate::WeaveError::Io`] when the file cannot be written.
    pub fn save(&self, path: &Utf8Path) -> WeaveResult<()> {
        let mut text = serde_json::to_string_pretty(self).into_weave()?;
        text.push('\n');
        write_text(path, &text)
    }
}

/// Milliseconds since the Unix epoch.
pub(super) fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
}
