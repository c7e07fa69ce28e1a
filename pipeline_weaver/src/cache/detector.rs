//! Decides whether a generation pass has work to do.

use std::collections::BTreeMap;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;

use super::record::now_ms;
use super::{CACHE_VERSION, CacheRecord, FileFingerprint, config_hash, fingerprint};
use crate::WeaveResult;
use crate::settings::PassSettings;

/// Compares configuration and tracked inputs against the cache file.
///
/// # Examples
///
/// ```no_run
/// use pipeline_weaver::ChangeDetector;
/// use serde_json::json;
///
/// let detector = ChangeDetector::new(".weaver-cache.json").track("templates");
/// let config = json!({"stages": ["build", "test"]});
/// if detector.has_changes(&config) {
///     // ... regenerate ...
///     detector.update_cache(&config, Default::default())?;
/// }
/// # Ok::<(), std::sync::Arc<pipeline_weaver::WeaveError>>(())
/// ```
#[derive(Clone, Debug)]
pub struct ChangeDetector {
    cache_file: Utf8PathBuf,
    inputs: Vec<Utf8PathBuf>,
    skip_unchanged: bool,
    force: bool,
}

impl ChangeDetector {
    /// A detector backed by `cache_file`, tracking no inputs.
    pub fn new(cache_file: impl Into<Utf8PathBuf>) -> Self {
        Self {
            cache_file: cache_file.into(),
            inputs: Vec::new(),
            skip_unchanged: true,
            force: false,
        }
    }

    /// A detector configured from pass settings.
    #[must_use]
    pub fn from_settings(settings: &PassSettings) -> Self {
        Self {
            cache_file: settings.cache_file.clone(),
            inputs: settings.inputs.clone(),
            skip_unchanged: settings.skip_unchanged,
            force: settings.force,
        }
    }

    /// Track another input file or directory.
    #[must_use]
    pub fn track(mut self, input: impl Into<Utf8PathBuf>) -> Self {
        self.inputs.push(input.into());
        self
    }

    /// Whether an unchanged configuration skips the pass.
    #[must_use]
    pub const fn skip_unchanged(mut self, skip: bool) -> Self {
        self.skip_unchanged = skip;
        self
    }

    /// Whether every pass runs regardless of the cache.
    #[must_use]
    pub const fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Path of the cache file.
    #[must_use]
    pub fn cache_file(&self) -> &Utf8Path {
        &self.cache_file
    }

    /// Load the cache record, treating any failure as a miss.
    #[must_use]
    pub fn load(&self) -> Option<CacheRecord> {
        CacheRecord::load(&self.cache_file)
    }

    /// Returns `true` when a pass must run for `config`.
    #[must_use]
    pub fn has_changes<T: Serialize + ?Sized>(&self, config: &T) -> bool {
        self.has_changes_against(config, self.load().as_ref())
    }

    /// Like [`ChangeDetector::has_changes`], against an already loaded
    /// record.
    #[must_use]
    pub fn has_changes_against<T: Serialize + ?Sized>(&self, config: &T, cached: Option<&CacheRecord>) -> bool {
        match self.change_reason(config, cached) {
            Some(reason) => {
                tracing::debug!(reason, "regeneration required");
                true
            }
            None => false,
        }
    }

    fn change_reason<T: Serialize + ?Sized>(&self, config: &T, cached: Option<&CacheRecord>) -> Option<&'static str> {
        if !self.skip_unchanged {
            return Some("skipping unchanged passes is disabled");
        }
        if self.force {
            return Some("forced");
        }
        let Some(cached) = cached else {
            return Some("no usable cache");
        };
        if cached.version != CACHE_VERSION {
            return Some("cache format version differs");
        }
        match config_hash(config) {
            Ok(hash) if hash == cached.config_hash => {}
            Ok(_) => return Some("configuration changed"),
            Err(err) => {
                tracing::warn!(error = %err, "cannot hash configuration");
                return Some("configuration cannot be hashed");
            }
        }
        match self.fingerprints() {
            Ok(files) if files == cached.files => None,
            Ok(_) => Some("tracked inputs changed"),
            Err(err) => {
                tracing::warn!(error = %err, "cannot fingerprint tracked inputs");
                Some("tracked inputs cannot be fingerprinted")
            }
        }
    }

    fn fingerprints(&self) -> WeaveResult<BTreeMap<String, FileFingerprint>> {
        let mut files = BTreeMap::new();
        for input in &self.inputs {
            if let Some(print) = fingerprint(input)? {
                files.insert(input.as_str().to_owned(), print);
            }
        }
        Ok(files)
    }

    /// Recompute every fingerprint and persist a fresh record.
    ///
    /// `managed` lists the managed keys of each collection so later passes
    /// can retire keys that stop being produced.
    ///
    /// # Errors
    ///
    /// Returns an error when the configuration cannot be hashed, an input
    /// cannot be read or the cache file cannot be written.
    pub fn update_cache<T: Serialize + ?Sized>(
        &self,
        config: &T,
        managed: BTreeMap<String, Vec<String>>,
    ) -> WeaveResult<CacheRecord> {
        let record = CacheRecord {
            files: self.fingerprints()?,
            config_hash: config_hash(config)?,
            last_generated: now_ms(),
            version: CACHE_VERSION.to_owned(),
            managed,
        };
        record.save(&self.cache_file)?;
        tracing::debug!(cache = %self.cache_file, files = record.files.len(), "cache updated");
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};
    use serde_json::json;
    use test_helpers::workspace::Workspace;

    use super::ChangeDetector;
    use crate::cache::{CACHE_VERSION, CacheRecord};
    use crate::fs::write_text;

    #[fixture]
    fn workspace() -> Workspace {
        Workspace::new().expect("create workspace")
    }

    fn detector_for(ws: &Workspace) -> ChangeDetector {
        ChangeDetector::new(ws.path("cache.json")).track(ws.path("input.txt"))
    }

    #[rstest]
    fn unchanged_after_update(workspace: Workspace) {
        write_text(&workspace.path("input.txt"), "one").expect("write input");
        let detector = detector_for(&workspace);
        let config = json!({"name": "demo"});
        assert!(detector.has_changes(&config), "no cache yet");
        detector.update_cache(&config, Default::default()).expect("update");
        assert!(!detector.has_changes(&config));
        assert!(detector.clone().force(true).has_changes(&config));
        assert!(detector.clone().skip_unchanged(false).has_changes(&config));
    }

    #[rstest]
    fn config_and_input_changes_are_detected(workspace: Workspace) {
        let input = workspace.path("input.txt");
        write_text(&input, "one").expect("write input");
        let detector = detector_for(&workspace);
        let config = json!({"name": "demo"});
        detector.update_cache(&config, Default::default()).expect("update");
        assert!(detector.has_changes(&json!({"name": "other"})));
        write_text(&input, "two").expect("rewrite input");
        assert!(detector.has_changes(&config));
    }

    #[rstest]
    fn appearing_inputs_are_changes(workspace: Workspace) {
        let detector = detector_for(&workspace);
        let config = json!({});
        detector.update_cache(&config, Default::default()).expect("update");
        assert!(!detector.has_changes(&config));
        write_text(&workspace.path("input.txt"), "new").expect("write input");
        assert!(detector.has_changes(&config));
    }

    #[rstest]
    #[case("not json at all")]
    #[case("{\"files\": 3}")]
    fn corrupt_cache_is_a_miss(workspace: Workspace, #[case] contents: &str) {
        write_text(&workspace.path("cache.json"), contents).expect("write cache");
        let detector = detector_for(&workspace);
        assert!(detector.load().is_none());
        assert!(detector.has_changes(&json!({})));
    }

    #[rstest]
    fn version_mismatch_is_a_change(workspace: Workspace) {
        let detector = detector_for(&workspace);
        let config = json!({});
        let record = detector.update_cache(&config, Default::default()).expect("update");
        let stale = CacheRecord {
            version: format!("{CACHE_VERSION}-old"),
            ..record
        };
        stale.save(detector.cache_file()).expect("save");
        assert!(detector.has_changes(&config));
    }
}
