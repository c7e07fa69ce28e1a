//! Single-shot generation pass.
//!
//! A pass checks the change detector, parses the existing output document,
//! rebuilds the managed collections, writes the result at most once and
//! refreshes the cache. Nothing is written when any step before the write
//! fails.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::cache::{CacheRecord, ChangeDetector};
use crate::collection::{ManagedCollection, preserve_collections};
use crate::document::Document;
use crate::engine::OperationList;
use crate::fs::{read_optional, write_text};
use crate::settings::PassSettings;
use crate::WeaveResult;

/// What a generator wants the document to contain.
#[derive(Clone, Debug, Default)]
pub struct GenerationPlan {
    /// Collections whose user entries must survive.
    pub collections: Vec<ManagedCollection>,
    /// Operations applied to the document, in order.
    pub operations: OperationList,
}

/// Result of [`GenerationPass::run`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Configuration and inputs match the cache; nothing was read or written.
    Unchanged,
    /// Dry run: the rendered document, neither written nor cached.
    DryRun(String),
    /// The rendered document equals the existing file, which was left alone.
    UpToDate,
    /// The document was written.
    Written,
}

impl Outcome {
    const fn label(&self) -> &'static str {
        match self {
            Self::Unchanged => "unchanged",
            Self::DryRun(_) => "dry run",
            Self::UpToDate => "up to date",
            Self::Written => "written",
        }
    }
}

/// Drives one regeneration of the output document.
///
/// # Examples
///
/// ```no_run
/// use pipeline_weaver::{GenerationPass, GenerationPlan, ManagedCollection, Operation, PassSettings};
/// use serde_json::json;
///
/// let config = json!({"jobs": ["build"]});
/// let plan = GenerationPlan {
///     collections: vec![ManagedCollection::new("jobs", ["build"].into_iter().collect())],
///     operations: vec![Operation::set("jobs.build", json!({"script": ["make"]}))].into(),
/// };
/// let _outcome = GenerationPass::new(PassSettings::load()?).run(&config, &plan)?;
/// # Ok::<(), std::sync::Arc<pipeline_weaver::WeaveError>>(())
/// ```
#[derive(Clone, Debug)]
pub struct GenerationPass {
    settings: PassSettings,
    detector: ChangeDetector,
}

impl GenerationPass {
    /// A pass using `settings`.
    #[must_use]
    pub fn new(settings: PassSettings) -> Self {
        let detector = ChangeDetector::from_settings(&settings);
        Self { settings, detector }
    }

    /// The settings of this pass.
    #[must_use]
    pub const fn settings(&self) -> &PassSettings {
        &self.settings
    }

    /// Run the pass for `config`.
    ///
    /// # Errors
    ///
    /// Returns the first error from reading or parsing the existing
    /// document, validating or applying the plan, or writing the output.
    /// Cache problems are logged and never returned.
    pub fn run<T: Serialize + ?Sized>(&self, config: &T, plan: &GenerationPlan) -> WeaveResult<Outcome> {
        let cached = self.detector.load();
        if !self.detector.has_changes_against(config, cached.as_ref()) {
            tracing::info!(output = %self.settings.output_file, "inputs unchanged; skipping generation");
            return Ok(Outcome::Unchanged);
        }
        plan.operations.validate()?;

        let output = &self.settings.output_file;
        let existing = read_optional(output)?;
        let mut document = match &existing {
            Some(text) => Document::parse_with_context(text, output.as_str())?,
            None => Document::new(),
        };
        let collections = retire_cached_keys(&plan.collections, cached.as_ref());
        preserve_collections(&mut document, &collections, plan.operations.as_slice())?;
        let rendered = document.to_yaml_string();

        if self.settings.dry_run {
            tracing::info!(output = %output, "dry run; nothing written");
            return Ok(Outcome::DryRun(rendered));
        }
        let outcome = if existing.as_deref() == Some(rendered.as_str()) {
            Outcome::UpToDate
        } else {
            write_text(output, &rendered)?;
            Outcome::Written
        };
        if let Err(err) = self.detector.update_cache(config, managed_keys(&plan.collections)) {
            tracing::warn!(cache = %self.detector.cache_file(), error = %err, "failed to update cache");
        }
        tracing::info!(output = %output, outcome = outcome.label(), "generation pass finished");
        Ok(outcome)
    }
}

/// Extends each registry with the keys the cache recorded for its path.
fn retire_cached_keys(collections: &[ManagedCollection], cached: Option<&CacheRecord>) -> Vec<ManagedCollection> {
    collections
        .iter()
        .map(|collection| {
            let mut extended = collection.clone();
            if let Some(previous) = cached.and_then(|record| record.managed.get(&collection.path)) {
                extended.keys.retire(previous.iter().cloned());
            }
            extended
        })
        .collect()
}

fn managed_keys(collections: &[ManagedCollection]) -> BTreeMap<String, Vec<String>> {
    collections
        .iter()
        .map(|collection| {
            (
                collection.path.clone(),
                collection.keys.current().map(str::to_owned).collect(),
            )
        })
        .collect()
}
