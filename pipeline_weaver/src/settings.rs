//! Settings for a generation pass.

use camino::Utf8PathBuf;
use figment::Figment;
use figment::providers::{Env, Serialized};
use serde::{Deserialize, Serialize};

use crate::{WeaveResult, WeaveResultExt};

/// Prefix of the environment variables read by [`PassSettings::load`].
pub const ENV_PREFIX: &str = "PIPELINE_WEAVER_";

/// How a generation pass reads, writes and caches.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PassSettings {
    /// Document to regenerate.
    pub output_file: Utf8PathBuf,
    /// Fingerprint cache location.
    pub cache_file: Utf8PathBuf,
    /// Inputs whose changes force regeneration.
    pub inputs: Vec<Utf8PathBuf>,
    /// Skip the pass when nothing changed since the last one.
    pub skip_unchanged: bool,
    /// Run the pass even when nothing changed.
    pub force: bool,
    /// Render the document without writing it or the cache.
    pub dry_run: bool,
}

impl Default for PassSettings {
    fn default() -> Self {
        Self {
            output_file: Utf8PathBuf::from(".gitlab-ci.yml"),
            cache_file: Utf8PathBuf::from(".pipeline-weaver-cache.json"),
            inputs: Vec::new(),
            skip_unchanged: true,
            force: false,
            dry_run: false,
        }
    }
}

impl PassSettings {
    /// Defaults overlaid by `PIPELINE_WEAVER_*` environment variables, for
    /// example `PIPELINE_WEAVER_DRY_RUN=true`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::WeaveError::Settings`] when a variable does not
    /// parse into its field.
    pub fn load() -> WeaveResult<Self> {
        Self::load_over(&Self::default())
    }

    /// Like [`PassSettings::load`] with caller-supplied defaults.
    ///
    /// # Errors
    ///
    /// See [`PassSettings::load`].
    pub fn load_over(defaults: &Self) -> WeaveResult<Self> {
        Self::figment(defaults).extract().into_weave()
    }

    /// The layered settings sources.
    #[must_use]
    pub fn figment(defaults: &Self) -> Figment {
        Figment::from(Serialized::defaults(defaults)).merge(Env::prefixed(ENV_PREFIX))
    }
}

#[cfg(test)]
mod tests {
    use camino::Utf8PathBuf;
    use rstest::rstest;

    use super::PassSettings;
    use crate::WeaveError;

    #[rstest]
    fn environment_overrides_defaults() -> anyhow::Result<()> {
        let settings = test_helpers::figment::with_jail(|jail| {
            jail.set_env("PIPELINE_WEAVER_DRY_RUN", "true");
            jail.set_env("PIPELINE_WEAVER_OUTPUT_FILE", "ci/pipeline.yml");
            jail.set_env("PIPELINE_WEAVER_INPUTS", "[weaver.toml, templates]");
            PassSettings::load().map_err(test_helpers::figment::figment_error)
        })?;
        assert!(settings.dry_run);
        assert!(settings.skip_unchanged);
        assert_eq!(settings.output_file, Utf8PathBuf::from("ci/pipeline.yml"));
        assert_eq!(
            settings.inputs,
            [Utf8PathBuf::from("weaver.toml"), Utf8PathBuf::from("templates")]
        );
        Ok(())
    }

    #[rstest]
    fn malformed_values_are_settings_errors() -> anyhow::Result<()> {
        let err = test_helpers::figment::with_jail(|jail| {
            jail.set_env("PIPELINE_WEAVER_FORCE", "[1, 2]");
            Ok(PassSettings::load().expect_err("force must be a boolean"))
        })?;
        assert!(matches!(err.as_ref(), WeaveError::Settings(_)));
        Ok(())
    }
}
