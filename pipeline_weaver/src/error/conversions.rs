//! Trait-based conversions between external error types and `WeaveError`.

use super::WeaveError;

impl From<figment::Error> for WeaveError {
    fn from(e: figment::Error) -> Self {
        Self::Settings(Box::new(e))
    }
}

impl From<serde_saphyr::Error> for WeaveError {
    fn from(e: serde_saphyr::Error) -> Self {
        Self::parse_failure("YAML operation list", e)
    }
}
