//! `nixos-version --json`

use super::{path_matches, EnrichResult, Enricher};
use crate::error::EnrichmentFailure;
use crate::model::{Artifact, Fact, Observations};

/// The flake revision the system was built from, as
/// `nixos_configuration_revision`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NixosVersion;

impl Enricher for NixosVersion {
    fn name(&self) -> &'static str {
        "nixos_version"
    }

    fn enrich(&self, artifact: &Artifact) -> EnrichResult {
        if !path_matches("*/nixos-version.json", artifact) {
            return Ok(Observations::none());
        }
        let root = artifact.json()?;
        let revision = root
            .get("configurationRevision")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| EnrichmentFailure::MissingField("configurationRevision".to_string()))?;
        Ok(Observations::facts(vec![Fact::new(
            "nixos_configuration_revision",
            revision,
        )]))
    }
}
