//! Kernel `.config`

use std::collections::BTreeMap;

use super::{path_matches, read_text, EnrichResult, Enricher};
use crate::error::EnrichmentFailure;
use crate::model::{Artifact, Fact, Observations, Value};

/// The whole kernel config as a single `kconfig` mapping fact.
#[derive(Debug, Clone, Copy, Default)]
pub struct Kconfig;

impl Enricher for Kconfig {
    fn name(&self) -> &'static str {
        "kconfig"
    }

    fn enrich(&self, artifact: &Artifact) -> EnrichResult {
        if !path_matches("*/kconfig", artifact) {
            return Ok(Observations::none());
        }
        let text = read_text(artifact)?;
        let mut options = BTreeMap::new();
        for line in text.lines() {
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            let (key, value) = line.split_once('=').ok_or_else(|| {
                EnrichmentFailure::malformed(format!("failed to parse kconfig line: {line}"))
            })?;
            options.insert(key.to_string(), Value::from(value));
        }
        Ok(Observations::facts(vec![Fact::new("kconfig", options)]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrichers::test_support::artifact_at;

    #[test]
    fn test_kconfig_mapping() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = artifact_at(
            dir.path(),
            "r:1/artifacts/kconfig",
            "#\n# Automatically generated file; DO NOT EDIT.\n\nCONFIG_MITIGATION_ADDRESS_SPACE_ISOLATION=y\n\
             # CONFIG_ADDRESS_SPACE_ISOLATION_DEFAULT_ON is not set\nCONFIG_LOCALVERSION=\"-asi\"\n",
        );
        let obs = Kconfig.enrich(&artifact).unwrap();
        assert_eq!(obs.facts.len(), 1);

        let options = obs.facts[0].value().as_mapping().unwrap();
        assert_eq!(options.len(), 2);
        assert_eq!(
            options.get("CONFIG_MITIGATION_ADDRESS_SPACE_ISOLATION"),
            Some(&Value::from("y"))
        );
        assert_eq!(options.get("CONFIG_LOCALVERSION"), Some(&Value::from("\"-asi\"")));
    }

    #[test]
    fn test_kconfig_bad_line_fails() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = artifact_at(dir.path(), "r:1/artifacts/kconfig", "CONFIG_A=y\ngarbage\n");
        assert!(matches!(
            Kconfig.enrich(&artifact),
            Err(EnrichmentFailure::Malformed(ref m)) if m.contains("garbage")
        ));
    }
}
