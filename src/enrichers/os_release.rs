//! `/etc/os-release` copy

use super::{name_matches, read_text, EnrichResult, Enricher};
use crate::error::EnrichmentFailure;
use crate::model::{Artifact, Fact, Observations};

/// `VARIANT_ID` from an os-release file, as `os_release_variant_id`.
///
/// Values are shell-quoted; every line must be a single shell token.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRelease;

impl Enricher for OsRelease {
    fn name(&self) -> &'static str {
        "os_release"
    }

    fn enrich(&self, artifact: &Artifact) -> EnrichResult {
        if !name_matches("etc_os-release", artifact) {
            return Ok(Observations::none());
        }
        let text = read_text(artifact)?;
        let mut facts = Vec::new();
        for line in text.lines() {
            let tokens = shlex::split(line).ok_or_else(|| {
                EnrichmentFailure::malformed(format!("unbalanced quoting in os-release line: {line}"))
            })?;
            let token = match tokens.as_slice() {
                [] => continue,
                [token] => token,
                _ => {
                    return Err(EnrichmentFailure::malformed(format!(
                        "os-release line is not a single assignment: {line}"
                    )))
                }
            };
            if let Some(("VARIANT_ID", value)) = token.split_once('=') {
                facts.push(Fact::new("os_release_variant_id", value));
            }
        }
        Ok(Observations::facts(facts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrichers::test_support::artifact_at;

    #[test]
    fn test_os_release_variant_id() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = artifact_at(
            dir.path(),
            "etc_os-release",
            "ANSI_COLOR=\"1;34\"\nNAME=NixOS\nPRETTY_NAME=\"NixOS 24.11 (Vicuna)\"\n\nVARIANT_ID=aethelred-asi-on\n",
        );
        let obs = OsRelease.enrich(&artifact).unwrap();
        assert_eq!(obs.facts, vec![Fact::new("os_release_variant_id", "aethelred-asi-on")]);
        assert!(obs.metrics.is_empty());
    }

    #[test]
    fn test_os_release_quoted_variant() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = artifact_at(dir.path(), "etc_os-release", "VARIANT_ID='asi off'\n");
        let obs = OsRelease.enrich(&artifact).unwrap();
        assert_eq!(obs.facts, vec![Fact::new("os_release_variant_id", "asi off")]);
    }

    #[test]
    fn test_os_release_multiple_tokens_fails() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = artifact_at(dir.path(), "etc_os-release", "NAME=Nix OS\n");
        assert!(matches!(OsRelease.enrich(&artifact), Err(EnrichmentFailure::Malformed(_))));
    }
}
