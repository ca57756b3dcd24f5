//! Enrichers: turn one raw artifact into facts and metrics
//!
//! Each enricher decides for itself, from the artifact path, whether it
//! applies. Not applicable is an empty [`Observations`]; recognised but
//! unparsable is an [`EnrichmentFailure`], which aborts the whole
//! enrichment pass.
//!
//! | Enricher | Matches | Produces |
//! |---|---|---|
//! | [`AnsibleFacts`] | `ansible_facts.json` | host facts |
//! | [`PhoronixResults`] | `*pts-results.json` | PTS FIO samples |
//! | [`SysfsCpuVulnerabilities`] | `*/tmp/sysfs_cpu.tgz` | `sysfs_cpu_vuln:*` facts |
//! | [`Kconfig`] | `*/kconfig` | `kconfig` mapping fact |
//! | [`OsRelease`] | `etc_os-release` | `os_release_variant_id` |
//! | [`FioJson`] | `fio_output*.json` | per-job read latency/IOPS |
//! | [`NixosVersion`] | `*/nixos-version.json` | `nixos_configuration_revision` |
//! | [`BpftraceAsiExits`] | `bpftrace_asi_exits.log` | `asi_exits`, `instrumented` |

mod ansible;
mod bpftrace;
mod fio;
mod kconfig;
mod nixos;
mod os_release;
mod phoronix;
mod sysfs;

pub use ansible::AnsibleFacts;
pub use bpftrace::BpftraceAsiExits;
pub use fio::FioJson;
pub use kconfig::Kconfig;
pub use nixos::NixosVersion;
pub use os_release::OsRelease;
pub use phoronix::PhoronixResults;
pub use sysfs::SysfsCpuVulnerabilities;

use std::path::Path;

use globset::GlobBuilder;

use crate::error::EnrichmentFailure;
use crate::model::{Artifact, Observations};

/// Outcome of one enricher on one artifact.
pub type EnrichResult = std::result::Result<Observations, EnrichmentFailure>;

/// Extracts observations from a single artifact.
///
/// Implementations must not touch the run tree: they return what they
/// found and the [`Database`](crate::Database) applies it, so fact-name
/// collisions are caught in one place.
pub trait Enricher: Send + Sync {
    /// Short name used in logs and error context.
    fn name(&self) -> &'static str;

    /// Inspect `artifact`; return empty observations if it isn't ours.
    ///
    /// # Errors
    ///
    /// Returns [`EnrichmentFailure`] if the artifact is recognised but its
    /// content can't be parsed.
    fn enrich(&self, artifact: &Artifact) -> EnrichResult;
}

/// The built-in enrichers, in registration order.
#[must_use]
pub fn builtin() -> Vec<Box<dyn Enricher>> {
    vec![
        Box::new(AnsibleFacts),
        Box::new(PhoronixResults),
        Box::new(SysfsCpuVulnerabilities),
        Box::new(Kconfig),
        Box::new(OsRelease),
        Box::new(FioJson),
        Box::new(NixosVersion),
        Box::new(BpftraceAsiExits),
    ]
}

/// Shell-style glob match where `*` also crosses `/`.
///
/// Patterns are compile-time constants; an invalid one simply never
/// matches.
pub(crate) fn glob_matches(pattern: &str, path: &Path) -> bool {
    GlobBuilder::new(pattern)
        .literal_separator(false)
        .build()
        .map(|g| g.compile_matcher().is_match(path))
        .unwrap_or(false)
}

/// Match `pattern` against the full artifact path.
pub(crate) fn path_matches(pattern: &str, artifact: &Artifact) -> bool {
    glob_matches(pattern, artifact.path())
}

/// Match `pattern` against the artifact base name only.
pub(crate) fn name_matches(pattern: &str, artifact: &Artifact) -> bool {
    glob_matches(pattern, Path::new(artifact.file_name()))
}

/// Decode the artifact as UTF-8 text.
pub(crate) fn read_text(artifact: &Artifact) -> std::result::Result<String, EnrichmentFailure> {
    String::from_utf8(artifact.content()?)
        .map_err(|e| EnrichmentFailure::malformed(format!("not UTF-8: {e}")))
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::Path;

    use crate::model::Artifact;

    /// Write `content` at `rel` under `root` and wrap it as an artifact.
    pub fn artifact_at(root: &Path, rel: &str, content: impl AsRef<[u8]>) -> Artifact {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        Artifact::new(path).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::artifact_at;
    use super::*;

    #[test]
    fn test_glob_star_crosses_separator() {
        assert!(glob_matches("*/tmp/sysfs_cpu.tgz", Path::new("/r/x:1/artifacts/tmp/sysfs_cpu.tgz")));
        assert!(glob_matches("*pts-results.json", Path::new("/a/b/pts-results.json")));
        assert!(!glob_matches("*/kconfig", Path::new("/a/kconfig.old")));
    }

    #[test]
    fn test_builtin_order_and_names() {
        let names: Vec<_> = builtin().iter().map(|e| e.name()).collect();
        assert_eq!(
            names,
            ["ansible", "phoronix", "sysfs_cpu", "kconfig", "os_release", "fio", "nixos_version", "bpftrace"]
        );
    }

    #[test]
    fn test_unrelated_artifact_is_silent_for_all_builtins() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = artifact_at(dir.path(), "artifacts/stdout.txt", "hello");
        for enricher in builtin() {
            let obs = enricher.enrich(&artifact).unwrap();
            assert!(obs.is_empty(), "{} claimed stdout.txt", enricher.name());
        }
    }
}
