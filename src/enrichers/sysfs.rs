//! gzip-tar snapshot of `/sys/devices/system/cpu`

use std::io::{Cursor, Read};
use std::path::Path;

use flate2::read::GzDecoder;

use super::{glob_matches, path_matches, EnrichResult, Enricher};
use crate::error::EnrichmentFailure;
use crate::model::{Artifact, Fact, Observations};

const VULNERABILITIES_GLOB: &str = "sys/devices/system/cpu/vulnerabilities/*";

/// One `sysfs_cpu_vuln:<name>` fact per CPU vulnerability file in the
/// archive.
#[derive(Debug, Clone, Copy, Default)]
pub struct SysfsCpuVulnerabilities;

impl Enricher for SysfsCpuVulnerabilities {
    fn name(&self) -> &'static str {
        "sysfs_cpu"
    }

    fn enrich(&self, artifact: &Artifact) -> EnrichResult {
        if !path_matches("*/tmp/sysfs_cpu.tgz", artifact) {
            return Ok(Observations::none());
        }
        let bytes = artifact.content()?;
        let mut archive = tar::Archive::new(GzDecoder::new(Cursor::new(bytes)));

        let mut facts = Vec::new();
        for entry in archive.entries()? {
            let mut entry = entry?;
            if !entry.header().entry_type().is_file() {
                continue;
            }
            let member = entry.path()?.to_string_lossy().into_owned();
            let member = member.trim_start_matches('/').trim_start_matches("./");
            if !glob_matches(VULNERABILITIES_GLOB, Path::new(member)) {
                continue;
            }
            let Some(basename) = Path::new(member).file_name().map(|n| n.to_string_lossy().into_owned())
            else {
                continue;
            };

            let mut content = String::new();
            entry
                .read_to_string(&mut content)
                .map_err(|e| EnrichmentFailure::malformed(format!("{member}: {e}")))?;
            // sysfs files report a page-sized length, so tar pads them with NULs.
            let value = content.trim_matches('\0').trim();
            facts.push(Fact::new(format!("sysfs_cpu_vuln:{basename}"), value));
        }
        Ok(Observations::facts(facts))
    }
}
