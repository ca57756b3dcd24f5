//! bpftrace ASI exit counter log

use regex::Regex;

use super::{name_matches, read_text, EnrichResult, Enricher};
use crate::error::EnrichmentFailure;
use crate::model::{Artifact, Fact, Metric, Observations};

const TOTAL_EXITS_PATTERN: &str = r"@total_exits:\s+(\d+)";

/// `asi_exits` metric plus `instrumented = true` from a bpftrace log.
///
/// The counter is expected once per log. If it appears more than once the
/// last value wins and a warning is logged. A log without the counter
/// yields nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct BpftraceAsiExits;

impl Enricher for BpftraceAsiExits {
    fn name(&self) -> &'static str {
        "bpftrace"
    }

    fn enrich(&self, artifact: &Artifact) -> EnrichResult {
        if !name_matches("bpftrace_asi_exits.log", artifact) {
            return Ok(Observations::none());
        }
        let pattern = Regex::new(TOTAL_EXITS_PATTERN)
            .map_err(|e| EnrichmentFailure::malformed(e.to_string()))?;
        let text = read_text(artifact)?;

        let mut exits: Option<i64> = None;
        for line in text.lines() {
            let Some(caps) = pattern.captures(line) else {
                continue;
            };
            let count = caps[1]
                .parse::<i64>()
                .map_err(|e| EnrichmentFailure::malformed(format!("bad @total_exits count: {e}")))?;
            if let Some(previous) = exits.replace(count) {
                tracing::warn!(
                    artifact = %artifact.path().display(),
                    previous,
                    count,
                    "multiple @total_exits lines, keeping the last"
                );
            }
        }

        Ok(exits.map_or_else(Observations::none, |count| Observations {
            facts: vec![Fact::new("instrumented", true)],
            metrics: vec![Metric::new("asi_exits", count)],
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Value;
    use crate::enrichers::test_support::artifact_at;

    #[test]
    fn test_bpftrace_total_exits() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = artifact_at(
            dir.path(),
            "bpftrace_asi_exits.log",
            "Attaching 2 probes...\n\n@exits[asi_exit_to_user]: 12\n@total_exits: 48211\n",
        );
        let obs = BpftraceAsiExits.enrich(&artifact).unwrap();
        assert_eq!(obs.facts, vec![Fact::new("instrumented", true)]);
        assert_eq!(obs.metrics, vec![Metric::new("asi_exits", 48211_i64)]);
    }

    #[test]
    fn test_bpftrace_last_match_wins() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = artifact_at(
            dir.path(),
            "bpftrace_asi_exits.log",
            "@total_exits: 1\n@total_exits: 2\n",
        );
        let obs = BpftraceAsiExits.enrich(&artifact).unwrap();
        assert_eq!(obs.metrics[0].value(), &Value::Int(2));
    }

    #[test]
    fn test_bpftrace_without_counter_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = artifact_at(dir.path(), "bpftrace_asi_exits.log", "Attaching 2 probes...\n");
        assert!(BpftraceAsiExits.enrich(&artifact).unwrap().is_empty());
    }
}
