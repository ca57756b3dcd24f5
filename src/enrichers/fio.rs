//! FIO `--output-format=json` / `json+`

use serde_json::Value as Json;

use super::{name_matches, EnrichResult, Enricher};
use crate::error::EnrichmentFailure;
use crate::model::{Artifact, Metric, Observations};

/// Latency blocks whose `mean` is reported.
const LATENCY_STATS: &[&str] = &["lat_ns", "slat_ns", "clat_ns"];

/// Per-job read latency means and IOPS.
///
/// Metrics are `fio_<job>_read_<stat>_mean` for each of `lat_ns`,
/// `slat_ns`, `clat_ns`, plus `fio_<job>_read_iops`. Absent sub-fields are
/// skipped with a warning rather than failing the artifact.
#[derive(Debug, Clone, Copy, Default)]
pub struct FioJson;

impl Enricher for FioJson {
    fn name(&self) -> &'static str {
        "fio"
    }

    fn enrich(&self, artifact: &Artifact) -> EnrichResult {
        if !name_matches("fio_output*.json", artifact) {
            return Ok(Observations::none());
        }
        let root = artifact.json()?;
        let Some(jobs) = root.get("jobs") else {
            tracing::warn!(artifact = %artifact.path().display(), "FIO output has no jobs");
            return Ok(Observations::none());
        };
        let jobs = jobs
            .as_array()
            .ok_or_else(|| EnrichmentFailure::malformed("jobs is not a list"))?;

        let mut metrics = Vec::new();
        for job in jobs {
            let Some(job_name) = job.get("jobname").and_then(Json::as_str) else {
                tracing::warn!(artifact = %artifact.path().display(), "skipping FIO job without jobname");
                continue;
            };
            let read = job.get("read");

            for stat in LATENCY_STATS {
                match read.and_then(|r| r.get(stat)).and_then(|s| s.get("mean")).and_then(Json::as_f64) {
                    Some(mean) => metrics.push(Metric::new(format!("fio_{job_name}_read_{stat}_mean"), mean)),
                    None => tracing::warn!(job = job_name, stat, "FIO job is missing read mean"),
                }
            }
            match read.and_then(|r| r.get("iops")).and_then(Json::as_f64) {
                Some(iops) => metrics.push(Metric::new(format!("fio_{job_name}_read_iops"), iops)),
                None => tracing::warn!(job = job_name, "FIO job is missing read iops"),
            }
        }
        Ok(Observations::metrics(metrics))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrichers::test_support::artifact_at;

    #[test]
    fn test_fio_read_stats() {
        let dir = tempfile::tempdir().unwrap();
        let body = serde_json::json!({
            "fio version": "fio-3.37",
            "jobs": [{
                "jobname": "randread",
                "read": {
                    "iops": 17448.349308,
                    "lat_ns": {"min": 1, "mean": 56960.234619},
                    "slat_ns": {"mean": 0.0},
                    "clat_ns": {"mean": 56932.733276}
                }
            }]
        });
        let artifact = artifact_at(dir.path(), "fio_output.json", body.to_string());
        let obs = FioJson.enrich(&artifact).unwrap();

        assert!(obs.facts.is_empty());
        assert_eq!(
            obs.metrics,
            vec![
                Metric::new("fio_randread_read_lat_ns_mean", 56960.234619),
                Metric::new("fio_randread_read_slat_ns_mean", 0.0),
                Metric::new("fio_randread_read_clat_ns_mean", 56932.733276),
                Metric::new("fio_randread_read_iops", 17448.349308),
            ]
        );
    }

    #[test]
    fn test_fio_partial_stats_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let body = serde_json::json!({
            "jobs": [
                {"jobname": "seqread", "read": {"iops": 10, "clat_ns": {"mean": 5}}},
                {"read": {"iops": 1}}
            ]
        });
        let artifact = artifact_at(dir.path(), "fio_output_tmpfs.json", body.to_string());
        let obs = FioJson.enrich(&artifact).unwrap();
        assert_eq!(
            obs.metrics,
            vec![
                Metric::new("fio_seqread_read_clat_ns_mean", 5.0),
                Metric::new("fio_seqread_read_iops", 10.0),
            ]
        );
    }

    #[test]
    fn test_fio_bad_json_fails() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = artifact_at(dir.path(), "fio_output.json", "fio: error");
        assert!(matches!(FioJson.enrich(&artifact), Err(EnrichmentFailure::Json(_))));
    }
}
