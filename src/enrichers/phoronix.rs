//! Phoronix Test Suite result JSON

use serde_json::Value as Json;

use super::{path_matches, EnrichResult, Enricher};
use crate::error::EnrichmentFailure;
use crate::model::{Artifact, Metric, Observations, Value};

/// PTS test identifiers this enricher knows how to read.
const KNOWN_IDENTIFIERS: &[&str] = &["pts/fio-2.1.0"];

/// One metric per raw sample of each recognised PTS benchmark.
///
/// Metrics are named `PTS FIO [<arguments>] <scale>` with the scale as
/// unit. Unknown benchmark identifiers are logged and skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhoronixResults;

impl Enricher for PhoronixResults {
    fn name(&self) -> &'static str {
        "phoronix"
    }

    fn enrich(&self, artifact: &Artifact) -> EnrichResult {
        if !path_matches("*pts-results.json", artifact) {
            return Ok(Observations::none());
        }
        let root = artifact.json()?;
        // Keyed by a timezone-less timestamp in the data seen so far.
        let results = root
            .get("results")
            .and_then(Json::as_object)
            .ok_or_else(|| EnrichmentFailure::MissingField("results".to_string()))?;

        let mut metrics = Vec::new();
        for result in results.values() {
            let identifier = str_field(result, "identifier")?;
            if !KNOWN_IDENTIFIERS.contains(&identifier) {
                tracing::warn!(
                    artifact = %artifact.path().display(),
                    identifier,
                    "ignoring unknown Phoronix result"
                );
                continue;
            }
            let arguments = str_field(result, "arguments")?;
            let scale = str_field(result, "scale")?;
            let subresults = result
                .get("results")
                .and_then(Json::as_object)
                .ok_or_else(|| EnrichmentFailure::MissingField("results".to_string()))?;

            for subresult in subresults.values() {
                let raw_values = subresult
                    .get("raw_values")
                    .and_then(Json::as_array)
                    .ok_or_else(|| EnrichmentFailure::MissingField("raw_values".to_string()))?;
                for raw in raw_values {
                    metrics.push(Metric::with_unit(
                        format!("PTS FIO [{arguments}] {scale}"),
                        sample(raw)?,
                        scale,
                    ));
                }
            }
        }
        Ok(Observations::metrics(metrics))
    }
}

fn str_field<'a>(obj: &'a Json, key: &str) -> Result<&'a str, EnrichmentFailure> {
    obj.get(key)
        .and_then(Json::as_str)
        .ok_or_else(|| EnrichmentFailure::MissingField(key.to_string()))
}

/// PTS writes samples as numbers or as numeric strings.
fn sample(raw: &Json) -> Result<Value, EnrichmentFailure> {
    match raw {
        Json::Number(n) => n
            .as_f64()
            .map(Value::Float)
            .ok_or_else(|| EnrichmentFailure::malformed(format!("bad sample {n}"))),
        Json::String(s) => s
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| EnrichmentFailure::malformed(format!("bad sample {s:?}"))),
        other => Err(EnrichmentFailure::malformed(format!("bad sample {other}"))),
    }
}
