//! Ansible `setup` fact dump

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value as Json;

use super::{EnrichResult, Enricher};
use crate::error::EnrichmentFailure;
use crate::model::{Artifact, Fact, Observations, Value};

/// Host facts from an `ansible_facts.json` dump.
///
/// Produces `cmdline_fields` (mapping), `nproc`, `memory` (MB),
/// `kernel_version`, `timestamp` and a synthesised `cpu` model string.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnsibleFacts;

impl Enricher for AnsibleFacts {
    fn name(&self) -> &'static str {
        "ansible"
    }

    fn enrich(&self, artifact: &Artifact) -> EnrichResult {
        if artifact.file_name() != "ansible_facts.json" {
            return Ok(Observations::none());
        }
        let root = artifact.json()?;

        // Ansible doesn't give us the raw command line, only the parsed fields.
        let cmdline = Value::from_json(field(&root, "ansible_cmdline")?)
            .filter(|v| v.as_mapping().is_some())
            .ok_or_else(|| EnrichmentFailure::malformed("ansible_cmdline is not a flat object"))?;
        let nproc = field(&root, "ansible_processor_nproc")?
            .as_i64()
            .ok_or_else(|| EnrichmentFailure::malformed("ansible_processor_nproc is not an integer"))?;
        let memory = field(&root, "ansible_memtotal_mb")?
            .as_i64()
            .ok_or_else(|| EnrichmentFailure::malformed("ansible_memtotal_mb is not an integer"))?;
        let kernel = string_field(field(&root, "ansible_facts")?, "kernel")?;
        let timestamp = parse_timestamp(&string_field(
            field(&root, "ansible_date_time")?,
            "iso8601_micro",
        )?)?;
        let cpu = cpu_model(field(&root, "ansible_processor")?)?;

        Ok(Observations::facts(vec![
            Fact::new("cmdline_fields", cmdline),
            Fact::new("nproc", nproc),
            Fact::with_unit("memory", memory, "MB"),
            Fact::new("kernel_version", kernel),
            Fact::new("timestamp", timestamp),
            Fact::new("cpu", cpu),
        ]))
    }
}

fn field<'a>(obj: &'a Json, key: &str) -> Result<&'a Json, EnrichmentFailure> {
    obj.get(key)
        .ok_or_else(|| EnrichmentFailure::MissingField(key.to_string()))
}

fn string_field(obj: &Json, key: &str) -> Result<String, EnrichmentFailure> {
    field(obj, key)?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| EnrichmentFailure::malformed(format!("{key} is not a string")))
}

/// ISO-8601 with offset, or naive (taken as UTC).
fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, EnrichmentFailure> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| EnrichmentFailure::malformed(format!("bad timestamp {raw:?}: {e}")))
}

/// `ansible_processor` is a flat list of consecutive
/// `(index, vendor, model)` triples, one per logical CPU.
fn cpu_model(processor: &Json) -> Result<String, EnrichmentFailure> {
    let items = processor
        .as_array()
        .ok_or_else(|| EnrichmentFailure::malformed("ansible_processor is not a list"))?;
    if items.len() % 3 != 0 {
        return Err(EnrichmentFailure::malformed(format!(
            "ansible_processor has {} entries, not a multiple of 3",
            items.len()
        )));
    }

    let mut models: Vec<String> = Vec::new();
    for triple in items.chunks_exact(3) {
        let index_ok = match &triple[0] {
            Json::String(s) => s.parse::<u32>().is_ok(),
            Json::Number(n) => n.is_u64(),
            _ => false,
        };
        let (Some(vendor), Some(model), true) = (triple[1].as_str(), triple[2].as_str(), index_ok)
        else {
            return Err(EnrichmentFailure::malformed(format!(
                "bad ansible_processor entry {triple:?}"
            )));
        };
        let model = format!("{vendor} {model}");
        if !models.contains(&model) {
            models.push(model);
        }
    }
    Ok(models.join(" + "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrichers::test_support::artifact_at;

    fn dump() -> serde_json::Value {
        serde_json::json!({
            "ansible_cmdline": {"BOOT_IMAGE": "/boot/bzImage", "asi": "on", "quiet": true},
            "ansible_processor_nproc": 4,
            "ansible_memtotal_mb": 15842,
            "ansible_facts": {"kernel": "6.9.0-asi"},
            "ansible_date_time": {"iso8601_micro": "2024-11-05T10:42:17.123456Z"},
            "ansible_processor": [
                "0", "GenuineIntel", "Intel(R) Xeon(R) Gold 6130",
                "1", "GenuineIntel", "Intel(R) Xeon(R) Gold 6130",
                "2", "AuthenticAMD", "AMD EPYC 7B13",
                "3", "GenuineIntel", "Intel(R) Xeon(R) Gold 6130"
            ]
        })
    }

    #[test]
    fn test_ansible_facts() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = artifact_at(dir.path(), "ansible_facts.json", dump().to_string());
        let obs = AnsibleFacts.enrich(&artifact).unwrap();

        assert!(obs.metrics.is_empty());
        assert!(obs.facts.contains(&Fact::new("nproc", 4_i64)));
        assert!(obs.facts.contains(&Fact::with_unit("memory", 15842_i64, "MB")));
        assert!(obs.facts.contains(&Fact::new("kernel_version", "6.9.0-asi")));
        assert!(obs.facts.contains(&Fact::new(
            "cpu",
            "GenuineIntel Intel(R) Xeon(R) Gold 6130 + AuthenticAMD AMD EPYC 7B13"
        )));

        let ts = obs.facts.iter().find(|f| f.name() == "timestamp").unwrap();
        let Value::Timestamp(ts) = ts.value() else {
            panic!("timestamp fact is {:?}", ts.value());
        };
        assert_eq!(ts.timestamp_subsec_micros(), 123_456);

        let cmdline = obs.facts.iter().find(|f| f.name() == "cmdline_fields").unwrap();
        let fields = cmdline.value().as_mapping().unwrap();
        assert_eq!(fields.get("asi"), Some(&Value::from("on")));
    }

    #[test]
    fn test_ansible_missing_field_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut facts = dump();
        facts.as_object_mut().unwrap().remove("ansible_memtotal_mb");
        let artifact = artifact_at(dir.path(), "ansible_facts.json", facts.to_string());
        let err = AnsibleFacts.enrich(&artifact).unwrap_err();
        assert!(matches!(err, EnrichmentFailure::MissingField(ref f) if f == "ansible_memtotal_mb"));
    }

    #[test]
    fn test_ansible_ragged_processor_list_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut facts = dump();
        facts["ansible_processor"] = serde_json::json!(["0", "GenuineIntel"]);
        let artifact = artifact_at(dir.path(), "ansible_facts.json", facts.to_string());
        assert!(matches!(
            AnsibleFacts.enrich(&artifact),
            Err(EnrichmentFailure::Malformed(_))
        ));
    }

    #[test]
    fn test_ansible_naive_timestamp_is_utc() {
        let ts = parse_timestamp("2024-11-05T10:42:17.000001").unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-11-05T10:42:17.000001+00:00");
    }
}
