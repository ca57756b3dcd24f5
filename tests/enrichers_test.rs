//! Built-in enrichers against the checked-in fixture runs

use std::path::PathBuf;

use falba::enrichers::{
    BpftraceAsiExits, Enricher, FioJson, Kconfig, NixosVersion, OsRelease, SysfsCpuVulnerabilities,
};
use falba::{Artifact, EnrichmentFailure, Fact, Metric, Value};

const ASI_ON_RUN: &str = "nixos-asi-benchmarks:836d59863d4a";
const ASI_OFF_RUN: &str = "nixos-asi-benchmarks:d6b0e7e4b7b4";

fn artifact(run: &str, name: &str) -> Artifact {
    let path: PathBuf = [env!("CARGO_MANIFEST_DIR"), "tests/testdata/results", run, "artifacts", name]
        .iter()
        .collect();
    Artifact::new(path).unwrap()
}

// =============================================================================
// os-release
// =============================================================================

#[test]
fn test_os_release_variant_id() {
    for (run, variant) in [(ASI_ON_RUN, "aethelred-asi-on"), (ASI_OFF_RUN, "aethelred-asi-off")] {
        let obs = OsRelease.enrich(&artifact(run, "etc_os-release")).unwrap();
        assert_eq!(obs.facts, vec![Fact::new("os_release_variant_id", variant)], "{run}");
        assert!(obs.metrics.is_empty());
    }
}

// =============================================================================
// FIO
// =============================================================================

#[test]
fn test_fio_json_plus() {
    let cases = [
        (ASI_ON_RUN, 56960.234619, 56932.733276, 17448.349308),
        (ASI_OFF_RUN, 52777.721008, 52755.286926, 18853.855006),
    ];
    for (run, lat, clat, iops) in cases {
        let obs = FioJson.enrich(&artifact(run, "fio_output.json")).unwrap();
        assert!(obs.facts.is_empty(), "expected no facts from FIO output");
        assert_eq!(
            obs.metrics,
            vec![
                Metric::new("fio_randread_read_lat_ns_mean", lat),
                Metric::new("fio_randread_read_slat_ns_mean", 0.0),
                Metric::new("fio_randread_read_clat_ns_mean", clat),
                Metric::new("fio_randread_read_iops", iops),
            ],
            "{run}"
        );
    }
}

// =============================================================================
// nixos-version
// =============================================================================

#[test]
fn test_nixos_version_json() {
    let cases = [
        (ASI_ON_RUN, "1254e976fb3bfe9ea80a6a23e9456248149f36eb"),
        (ASI_OFF_RUN, "f1034e1fd7e67e1a4297386446a1339727abf647"),
    ];
    for (run, revision) in cases {
        let obs = NixosVersion.enrich(&artifact(run, "nixos-version.json")).unwrap();
        assert!(obs.metrics.is_empty());
        assert_eq!(obs.facts, vec![Fact::new("nixos_configuration_revision", revision)]);
    }
}

#[test]
fn test_nixos_version_without_revision_is_failure_not_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run:1/artifacts/nixos-version.json");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, r#"{"nixosVersion":"24.11.20241105.dirty"}"#).unwrap();

    let result = NixosVersion.enrich(&Artifact::new(path).unwrap());
    assert!(matches!(result, Err(EnrichmentFailure::MissingField(_))));
}

// =============================================================================
// bpftrace
// =============================================================================

#[test]
fn test_bpftrace_logs() {
    let log = artifact(ASI_ON_RUN, "bpftrace_asi_exits.log");
    let expected = std::fs::read_to_string(log.path())
        .unwrap()
        .lines()
        .find_map(|l| l.strip_prefix("@total_exits:"))
        .and_then(|n| n.trim().parse::<i64>().ok())
        .expect("fixture has a @total_exits line");

    let obs = BpftraceAsiExits.enrich(&log).unwrap();
    assert!(obs.facts.contains(&Fact::new("instrumented", true)));
    assert!(obs.metrics.contains(&Metric::new("asi_exits", expected)));
}

// =============================================================================
// kconfig / sysfs
// =============================================================================

#[test]
fn test_kconfig_fixture() {
    let obs = Kconfig.enrich(&artifact(ASI_ON_RUN, "kconfig")).unwrap();
    let options = obs.facts[0].value().as_mapping().unwrap();
    assert_eq!(
        options.get("CONFIG_ADDRESS_SPACE_ISOLATION_DEFAULT_ON"),
        Some(&Value::from("y"))
    );
    assert!(!options.contains_key("# CONFIG_MITIGATION_SLS is not set"));
}

#[test]
fn test_sysfs_fixture() {
    let obs = SysfsCpuVulnerabilities
        .enrich(&artifact(ASI_OFF_RUN, "tmp/sysfs_cpu.tgz"))
        .unwrap();
    assert_eq!(obs.facts.len(), 3);
    assert!(obs.facts.contains(&Fact::new(
        "sysfs_cpu_vuln:retbleed",
        "Mitigation: untrained return thunk; SMT disabled"
    )));
}

#[test]
fn test_fixture_artifacts_are_claimed_by_one_enricher_each() {
    let names = [
        "ansible_facts.json",
        "etc_os-release",
        "fio_output.json",
        "kconfig",
        "nixos-version.json",
        "tmp/sysfs_cpu.tgz",
        "bpftrace_asi_exits.log",
    ];
    for name in names {
        let artifact = artifact(ASI_ON_RUN, name);
        let claimed: Vec<_> = falba::enrichers::builtin()
            .into_iter()
            .filter(|e| !e.enrich(&artifact).unwrap().is_empty())
            .map(|e| e.name())
            .collect();
        assert_eq!(claimed.len(), 1, "{name} claimed by {claimed:?}");
    }
}
