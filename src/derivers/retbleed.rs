//! Effective retbleed mitigation

use super::Deriver;
use crate::model::{Fact, Observations, RunResult, Value};

/// Combines `asi_on` with the kernel-reported retbleed state into
/// `retbleed_mitigation`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetbleedMitigation;

impl Deriver for RetbleedMitigation {
    fn name(&self) -> &'static str {
        "retbleed_mitigation"
    }

    fn derive(&self, run: &RunResult) -> Observations {
        let asi_on = run.fact("asi_on").and_then(|f| f.value().as_str());
        let sysfs = run
            .fact("sysfs_cpu_vuln:retbleed")
            .and_then(|f| f.value().as_str());
        let (Some(asi_on), Some(sysfs)) = (asi_on, sysfs) else {
            tracing::debug!(
                result_id = run.identifier(),
                facts = ?run.facts().keys().collect::<Vec<_>>(),
                "couldn't derive retbleed mitigation"
            );
            return Observations::none();
        };

        let mitigation = if asi_on == "no" {
            sysfs.to_string()
        } else if sysfs == "Vulnerable" {
            "ASI".to_string()
        } else {
            format!("ASI + {sysfs}")
        };
        Observations::facts(vec![Fact::new("retbleed_mitigation", Value::from(mitigation))])
    }
}
