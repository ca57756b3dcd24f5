//! Address Space Isolation enablement

use std::collections::BTreeMap;

use super::Deriver;
use crate::model::{Fact, Observations, RunResult, Value};

/// Classifies ASI as `"no"`, `"yes"` or `"kvm_only"` into fact `asi_on`.
///
/// ASI is on when it is built in and either default-on without
/// `asi=off`, or default-off with `asi=on`. `asi_userspace=off` restricts
/// it to KVM.
#[derive(Debug, Clone, Copy, Default)]
pub struct AsiEnablement;

impl Deriver for AsiEnablement {
    fn name(&self) -> &'static str {
        "asi_on"
    }

    fn derive(&self, run: &RunResult) -> Observations {
        let kconfig = run.fact("kconfig").and_then(|f| f.value().as_mapping());
        let cmdline = run.fact("cmdline_fields").and_then(|f| f.value().as_mapping());
        let (Some(kconfig), Some(cmdline)) = (kconfig, cmdline) else {
            tracing::debug!(
                result_id = run.identifier(),
                has_kconfig = kconfig.is_some(),
                has_cmdline = cmdline.is_some(),
                "couldn't derive ASI enablement"
            );
            return Observations::none();
        };
        Observations::facts(vec![Fact::new("asi_on", classify(kconfig, cmdline))])
    }
}

fn classify(kconfig: &BTreeMap<String, Value>, cmdline: &BTreeMap<String, Value>) -> &'static str {
    let is = |map: &BTreeMap<String, Value>, key: &str, want: &str| {
        map.get(key).and_then(Value::as_str) == Some(want)
    };

    if !is(kconfig, "CONFIG_MITIGATION_ADDRESS_SPACE_ISOLATION", "y") {
        return "no";
    }
    let asi_on = if is(kconfig, "CONFIG_ADDRESS_SPACE_ISOLATION_DEFAULT_ON", "y") {
        !is(cmdline, "asi", "off")
    } else {
        is(cmdline, "asi", "on")
    };
    match (asi_on, is(cmdline, "asi_userspace", "off")) {
        (false, _) => "no",
        (true, true) => "kvm_only",
        (true, false) => "yes",
    }
}
