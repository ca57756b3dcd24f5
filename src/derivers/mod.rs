//! Derivers: compute new observations from a run's existing ones
//!
//! Derivation is best-effort. A deriver whose inputs are missing logs at
//! debug level and returns empty [`Observations`]; it never fails.
//!
//! Derivers run in registration order and each one sees what the earlier
//! ones produced for the same run. The built-in order matters:
//!
//! 1. [`AsiEnablement`] reads `kconfig` and `cmdline_fields`, writes `asi_on`.
//! 2. [`RetbleedMitigation`] reads `asi_on` (from 1) and
//!    `sysfs_cpu_vuln:retbleed`, writes `retbleed_mitigation`.
//! 3. [`DefaultInstrumented`] fills `instrumented = false` where no enricher
//!    or deriver set it, so it must stay last.

mod asi;
mod instrumented;
mod retbleed;

pub use asi::AsiEnablement;
pub use instrumented::DefaultInstrumented;
pub use retbleed::RetbleedMitigation;

use crate::model::{Observations, RunResult};

/// Computes observations from a run's facts and metrics.
pub trait Deriver: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Inspect `run`; return empty observations if the inputs are absent.
    fn derive(&self, run: &RunResult) -> Observations;
}

/// The built-in derivers, in dependency order.
#[must_use]
pub fn builtin() -> Vec<Box<dyn Deriver>> {
    vec![
        Box::new(AsiEnablement),
        Box::new(RetbleedMitigation),
        Box::new(DefaultInstrumented),
    ]
}
