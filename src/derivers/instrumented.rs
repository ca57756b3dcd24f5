//! Default for the `instrumented` fact

use super::Deriver;
use crate::model::{Fact, Observations, RunResult};

/// Sets `instrumented = false` on runs where nothing set it to `true`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultInstrumented;

impl Deriver for DefaultInstrumented {
    fn name(&self) -> &'static str {
        "instrumented"
    }

    fn derive(&self, run: &RunResult) -> Observations {
        if run.fact("instrumented").is_some() {
            return Observations::none();
        }
        Observations::facts(vec![Fact::new("instrumented", false)])
    }
}
