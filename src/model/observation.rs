//! Facts and metrics - the observations attached to a run

use serde::{Deserialize, Serialize};

use super::Value;

/// A named observation describing the system or environment of a run.
///
/// Within one [`RunResult`](super::RunResult) fact names are unique.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Fact {
    name: String,
    value: Value,
    unit: Option<String>,
}

impl Fact {
    /// Create a unitless fact.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            unit: None,
        }
    }

    /// Create a fact with a unit (e.g. `"MB"`).
    #[must_use]
    pub fn with_unit(
        name: impl Into<String>,
        value: impl Into<Value>,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            unit: Some(unit.into()),
        }
    }

    /// Get the fact name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the fact value.
    #[must_use]
    pub const fn value(&self) -> &Value {
        &self.value
    }

    /// Get the unit, if any.
    #[must_use]
    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }
}

/// A measured observation from a run.
///
/// Unlike facts, many metrics may share a name (repeated samples); their
/// order within a run is insertion order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Metric {
    name: String,
    value: Value,
    unit: Option<String>,
}

impl Metric {
    /// Create a unitless metric.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            unit: None,
        }
    }

    /// Create a metric with a unit.
    #[must_use]
    pub fn with_unit(
        name: impl Into<String>,
        value: impl Into<Value>,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            unit: Some(unit.into()),
        }
    }

    /// Get the metric name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the metric value.
    #[must_use]
    pub const fn value(&self) -> &Value {
        &self.value
    }

    /// Get the unit, if any.
    #[must_use]
    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }
}

/// The `(facts, metrics)` pair returned by every enricher and deriver.
///
/// Empty means "not applicable".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Observations {
    /// Facts, in production order.
    pub facts: Vec<Fact>,
    /// Metrics, in production order.
    pub metrics: Vec<Metric>,
}

impl Observations {
    /// Nothing observed.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Facts only.
    #[must_use]
    pub fn facts(facts: Vec<Fact>) -> Self {
        Self {
            facts,
            metrics: Vec::new(),
        }
    }

    /// Metrics only.
    #[must_use]
    pub fn metrics(metrics: Vec<Metric>) -> Self {
        Self {
            facts: Vec::new(),
            metrics,
        }
    }

    /// True when neither facts nor metrics were produced.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.facts.is_empty() && self.metrics.is_empty()
    }

    /// Append another batch, preserving order.
    pub fn extend(&mut self, other: Self) {
        self.facts.extend(other.facts);
        self.metrics.extend(other.metrics);
    }
}
