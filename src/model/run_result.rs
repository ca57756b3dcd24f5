//! Run Result - one benchmark run and everything observed about it

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::{Artifact, Fact, Metric, Observations};
use crate::{Error, Result};

/// Delimiter between test name and disambiguator in a run directory name.
pub const RUN_NAME_DELIMITER: char = ':';

/// One benchmark run.
///
/// Owns its artifacts, the facts and metrics derived from them, and any
/// nested child runs. Facts and metrics start empty and are only filled in
/// by the enrichment and derivation passes of a
/// [`Database`](crate::Database).
#[derive(Debug, Clone)]
pub struct RunResult {
    identifier: String,
    test_name: String,
    artifacts: BTreeMap<PathBuf, Artifact>,
    facts: BTreeMap<String, Fact>,
    metrics: Vec<Metric>,
    children: BTreeMap<String, RunResult>,
}

impl RunResult {
    /// Create a run from its directory name and already-discovered parts.
    ///
    /// The test name is everything before the last `:` in `identifier`;
    /// the full string is kept as the identifier.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRunName`] if `identifier` has no `:`.
    pub fn new(
        identifier: impl Into<String>,
        artifacts: impl IntoIterator<Item = Artifact>,
        children: impl IntoIterator<Item = (String, RunResult)>,
    ) -> Result<Self> {
        let identifier = identifier.into();
        let test_name = match identifier.rsplit_once(RUN_NAME_DELIMITER) {
            Some((test_name, _)) => test_name.to_string(),
            None => return Err(Error::InvalidRunName(identifier)),
        };
        Ok(Self {
            identifier,
            test_name,
            artifacts: artifacts
                .into_iter()
                .map(|a| (a.path().to_path_buf(), a))
                .collect(),
            facts: BTreeMap::new(),
            metrics: Vec::new(),
            children: children.into_iter().collect(),
        })
    }

    /// Read a run directory.
    ///
    /// Artifacts are every non-directory entry under `artifacts/` at any
    /// depth; each entry of `children/` is read recursively as a child run.
    /// Both subdirectories are optional.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotADirectory`] if `dir` (or any child entry) is not
    /// a directory, [`Error::InvalidRunName`] for a badly named directory,
    /// and IO errors from the directory walk.
    pub fn read_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(Error::NotADirectory(dir.to_path_buf()));
        }
        let name = dir
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::InvalidRunName(dir.display().to_string()))?;

        let mut artifacts = Vec::new();
        let artifacts_dir = dir.join("artifacts");
        if artifacts_dir.is_dir() {
            for entry in WalkDir::new(&artifacts_dir).min_depth(1).sort_by_file_name() {
                let entry = entry.map_err(std::io::Error::from)?;
                if entry.path().is_dir() {
                    continue;
                }
                artifacts.push(Artifact::new(entry.into_path())?);
            }
        }

        let mut children = Vec::new();
        let children_dir = dir.join("children");
        if children_dir.is_dir() {
            for entry in std::fs::read_dir(&children_dir)? {
                let path = entry?.path();
                let child = Self::read_dir(&path)?;
                let child_name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                children.push((child_name, child));
            }
        }

        tracing::debug!(
            result_id = name,
            artifacts = artifacts.len(),
            children = children.len(),
            "read result directory"
        );
        Self::new(name, artifacts, children)
    }

    /// Full run identifier (the directory name).
    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Logical test name shared by repeated runs of the same test.
    #[must_use]
    pub fn test_name(&self) -> &str {
        &self.test_name
    }

    /// Artifacts keyed by path, in path order.
    #[must_use]
    pub const fn artifacts(&self) -> &BTreeMap<PathBuf, Artifact> {
        &self.artifacts
    }

    /// Look up one artifact by its path.
    #[must_use]
    pub fn artifact(&self, path: &Path) -> Option<&Artifact> {
        self.artifacts.get(path)
    }

    /// Facts keyed by name.
    #[must_use]
    pub const fn facts(&self) -> &BTreeMap<String, Fact> {
        &self.facts
    }

    /// Look up one fact by name.
    #[must_use]
    pub fn fact(&self, name: &str) -> Option<&Fact> {
        self.facts.get(name)
    }

    /// Metrics in insertion order.
    #[must_use]
    pub fn metrics(&self) -> &[Metric] {
        &self.metrics
    }

    /// Child runs keyed by directory name.
    #[must_use]
    pub const fn children(&self) -> &BTreeMap<String, RunResult> {
        &self.children
    }

    /// Look up one child run.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&RunResult> {
        self.children.get(name)
    }

    /// Add a fact; names are unique per run.
    pub(crate) fn add_fact(&mut self, fact: Fact) -> Result<()> {
        if self.facts.contains_key(fact.name()) {
            return Err(self.duplicate(fact.name()));
        }
        self.facts.insert(fact.name().to_string(), fact);
        Ok(())
    }

    /// Append a metric; repeated names are fine.
    pub(crate) fn add_metric(&mut self, metric: Metric) {
        self.metrics.push(metric);
    }

    /// Check that `obs` can be applied without a fact-name collision,
    /// either against existing facts or within the batch itself.
    pub(crate) fn check(&self, obs: &Observations) -> Result<()> {
        let mut seen = std::collections::BTreeSet::new();
        for fact in &obs.facts {
            if self.facts.contains_key(fact.name()) || !seen.insert(fact.name()) {
                return Err(self.duplicate(fact.name()));
            }
        }
        Ok(())
    }

    /// Apply a batch of observations atomically: nothing is added if any
    /// fact would collide.
    pub(crate) fn apply(&mut self, obs: Observations) -> Result<()> {
        self.check(&obs)?;
        for fact in obs.facts {
            self.add_fact(fact)?;
        }
        for metric in obs.metrics {
            self.add_metric(metric);
        }
        Ok(())
    }

    fn duplicate(&self, name: &str) -> Error {
        Error::DuplicateFact {
            result_id: self.identifier.clone(),
            name: name.to_string(),
        }
    }
}

impl fmt::Display for RunResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Result({})", self.identifier)?;
        writeln!(f, "\tfacts:")?;
        for fact in self.facts.values() {
            writeln!(f, "\t\t{:<30}: {}", fact.name(), fact.value())?;
        }
        writeln!(f, "\tmetrics:")?;
        for metric in &self.metrics {
            write!(f, "\t\t{:<30}: {}", metric.name(), metric.value())?;
            match metric.unit() {
                Some(unit) => writeln!(f, " {unit}")?,
                None => writeln!(f)?,
            }
        }
        Ok(())
    }
}
