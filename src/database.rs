//! Database - every run under one results directory

use std::collections::BTreeMap;
use std::path::Path;

use crate::derivers::Deriver;
use crate::enrichers::Enricher;
use crate::model::{Observations, RunResult};
use crate::pipeline::Pipeline;
use crate::table::FlatTable;
use crate::{Error, Result};

/// Root aggregate: run identifier to [`RunResult`].
///
/// Built once from a directory snapshot, then filled in by an enrichment
/// pass and a derivation pass. After that it is only read.
#[derive(Debug, Clone, Default)]
pub struct Database {
    results: BTreeMap<String, RunResult>,
}

impl Database {
    /// Create a builder that loads a directory and runs a pipeline on it.
    #[must_use]
    pub fn builder() -> DatabaseBuilder {
        DatabaseBuilder::default()
    }

    /// Wrap already-constructed runs, keyed by identifier.
    #[must_use]
    pub fn new(results: impl IntoIterator<Item = RunResult>) -> Self {
        Self {
            results: results
                .into_iter()
                .map(|r| (r.identifier().to_string(), r))
                .collect(),
        }
    }

    /// Read every entry of `dir` as a run directory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotADirectory`] if `dir` or any entry in it is not
    /// a directory, plus any error from [`RunResult::read_dir`].
    pub fn read_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(Error::NotADirectory(dir.to_path_buf()));
        }
        let mut results = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            results.push(RunResult::read_dir(entry?.path())?);
        }
        tracing::info!(root = %dir.display(), results = results.len(), "read results directory");
        Ok(Self::new(results))
    }

    /// Runs keyed by identifier.
    #[must_use]
    pub const fn results(&self) -> &BTreeMap<String, RunResult> {
        &self.results
    }

    /// Look up one run.
    #[must_use]
    pub fn get(&self, result_id: &str) -> Option<&RunResult> {
        self.results.get(result_id)
    }

    /// Iterate runs in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &RunResult> {
        self.results.values()
    }

    /// Number of runs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// True when there are no runs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Run every enricher over every artifact of every run.
    ///
    /// All observations are collected first; if any enricher fails nothing
    /// is applied. Fact-name collisions are likewise checked for every run
    /// before any run is touched. Within a run, observations are applied
    /// enricher by enricher, artifact by artifact (path order).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Enrichment`] naming the first failing artifact, or
    /// [`Error::DuplicateFact`].
    pub fn enrich_with(&mut self, enrichers: &[Box<dyn Enricher>]) -> Result<()> {
        tracing::info!(results = self.len(), enrichers = enrichers.len(), "enrichment pass");

        #[cfg(feature = "rayon")]
        let staged: Vec<Observations> = {
            use rayon::prelude::*;
            self.results
                .par_iter()
                .map(|(_, run)| collect_enrichment(run, enrichers))
                .collect::<Result<_>>()?
        };
        #[cfg(not(feature = "rayon"))]
        let staged: Vec<Observations> = self
            .results
            .values()
            .map(|run| collect_enrichment(run, enrichers))
            .collect::<Result<_>>()?;

        for (run, obs) in self.results.values().zip(&staged) {
            run.check(obs)?;
        }
        let mut facts = 0;
        let mut metrics = 0;
        for (run, obs) in self.results.values_mut().zip(staged) {
            facts += obs.facts.len();
            metrics += obs.metrics.len();
            run.apply(obs)?;
        }
        tracing::info!(facts, metrics, "enrichment pass complete");
        Ok(())
    }

    /// Run every deriver over every run.
    ///
    /// Each deriver's output is applied before the next deriver runs, so a
    /// deriver can consume facts produced earlier in the same pass.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateFact`] if a deriver emits a fact the run
    /// already has.
    pub fn derive_with(&mut self, derivers: &[Box<dyn Deriver>]) -> Result<()> {
        tracing::info!(results = self.len(), derivers = derivers.len(), "derivation pass");
        for run in self.results.values_mut() {
            for deriver in derivers {
                let obs = deriver.derive(run);
                if obs.is_empty() {
                    continue;
                }
                tracing::debug!(
                    result_id = run.identifier(),
                    deriver = deriver.name(),
                    facts = obs.facts.len(),
                    metrics = obs.metrics.len(),
                    "derived"
                );
                run.apply(obs)?;
            }
        }
        Ok(())
    }

    /// One row per `(run, metric)` with the run's facts as extra columns.
    ///
    /// Child runs are not included.
    #[must_use]
    pub fn flatten(&self) -> FlatTable {
        FlatTable::from_database(self)
    }
}

fn collect_enrichment(run: &RunResult, enrichers: &[Box<dyn Enricher>]) -> Result<Observations> {
    let mut staged = Observations::none();
    for enricher in enrichers {
        for artifact in run.artifacts().values() {
            let obs = enricher.enrich(artifact).map_err(|source| Error::Enrichment {
                artifact: artifact.path().to_path_buf(),
                enricher: enricher.name(),
                source,
            })?;
            if !obs.is_empty() {
                tracing::debug!(
                    result_id = run.identifier(),
                    enricher = enricher.name(),
                    artifact = %artifact.path().display(),
                    facts = obs.facts.len(),
                    metrics = obs.metrics.len(),
                    "enriched"
                );
            }
            staged.extend(obs);
        }
    }
    Ok(staged)
}

/// Database builder
///
/// Loads a results directory and runs a [`Pipeline`] over it.
#[derive(Debug, Default)]
pub struct DatabaseBuilder {
    pipeline: Pipeline,
}

impl DatabaseBuilder {
    /// Replace the pipeline (default: [`Pipeline::builtin`]).
    #[must_use]
    pub fn pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// Append an enricher to the pipeline.
    #[must_use]
    pub fn enricher(mut self, enricher: impl Enricher + 'static) -> Self {
        self.pipeline = self.pipeline.with_enricher(enricher);
        self
    }

    /// Append a deriver to the pipeline.
    #[must_use]
    pub fn deriver(mut self, deriver: impl Deriver + 'static) -> Self {
        self.pipeline = self.pipeline.with_deriver(deriver);
        self
    }

    /// Read `dir` and run the pipeline over it.
    ///
    /// # Errors
    ///
    /// Returns structural errors from reading the tree and any error from
    /// [`Pipeline::run`].
    pub fn load(self, dir: impl AsRef<Path>) -> Result<Database> {
        let mut db = Database::read_dir(dir)?;
        self.pipeline.run(&mut db)?;
        Ok(db)
    }
}
