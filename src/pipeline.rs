//! Ordered enricher and deriver registries

use std::fmt;

use crate::derivers::{self, Deriver};
use crate::enrichers::{self, Enricher};
use crate::{Database, Result};

/// The two plugin stages run over a [`Database`].
///
/// Order is part of the contract: enricher order fixes metric order within
/// a run, and later derivers may read what earlier ones wrote.
pub struct Pipeline {
    enrichers: Vec<Box<dyn Enricher>>,
    derivers: Vec<Box<dyn Deriver>>,
}

impl Pipeline {
    /// All built-in enrichers and derivers, in their documented order.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            enrichers: enrichers::builtin(),
            derivers: derivers::builtin(),
        }
    }

    /// No plugins at all.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            enrichers: Vec::new(),
            derivers: Vec::new(),
        }
    }

    /// Register an enricher after the existing ones.
    #[must_use]
    pub fn with_enricher(mut self, enricher: impl Enricher + 'static) -> Self {
        self.enrichers.push(Box::new(enricher));
        self
    }

    /// Register a deriver after the existing ones.
    #[must_use]
    pub fn with_deriver(mut self, deriver: impl Deriver + 'static) -> Self {
        self.derivers.push(Box::new(deriver));
        self
    }

    /// Registered enrichers.
    #[must_use]
    pub fn enrichers(&self) -> &[Box<dyn Enricher>] {
        &self.enrichers
    }

    /// Registered derivers.
    #[must_use]
    pub fn derivers(&self) -> &[Box<dyn Deriver>] {
        &self.derivers
    }

    /// Enrich, then derive.
    ///
    /// # Errors
    ///
    /// Returns the first enrichment failure or fact-name collision.
    pub fn run(&self, db: &mut Database) -> Result<()> {
        db.enrich_with(&self.enrichers)?;
        db.derive_with(&self.derivers)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::builtin()
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("enrichers", &self.enrichers.iter().map(|e| e.name()).collect::<Vec<_>>())
            .field("derivers", &self.derivers.iter().map(|d| d.name()).collect::<Vec<_>>())
            .finish()
    }
}
