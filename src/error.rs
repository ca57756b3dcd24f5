//! Error types for falba
//!
//! Two layers: [`EnrichmentFailure`] is what an enricher reports about a
//! single artifact it recognised but could not parse; [`Error`] is what the
//! crate surfaces to callers, with the offending artifact attached.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// falba error types
#[derive(Error, Debug)]
pub enum Error {
    /// A path expected to be a run directory is not a directory
    #[error("{0} is not a directory, can't be read as a result")]
    NotADirectory(PathBuf),

    /// Artifact path does not exist
    #[error("{0} doesn't exist, can't create artifact")]
    MissingPath(PathBuf),

    /// Run directory name is not `<test-name>:<disambiguator>`
    #[error("invalid result directory name {0:?}: expected <test-name>:<id>")]
    InvalidRunName(String),

    /// An enricher recognised an artifact but failed to parse it
    #[error("failed to enrich artifact {artifact} with {enricher}: {source}")]
    Enrichment {
        /// Path of the offending artifact
        artifact: PathBuf,
        /// Name of the enricher that failed
        enricher: &'static str,
        /// Underlying failure
        #[source]
        source: EnrichmentFailure,
    },

    /// A second fact with an existing name was produced for one result
    #[error("fact {name} already exists on result {result_id}")]
    DuplicateFact {
        /// Result the fact was being added to
        result_id: String,
        /// Fact name
        name: String,
    },

    /// Parquet read/write error
    #[error("Storage error: {0}")]
    StorageError(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Arrow error
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
}

/// Failure of an enricher on an artifact it claimed.
///
/// Distinct from "not applicable", which enrichers express by returning
/// empty observations.
#[derive(Error, Debug)]
pub enum EnrichmentFailure {
    /// Artifact content could not be read
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),

    /// Artifact content is not valid JSON
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A required field is absent
    #[error("missing field {0}")]
    MissingField(String),

    /// Content has the wrong shape
    #[error("malformed content: {0}")]
    Malformed(String),
}

impl EnrichmentFailure {
    /// Shorthand for [`EnrichmentFailure::Malformed`].
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }
}
