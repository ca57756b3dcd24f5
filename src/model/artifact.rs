//! Artifact - one raw output file of a benchmark run

use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Read-only accessor for a single artifact file.
///
/// Existence is checked at construction so enrichers never re-check it.
/// Content is read lazily on each access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    path: PathBuf,
}

impl Artifact {
    /// Wrap an existing path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingPath`] if nothing exists at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.exists() {
            return Err(Error::MissingPath(path));
        }
        Ok(Self { path })
    }

    /// Get the artifact path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Base name of the artifact, or `""` if it has none.
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }

    /// Raw bytes.
    ///
    /// # Errors
    ///
    /// Returns the underlying IO error if the file can't be read.
    pub fn content(&self) -> std::io::Result<Vec<u8>> {
        std::fs::read(&self.path)
    }

    /// Content decoded as JSON.
    ///
    /// # Errors
    ///
    /// Returns a decode error if the content is not valid JSON (IO errors
    /// are folded into the same error type).
    pub fn json(&self) -> serde_json::Result<serde_json::Value> {
        let bytes = self.content().map_err(serde_json::Error::io)?;
        serde_json::from_slice(&bytes)
    }
}
