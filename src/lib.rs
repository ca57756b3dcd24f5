//! # falba: benchmark artifacts to analysis tables
//!
//! falba reads a directory of benchmark runs, turns their raw artifacts
//! (JSON dumps, sysfs tarballs, kernel configs, logs) into typed facts and
//! metrics, derives further observations from those, and flattens the
//! result into one row per metric for analysis.
//!
//! ## Pipeline
//!
//! ```text
//! results dir ──read──> Database ──enrich──> facts/metrics ──derive──> more facts ──flatten──> FlatTable
//!                       (RunResult tree)     (per artifact)           (per run)              (Arrow/Parquet)
//! ```
//!
//! - **Enrichment** is strict: an artifact an enricher recognises but
//!   can't parse aborts the pass with the artifact path attached.
//! - **Derivation** is best-effort: missing inputs mean no output.
//! - **Facts** are unique by name within a run; **metrics** are an
//!   ordered, repeatable list.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use falba::Database;
//!
//! // Read results/<test>:<id>/artifacts/** and run the built-in plugins
//! let db = Database::builder().load("results")?;
//!
//! let table = db.flatten();
//! for row in table.rows() {
//!     println!("{} {} = {}", row.result_id, row.metric, row.value);
//! }
//! table.write_parquet("results.parquet")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod database;
pub mod derivers;
pub mod enrichers;
pub mod error;
pub mod model;
mod pipeline;
pub mod table;

pub use database::{Database, DatabaseBuilder};
pub use error::{EnrichmentFailure, Error, Result};
pub use model::{Artifact, Fact, Metric, Observations, RunResult, Value};
pub use pipeline::Pipeline;
