//! Run data model
//!
//! ## Schema Overview
//!
//! ```text
//! Database (1) ──< RunResult (N) ──< RunResult (N) [children, recursive]
//!                      │
//!                      ├──< Artifact (N) [raw files, keyed by path]
//!                      ├──< Fact (N)     [unique by name]
//!                      └──< Metric (N)   [ordered, repeatable names]
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use falba::model::{Fact, Metric, Value};
//!
//! let fact = Fact::with_unit("memory", 15_842_i64, "MB");
//! assert_eq!(fact.unit(), Some("MB"));
//!
//! let metric = Metric::new("fio_randread_read_iops", 17_448.35);
//! assert_eq!(metric.value().as_f64(), Some(17_448.35));
//! ```

mod artifact;
mod observation;
mod run_result;
mod value;

pub use artifact::Artifact;
pub use observation::{Fact, Metric, Observations};
pub use run_result::{RunResult, RUN_NAME_DELIMITER};
pub use value::Value;
