//! Flat analysis table (Arrow/Parquet)
//!
//! One row per `(run, metric)`; every fact of the run is broadcast onto
//! each of its metric rows as an extra column. Runs without metrics
//! produce no rows.
//!
//! ```text
//! result_id | test_name | metric | value | unit | <fact 1> | <fact 2> | ...
//! ```
//!
//! Dynamic columns are typed from their cells when converted to Arrow:
//! all `Int` becomes Int64, any mix of `Int`/`Float` becomes Float64, all
//! `Bool` becomes Boolean, all `Timestamp` becomes a UTC microsecond
//! timestamp; anything else (strings, mappings, mixed) becomes Utf8.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, BooleanArray, Float64Array, Int64Array, RecordBatch, StringArray,
    TimestampMicrosecondArray,
};
use arrow::datatypes::{Field, Schema};

use crate::model::{Metric, Value};
use crate::{Database, Error, Result};

/// Fixed leading columns of every flat table.
pub const FIXED_COLUMNS: [&str; 5] = ["result_id", "test_name", "metric", "value", "unit"];

/// Prefix applied to a fact column whose name collides with a fixed column.
pub const FACT_COLUMN_PREFIX: &str = "fact:";

/// One metric of one run, with the run's facts alongside.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatRow {
    /// Run identifier.
    pub result_id: String,
    /// Run test name.
    pub test_name: String,
    /// Metric name.
    pub metric: String,
    /// Metric value.
    pub value: Value,
    /// Metric unit.
    pub unit: Option<String>,
    /// Fact values, aligned with [`FlatTable::fact_names`]; `None` where
    /// the run lacks that fact.
    pub facts: Vec<Option<Value>>,
}

/// Facts and metrics of one run recovered from a [`FlatTable`].
#[derive(Debug, Clone, PartialEq)]
pub struct RegroupedRun {
    /// Run test name.
    pub test_name: String,
    /// Facts present on the run's rows.
    pub facts: BTreeMap<String, Value>,
    /// Metrics in row order.
    pub metrics: Vec<Metric>,
}

/// Denormalised `(run, metric)` table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatTable {
    fact_names: Vec<String>,
    rows: Vec<FlatRow>,
}

impl FlatTable {
    /// Flatten the top-level runs of `db`.
    ///
    /// Fact columns are the sorted union of fact names over all runs,
    /// including runs that contribute no rows.
    #[must_use]
    pub fn from_database(db: &Database) -> Self {
        let fact_names: Vec<String> = db
            .iter()
            .flat_map(|run| run.facts().keys().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut rows = Vec::new();
        for run in db.iter() {
            let facts: Vec<Option<Value>> = fact_names
                .iter()
                .map(|name| run.fact(name).map(|f| f.value().clone()))
                .collect();
            for metric in run.metrics() {
                rows.push(FlatRow {
                    result_id: run.identifier().to_string(),
                    test_name: run.test_name().to_string(),
                    metric: metric.name().to_string(),
                    value: metric.value().clone(),
                    unit: metric.unit().map(str::to_string),
                    facts: facts.clone(),
                });
            }
        }
        tracing::debug!(rows = rows.len(), fact_columns = fact_names.len(), "flattened database");
        Self { fact_names, rows }
    }

    /// Fact names backing the dynamic columns, sorted.
    #[must_use]
    pub fn fact_names(&self) -> &[String] {
        &self.fact_names
    }

    /// Column names of the dynamic fact columns, after collision renaming.
    #[must_use]
    pub fn fact_columns(&self) -> Vec<String> {
        self.fact_names
            .iter()
            .map(|name| {
                if FIXED_COLUMNS.contains(&name.as_str()) {
                    format!("{FACT_COLUMN_PREFIX}{name}")
                } else {
                    name.clone()
                }
            })
            .collect()
    }

    /// All column names in order.
    #[must_use]
    pub fn columns(&self) -> Vec<String> {
        FIXED_COLUMNS
            .iter()
            .map(|c| (*c).to_string())
            .chain(self.fact_columns())
            .collect()
    }

    /// Rows in run-identifier order, then metric insertion order.
    #[must_use]
    pub fn rows(&self) -> &[FlatRow] {
        &self.rows
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when there are no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Value of fact `name` on `row`, if the run has it.
    #[must_use]
    pub fn fact<'a>(&self, row: &'a FlatRow, name: &str) -> Option<&'a Value> {
        let idx = self
            .fact_names
            .binary_search_by(|n| n.as_str().cmp(name))
            .ok()?;
        row.facts.get(idx)?.as_ref()
    }

    /// Invert flattening: group rows by run identifier.
    #[must_use]
    pub fn regroup(&self) -> BTreeMap<String, RegroupedRun> {
        let mut runs: BTreeMap<String, RegroupedRun> = BTreeMap::new();
        for row in &self.rows {
            let run = runs.entry(row.result_id.clone()).or_insert_with(|| RegroupedRun {
                test_name: row.test_name.clone(),
                facts: self
                    .fact_names
                    .iter()
                    .zip(&row.facts)
                    .filter_map(|(name, v)| v.clone().map(|v| (name.clone(), v)))
                    .collect(),
                metrics: Vec::new(),
            });
            run.metrics.push(match &row.unit {
                Some(unit) => Metric::with_unit(row.metric.clone(), row.value.clone(), unit.clone()),
                None => Metric::new(row.metric.clone(), row.value.clone()),
            });
        }
        runs
    }

    /// Convert to a single Arrow record batch.
    ///
    /// # Errors
    ///
    /// Returns an Arrow error if the batch can't be assembled.
    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        let width = FIXED_COLUMNS.len() + self.fact_names.len();
        let mut fields: Vec<Field> = Vec::with_capacity(width);
        let mut columns: Vec<ArrayRef> = Vec::with_capacity(width);

        for (name, column) in [
            ("result_id", text_column(self.rows.iter().map(|r| r.result_id.as_str()))),
            ("test_name", text_column(self.rows.iter().map(|r| r.test_name.as_str()))),
            ("metric", text_column(self.rows.iter().map(|r| r.metric.as_str()))),
        ] {
            fields.push(Field::new(name, column.data_type().clone(), false));
            columns.push(column);
        }

        let values: Vec<Option<&Value>> = self.rows.iter().map(|r| Some(&r.value)).collect();
        let values = value_column(&values);
        fields.push(Field::new("value", values.data_type().clone(), true));
        columns.push(values);

        let units: StringArray = self.rows.iter().map(|r| r.unit.as_deref()).collect();
        fields.push(Field::new("unit", units.data_type().clone(), true));
        columns.push(Arc::new(units));

        for (idx, name) in self.fact_columns().into_iter().enumerate() {
            let cells: Vec<Option<&Value>> =
                self.rows.iter().map(|r| r.facts[idx].as_ref()).collect();
            let column = value_column(&cells);
            fields.push(Field::new(name, column.data_type().clone(), true));
            columns.push(column);
        }

        Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
    }

    /// Write the table as a single-row-group Parquet file.
    ///
    /// # Errors
    ///
    /// Returns error if the file can't be created or written.
    pub fn write_parquet<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        use parquet::arrow::ArrowWriter;

        let batch = self.to_record_batch()?;
        let file = File::create(path.as_ref())
            .map_err(|e| Error::StorageError(format!("Failed to create Parquet file: {e}")))?;
        let mut writer = ArrowWriter::try_new(file, batch.schema(), None)
            .map_err(|e| Error::StorageError(format!("Failed to create Parquet writer: {e}")))?;
        writer
            .write(&batch)
            .map_err(|e| Error::StorageError(format!("Failed to write record batch: {e}")))?;
        writer
            .close()
            .map_err(|e| Error::StorageError(format!("Failed to finish Parquet file: {e}")))?;
        Ok(())
    }
}

/// Load all record batches from a Parquet file (e.g. one written by
/// [`FlatTable::write_parquet`]).
///
/// # Errors
///
/// Returns error if file cannot be read or parsed
pub fn load_parquet<P: AsRef<Path>>(path: P) -> Result<Vec<RecordBatch>> {
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

    let file = File::open(path.as_ref())
        .map_err(|e| Error::StorageError(format!("Failed to open Parquet file: {e}")))?;

    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .map_err(|e| Error::StorageError(format!("Failed to parse Parquet file: {e}")))?;

    let reader = builder
        .build()
        .map_err(|e| Error::StorageError(format!("Failed to create Parquet reader: {e}")))?;

    let mut batches = Vec::new();
    for batch in reader {
        let batch =
            batch.map_err(|e| Error::StorageError(format!("Failed to read record batch: {e}")))?;
        batches.push(batch);
    }
    Ok(batches)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Int,
    Float,
    Bool,
    Timestamp,
    Utf8,
}

fn infer_kind(cells: &[Option<&Value>]) -> ColumnKind {
    let mut kind = None;
    for value in cells.iter().flatten() {
        let this = match value {
            Value::Int(_) => ColumnKind::Int,
            Value::Float(_) => ColumnKind::Float,
            Value::Bool(_) => ColumnKind::Bool,
            Value::Timestamp(_) => ColumnKind::Timestamp,
            Value::String(_) | Value::Mapping(_) => return ColumnKind::Utf8,
        };
        kind = Some(match (kind, this) {
            (None, k) => k,
            (Some(a), b) if a == b => a,
            (Some(ColumnKind::Int | ColumnKind::Float), ColumnKind::Int | ColumnKind::Float) => {
                ColumnKind::Float
            }
            _ => return ColumnKind::Utf8,
        });
    }
    kind.unwrap_or(ColumnKind::Utf8)
}

fn text_column<'a>(values: impl Iterator<Item = &'a str>) -> ArrayRef {
    Arc::new(StringArray::from_iter_values(values))
}

fn value_column(cells: &[Option<&Value>]) -> ArrayRef {
    match infer_kind(cells) {
        ColumnKind::Int => Arc::new(
            cells
                .iter()
                .map(|c| match c {
                    Some(Value::Int(i)) => Some(*i),
                    _ => None,
                })
                .collect::<Int64Array>(),
        ),
        ColumnKind::Float => Arc::new(
            cells
                .iter()
                .map(|c| c.and_then(Value::as_f64))
                .collect::<Float64Array>(),
        ),
        ColumnKind::Bool => Arc::new(
            cells
                .iter()
                .map(|c| c.and_then(Value::as_bool))
                .collect::<BooleanArray>(),
        ),
        ColumnKind::Timestamp => Arc::new(
            cells
                .iter()
                .map(|c| match c {
                    Some(Value::Timestamp(ts)) => Some(ts.timestamp_micros()),
                    _ => None,
                })
                .collect::<TimestampMicrosecondArray>()
                .with_timezone("UTC"),
        ),
        ColumnKind::Utf8 => Arc::new(
            cells
                .iter()
                .map(|c| c.map(ToString::to_string))
                .collect::<StringArray>(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::datatypes::DataType;

    #[test]
    fn test_infer_kind() {
        let i = Value::Int(1);
        let f = Value::Float(1.5);
        let s = Value::from("x");
        let b = Value::Bool(true);
        assert_eq!(infer_kind(&[Some(&i), None]), ColumnKind::Int);
        assert_eq!(infer_kind(&[Some(&i), Some(&f)]), ColumnKind::Float);
        assert_eq!(infer_kind(&[Some(&b), None]), ColumnKind::Bool);
        assert_eq!(infer_kind(&[Some(&i), Some(&s)]), ColumnKind::Utf8);
        assert_eq!(infer_kind(&[Some(&b), Some(&i)]), ColumnKind::Utf8);
        assert_eq!(infer_kind(&[None, None]), ColumnKind::Utf8);
    }

    #[test]
    fn test_value_column_nulls() {
        let i = Value::Int(7);
        let column = value_column(&[Some(&i), None]);
        assert_eq!(column.data_type(), &DataType::Int64);
        assert_eq!(column.null_count(), 1);
    }

    #[test]
    fn test_empty_table_batch() {
        let batch = FlatTable::default().to_record_batch().unwrap();
        assert_eq!(batch.num_rows(), 0);
        assert_eq!(batch.num_columns(), FIXED_COLUMNS.len());
    }
}
