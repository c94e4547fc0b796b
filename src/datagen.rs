//! Synthetic benchmark data
//!
//! The dataset is generated once from a single random source and then
//! materialized into each backend's native representation, so every backend
//! is timed against exactly the same values.

use crate::errors::{BenchError, BenchResult};
use crate::ops::{GROUP_COLUMN, ID_COLUMN};
use arrow::array::{ArrayRef, Float64Array, Int64Array};
use arrow::datatypes::{DataType as ArrowDataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use polars::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

/// Smallest column count that still carries `col_0..col_3`.
pub const MIN_COLUMNS: usize = 5;
/// `group` values are drawn from `0..GROUP_CARDINALITY`.
pub const GROUP_CARDINALITY: i64 = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub numeric: Vec<Vec<f64>>,
    pub group: Vec<i64>,
    pub id: Vec<i64>,
}

impl Dataset {
    /// Generate `n_rows` rows: `n_cols - 1` numeric columns followed by
    /// `group` and `id`.
    pub fn generate(n_rows: usize, n_cols: usize, seed: Option<u64>) -> BenchResult<Self> {
        if n_rows == 0 {
            return Err(BenchError::InvalidConfig(
                "row count must be a positive integer".to_string(),
            ));
        }
        if n_cols < MIN_COLUMNS {
            return Err(BenchError::InvalidConfig(format!(
                "column count must be at least {}, got {}",
                MIN_COLUMNS, n_cols
            )));
        }

        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let numeric = (0..n_cols - 1)
            .map(|_| (0..n_rows).map(|_| rng.gen::<f64>()).collect())
            .collect();
        let group = (0..n_rows)
            .map(|_| rng.gen_range(0..GROUP_CARDINALITY))
            .collect();
        let id = (0..n_rows as i64).collect();

        Ok(Self { numeric, group, id })
    }

    pub fn n_rows(&self) -> usize {
        self.id.len()
    }

    /// The configured column count (`col_0..col_{n_cols - 2}` plus `group`).
    pub fn n_cols(&self) -> usize {
        self.numeric.len() + 1
    }

    /// Number of columns in the materialized table, `id` included.
    pub fn width(&self) -> usize {
        self.numeric.len() + 2
    }

    pub fn column_names(&self) -> Vec<String> {
        let mut names: Vec<String> = (0..self.numeric.len())
            .map(|i| format!("col_{}", i))
            .collect();
        names.push(GROUP_COLUMN.to_string());
        names.push(ID_COLUMN.to_string());
        names
    }

    /// Values of the numeric column `name` (`col_<i>`), if present.
    pub fn numeric_column(&self, name: &str) -> Option<&[f64]> {
        let idx: usize = name.strip_prefix("col_")?.parse().ok()?;
        self.numeric.get(idx).map(Vec::as_slice)
    }

    pub fn to_polars(&self) -> BenchResult<DataFrame> {
        let names = self.column_names();
        let mut columns: Vec<Column> = self
            .numeric
            .iter()
            .zip(names.iter())
            .map(|(values, name)| Column::new(name.as_str().into(), values.as_slice()))
            .collect();
        columns.push(Column::new(GROUP_COLUMN.into(), self.group.as_slice()));
        columns.push(Column::new(ID_COLUMN.into(), self.id.as_slice()));
        Ok(DataFrame::new(columns)?)
    }

    pub fn to_record_batch(&self) -> BenchResult<RecordBatch> {
        let names = self.column_names();
        let mut fields = Vec::with_capacity(names.len());
        let mut arrays: Vec<ArrayRef> = Vec::with_capacity(names.len());

        for (values, name) in self.numeric.iter().zip(names.iter()) {
            fields.push(Field::new(name.as_str(), ArrowDataType::Float64, false));
            arrays.push(Arc::new(Float64Array::from(values.clone())));
        }
        fields.push(Field::new(GROUP_COLUMN, ArrowDataType::Int64, false));
        arrays.push(Arc::new(Int64Array::from(self.group.clone())));
        fields.push(Field::new(ID_COLUMN, ArrowDataType::Int64, false));
        arrays.push(Arc::new(Int64Array::from(self.id.clone())));

        Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?)
    }
}
