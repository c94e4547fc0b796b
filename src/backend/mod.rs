//! Dataframe backends under comparison
//!
//! Every backend implements [`TableOps`] over its own native table type.
//! [`Backend`] is the closed set of backends; the variant is chosen once when
//! the native representation is built and [`Backend::execute`] dispatches
//! with an exhaustive match.

pub mod arrow;
pub mod eager;
pub mod lazy;

use crate::datagen::Dataset;
use crate::errors::{BenchError, BenchResult};
use crate::ops::Operation;
use ::arrow::array::{Array, AsArray};
use ::arrow::datatypes::{Float64Type, Int64Type};
use ::arrow::record_batch::RecordBatch;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

pub use self::arrow::ArrowTable;
pub use self::eager::EagerTable;
pub use self::lazy::LazyTable;

/// The operation set every backend provides.
pub trait TableOps {
    type Table;

    fn filter(&self) -> BenchResult<Self::Table>;
    fn aggregate(&self) -> BenchResult<Self::Table>;
    fn sort(&self) -> BenchResult<Self::Table>;
    fn join(&self) -> BenchResult<Self::Table>;
    fn string_manipulation(&self) -> BenchResult<Self::Table>;
    fn write_parquet(&self, path: &Path) -> BenchResult<()>;
    fn read_parquet(&self, path: &Path) -> BenchResult<Self::Table>;
    fn rolling_average(&self) -> BenchResult<Self::Table>;
    fn custom_apply(&self) -> BenchResult<Self::Table>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    PolarsEager,
    PolarsLazy,
    Arrow,
}

impl BackendKind {
    pub const ALL: [BackendKind; 3] = [
        BackendKind::PolarsEager,
        BackendKind::PolarsLazy,
        BackendKind::Arrow,
    ];

    /// Name used in configuration files and artifact paths.
    pub fn slug(&self) -> &'static str {
        match self {
            BackendKind::PolarsEager => "polars-eager",
            BackendKind::PolarsLazy => "polars-lazy",
            BackendKind::Arrow => "arrow",
        }
    }

    /// Label used in the report and on the chart.
    pub fn label(&self) -> &'static str {
        match self {
            BackendKind::PolarsEager => "PolarsEager",
            BackendKind::PolarsLazy => "PolarsLazy",
            BackendKind::Arrow => "Arrow",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        let normalized = name.trim().to_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|kind| kind.slug() == normalized || kind.label().to_lowercase() == normalized)
    }

    /// Resolve a backend name for dispatching `operation`. Unknown names are
    /// an error, never an empty result.
    pub fn resolve(name: &str, operation: Operation) -> BenchResult<Self> {
        Self::parse(name).ok_or_else(|| BenchError::UnsupportedBackend {
            backend: name.to_string(),
            operation: operation.name().to_string(),
        })
    }

    /// Location of this backend's round-trip fixture inside `data_dir`.
    pub fn parquet_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(format!("data_{}.parquet", self.slug().replace('-', "_")))
    }

    /// Materialize `dataset` in this backend's native form.
    pub fn materialize(&self, dataset: &Dataset) -> BenchResult<Backend> {
        let backend = match self {
            BackendKind::PolarsEager => Backend::PolarsEager(EagerTable::new(dataset.to_polars()?)),
            BackendKind::PolarsLazy => Backend::PolarsLazy(LazyTable::new(dataset.to_polars()?)),
            BackendKind::Arrow => Backend::Arrow(ArrowTable::new(dataset.to_record_batch()?)),
        };
        Ok(backend)
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A backend holding its native copy of the dataset.
pub enum Backend {
    PolarsEager(EagerTable),
    PolarsLazy(LazyTable),
    Arrow(ArrowTable),
}

impl Backend {
    pub fn kind(&self) -> BackendKind {
        match self {
            Backend::PolarsEager(_) => BackendKind::PolarsEager,
            Backend::PolarsLazy(_) => BackendKind::PolarsLazy,
            Backend::Arrow(_) => BackendKind::Arrow,
        }
    }

    /// Run `op` once. `parquet_path` is only used by the storage operations.
    pub fn execute(&self, op: Operation, parquet_path: &Path) -> BenchResult<Output> {
        match self {
            Backend::PolarsEager(t) => run_op(t, op, parquet_path, Output::Polars),
            Backend::PolarsLazy(t) => run_op(t, op, parquet_path, Output::Polars),
            Backend::Arrow(t) => run_op(t, op, parquet_path, Output::Arrow),
        }
    }
}

fn run_op<T, F>(table: &T, op: Operation, path: &Path, wrap: F) -> BenchResult<Output>
where
    T: TableOps,
    F: FnOnce(T::Table) -> Output,
{
    let out = match op {
        Operation::Filter => table.filter()?,
        Operation::Aggregate => table.aggregate()?,
        Operation::Sort => table.sort()?,
        Operation::Join => table.join()?,
        Operation::StringManipulation => table.string_manipulation()?,
        Operation::WriteParquet => {
            table.write_parquet(path)?;
            return Ok(Output::Written(path.to_path_buf()));
        }
        Operation::ReadParquet => table.read_parquet(path)?,
        Operation::RollingAverage => table.rolling_average()?,
        Operation::CustomApply => table.custom_apply()?,
    };
    Ok(wrap(out))
}

/// Result of a single operation in the backend's own representation.
#[derive(Debug, Clone)]
pub enum Output {
    Polars(DataFrame),
    Arrow(RecordBatch),
    Written(PathBuf),
}

impl Output {
    pub fn height(&self) -> usize {
        match self {
            Output::Polars(df) => df.height(),
            Output::Arrow(batch) => batch.num_rows(),
            Output::Written(_) => 0,
        }
    }

    pub fn column_names(&self) -> Vec<String> {
        match self {
            Output::Polars(df) => df
                .get_column_names()
                .into_iter()
                .map(|name| name.to_string())
                .collect(),
            Output::Arrow(batch) => batch
                .schema()
                .fields()
                .iter()
                .map(|field| field.name().clone())
                .collect(),
            Output::Written(_) => Vec::new(),
        }
    }

    pub fn f64_column(&self, name: &str) -> BenchResult<Vec<Option<f64>>> {
        match self {
            Output::Polars(df) => Ok(df.column(name)?.f64()?.into_iter().collect()),
            Output::Arrow(batch) => {
                let array = arrow_column(batch, name)?;
                let values = array.as_primitive_opt::<Float64Type>().ok_or_else(|| {
                    BenchError::Unknown(anyhow::anyhow!("column '{}' is not Float64", name))
                })?;
                Ok(values.iter().collect())
            }
            Output::Written(path) => Err(no_table(path)),
        }
    }

    pub fn i64_column(&self, name: &str) -> BenchResult<Vec<Option<i64>>> {
        match self {
            Output::Polars(df) => Ok(df.column(name)?.i64()?.into_iter().collect()),
            Output::Arrow(batch) => {
                let array = arrow_column(batch, name)?;
                let values = array.as_primitive_opt::<Int64Type>().ok_or_else(|| {
                    BenchError::Unknown(anyhow::anyhow!("column '{}' is not Int64", name))
                })?;
                Ok(values.iter().collect())
            }
            Output::Written(path) => Err(no_table(path)),
        }
    }

    pub fn str_column(&self, name: &str) -> BenchResult<Vec<Option<String>>> {
        match self {
            Output::Polars(df) => Ok(df
                .column(name)?
                .str()?
                .into_iter()
                .map(|v| v.map(str::to_string))
                .collect()),
            Output::Arrow(batch) => {
                let array = arrow_column(batch, name)?;
                let values = array.as_string_opt::<i32>().ok_or_else(|| {
                    BenchError::Unknown(anyhow::anyhow!("column '{}' is not Utf8", name))
                })?;
                Ok(values.iter().map(|v| v.map(str::to_string)).collect())
            }
            Output::Written(path) => Err(no_table(path)),
        }
    }
}

fn arrow_column<'a>(batch: &'a RecordBatch, name: &str) -> BenchResult<&'a dyn Array> {
    batch
        .column_by_name(name)
        .map(|array| array.as_ref())
        .ok_or_else(|| BenchError::Unknown(anyhow::anyhow!("column '{}' not found", name)))
}

fn no_table(path: &Path) -> BenchError {
    BenchError::Unknown(anyhow::anyhow!(
        "write operation produced a file ({:?}), not a table",
        path
    ))
}
