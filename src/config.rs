//! Benchmark configuration
//!
//! Every knob of a run lives in [`BenchConfig`], which is passed explicitly
//! into the harness. Configs are read from YAML; absent fields fall back to
//! the defaults below.

use crate::backend::BackendKind;
use crate::datagen::MIN_COLUMNS;
use crate::errors::{BenchError, BenchResult};
use crate::ops::Operation;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_ROWS: usize = 5_000_000;
pub const DEFAULT_COLS: usize = 5;
pub const CHART_FILE: &str = "benchmark_comparison.svg";
pub const RESULTS_FILE: &str = "benchmark_results.csv";
pub const SUMMARY_FILE: &str = "run_summary.json";

/// Scale of the chart's time axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TimeScale {
    #[default]
    Log,
    Linear,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    pub n_rows: usize,
    pub n_cols: usize,
    pub seed: Option<u64>,
    pub figures_dir: PathBuf,
    pub data_dir: PathBuf,
    pub backends: Vec<String>,
    pub operations: Vec<String>,
    pub time_scale: TimeScale,
    /// Check every output against a reference computation (outside timing).
    pub verify: bool,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            n_rows: DEFAULT_ROWS,
            n_cols: DEFAULT_COLS,
            seed: None,
            figures_dir: PathBuf::from("figures"),
            data_dir: PathBuf::from("data"),
            backends: BackendKind::ALL.iter().map(|b| b.slug().to_string()).collect(),
            operations: Operation::ALL.iter().map(|op| op.name().to_string()).collect(),
            time_scale: TimeScale::Log,
            verify: false,
        }
    }
}

/// Resolved, validated form of a [`BenchConfig`].
#[derive(Debug, Clone, PartialEq)]
pub struct BenchPlan {
    pub backends: Vec<BackendKind>,
    pub operations: Vec<Operation>,
}

impl BenchPlan {
    pub fn steps(&self) -> usize {
        self.backends.len() * self.operations.len()
    }
}

impl BenchConfig {
    pub fn from_path<P: AsRef<Path>>(path: P) -> BenchResult<Self> {
        let text = std::fs::read_to_string(path.as_ref()).map_err(BenchError::IoError)?;
        Self::from_yaml(&text)
    }

    pub fn from_yaml(text: &str) -> BenchResult<Self> {
        serde_yaml::from_str(text).map_err(|e| BenchError::ConfigError(e, None))
    }

    pub fn chart_path(&self) -> PathBuf {
        self.figures_dir.join(CHART_FILE)
    }

    pub fn results_path(&self) -> PathBuf {
        self.figures_dir.join(RESULTS_FILE)
    }

    pub fn summary_path(&self) -> PathBuf {
        self.figures_dir.join(SUMMARY_FILE)
    }

    /// Validate the configuration and resolve backend and operation names.
    /// Runs before any data is generated.
    pub fn resolve(&self) -> BenchResult<BenchPlan> {
        if self.n_rows == 0 {
            return Err(BenchError::InvalidConfig(
                "n_rows must be a positive integer".to_string(),
            ));
        }
        if self.n_cols < MIN_COLUMNS {
            return Err(BenchError::InvalidConfig(format!(
                "n_cols must be at least {}, got {}",
                MIN_COLUMNS, self.n_cols
            )));
        }
        if self.operations.is_empty() {
            return Err(BenchError::InvalidConfig(
                "no operations configured".to_string(),
            ));
        }
        if self.backends.is_empty() {
            return Err(BenchError::InvalidConfig("no backends configured".to_string()));
        }

        let operations = self
            .operations
            .iter()
            .map(|name| name.parse::<Operation>())
            .collect::<BenchResult<Vec<_>>>()?;

        let write = operations.iter().position(|op| *op == Operation::WriteParquet);
        let read = operations.iter().position(|op| *op == Operation::ReadParquet);
        if let Some(read) = read {
            if write.map_or(true, |write| write > read) {
                return Err(BenchError::InvalidConfig(
                    "read_parquet must be preceded by write_parquet".to_string(),
                ));
            }
        }

        let backends = self
            .backends
            .iter()
            .map(|name| BackendKind::resolve(name, operations[0]))
            .collect::<BenchResult<Vec<_>>>()?;

        Ok(BenchPlan {
            backends,
            operations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_full_catalogue() {
        let plan = BenchConfig::default().resolve().unwrap();
        assert_eq!(plan.backends, BackendKind::ALL.to_vec());
        assert_eq!(plan.operations, Operation::ALL.to_vec());
        assert_eq!(plan.steps(), 27);
    }

    #[test]
    fn test_deserialize_partial_yaml() {
        let yaml = r#"
n_rows: 100
backends: ["polars-eager", "arrow"]
operations: ["filter", "aggregate"]
time_scale: linear
"#;
        let config = BenchConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.n_rows, 100);
        assert_eq!(config.n_cols, DEFAULT_COLS);
        assert_eq!(config.time_scale, TimeScale::Linear);
        assert_eq!(config.figures_dir, PathBuf::from("figures"));

        let plan = config.resolve().unwrap();
        assert_eq!(plan.backends, vec![BackendKind::PolarsEager, BackendKind::Arrow]);
        assert_eq!(plan.operations, vec![Operation::Filter, Operation::Aggregate]);
    }

    #[test]
    fn test_negative_rows_rejected_by_parser() {
        let err = BenchConfig::from_yaml("n_rows: -5").unwrap_err();
        assert!(matches!(err, BenchError::ConfigError(_, _)));
    }

    #[test]
    fn test_zero_rows_rejected() {
        let config = BenchConfig {
            n_rows: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.resolve().unwrap_err(),
            BenchError::InvalidConfig(_)
        ));
    }

    #[test]
    fn test_too_few_columns_rejected() {
        let config = BenchConfig {
            n_cols: 3,
            ..Default::default()
        };
        assert!(matches!(
            config.resolve().unwrap_err(),
            BenchError::InvalidConfig(_)
        ));
    }

    #[test]
    fn test_unknown_backend_names_first_operation() {
        let config = BenchConfig {
            backends: vec!["polars-lazy".to_string(), "fireducks".to_string()],
            operations: vec!["sort".to_string(), "filter".to_string()],
            ..Default::default()
        };
        match config.resolve().unwrap_err() {
            BenchError::UnsupportedBackend { backend, operation } => {
                assert_eq!(backend, "fireducks");
                assert_eq!(operation, "sort_data");
            }
            other => panic!("Expected UnsupportedBackend, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_operation_rejected() {
        let config = BenchConfig {
            operations: vec!["melt".to_string()],
            ..Default::default()
        };
        assert!(matches!(
            config.resolve().unwrap_err(),
            BenchError::UnknownOperation(_)
        ));
    }

    #[test]
    fn test_read_without_write_rejected() {
        let config = BenchConfig {
            operations: vec!["read_parquet".to_string(), "write_parquet".to_string()],
            ..Default::default()
        };
        assert!(matches!(
            config.resolve().unwrap_err(),
            BenchError::InvalidConfig(_)
        ));
    }

    #[test]
    fn test_artifact_paths() {
        let config = BenchConfig {
            figures_dir: PathBuf::from("out"),
            ..Default::default()
        };
        assert_eq!(config.chart_path(), PathBuf::from("out/benchmark_comparison.svg"));
        assert_eq!(config.results_path(), PathBuf::from("out/benchmark_results.csv"));
    }
}
