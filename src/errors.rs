use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum BenchError {
    #[error("Configuration error: {0}")]
    #[diagnostic(
        code("FRAMEBENCH-001"),
        help("Please check your benchmark YAML syntax and structure.")
    )]
    ConfigError(#[source] serde_yaml::Error, #[label("here")] Option<SourceSpan>),

    #[error("Invalid configuration: {0}")]
    #[diagnostic(
        code("FRAMEBENCH-002"),
        help("Row count must be positive and at least 5 columns are required.")
    )]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    #[diagnostic(code("FRAMEBENCH-003"), help("Check file paths and permissions."))]
    IoError(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    #[diagnostic(
        code("FRAMEBENCH-004"),
        help("An error occurred within the polars engine.")
    )]
    PolarsError(#[from] polars::error::PolarsError),

    #[error("Arrow error: {0}")]
    #[diagnostic(
        code("FRAMEBENCH-005"),
        help("An error occurred within the arrow compute kernels.")
    )]
    ArrowError(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    #[diagnostic(
        code("FRAMEBENCH-006"),
        help("Failed to encode or decode a parquet fixture.")
    )]
    ParquetError(#[from] parquet::errors::ParquetError),

    #[error("Operation '{operation}' dispatched to unsupported backend '{backend}'")]
    #[diagnostic(
        code("FRAMEBENCH-007"),
        help("Supported backends are: polars-eager, polars-lazy, arrow.")
    )]
    UnsupportedBackend { backend: String, operation: String },

    #[error("Unknown operation: {0}")]
    #[diagnostic(
        code("FRAMEBENCH-008"),
        help("See `Operation::ALL` for the benchmark catalogue.")
    )]
    UnknownOperation(String),

    #[error("{backend} failed while running {operation}: {source}")]
    #[diagnostic(code("FRAMEBENCH-009"), help("The benchmark run was aborted."))]
    OperationFailed {
        backend: String,
        operation: String,
        #[source]
        source: Box<BenchError>,
    },

    #[error("{backend} produced a wrong result for {operation}: {message}")]
    #[diagnostic(
        code("FRAMEBENCH-010"),
        help("Backend outputs must agree with the reference computation.")
    )]
    VerificationFailed {
        backend: String,
        operation: String,
        message: String,
    },

    #[error("Chart rendering error: {0}")]
    #[diagnostic(code("FRAMEBENCH-011"))]
    ChartError(String),

    #[error("Manifest error: {0}")]
    #[diagnostic(code("FRAMEBENCH-012"))]
    ManifestError(#[from] serde_json::Error),

    #[error(transparent)]
    #[diagnostic(code("FRAMEBENCH-000"))]
    Unknown(#[from] anyhow::Error),
}

pub type BenchResult<T> = Result<T, BenchError>;
