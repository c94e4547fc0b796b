//! Comparative benchmark harness for Rust dataframe backends.
//!
//! Generates one synthetic dataset, times a fixed catalogue of tabular
//! operations on polars (eager and lazy) and arrow, and renders the timings
//! as a grouped bar chart next to a CSV of the raw measurements.

pub mod backend;
pub mod chart;
pub mod config;
pub mod datagen;
pub mod errors;
pub mod harness;
pub mod io;
pub mod observability;
pub mod ops;
pub mod report;
pub mod verify;

pub use backend::{Backend, BackendKind, Output, TableOps};
pub use config::{BenchConfig, TimeScale};
pub use errors::{BenchError, BenchResult};
pub use harness::{time_operation, Harness, RunArtifacts};
pub use ops::Operation;
pub use report::{Report, ResultRow};
