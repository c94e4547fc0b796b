use crate::errors::BenchResult;
use crate::io;
use polars::prelude::*;
use serde::Serialize;
use std::path::Path;
use std::time::Duration;

/// One timed measurement of one operation on one backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRow {
    pub backend: String,
    pub operation: String,
    #[serde(rename = "duration_secs", serialize_with = "serialize_secs")]
    pub duration: Duration,
}

fn serialize_secs<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

impl ResultRow {
    pub fn secs(&self) -> f64 {
        self.duration.as_secs_f64()
    }
}

/// Append-only report table, in execution order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    rows: Vec<ResultRow>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, backend: &str, operation: &str, duration: Duration) {
        self.rows.push(ResultRow {
            backend: backend.to_string(),
            operation: operation.to_string(),
            duration,
        });
    }

    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct backends in first-seen order.
    pub fn backends(&self) -> Vec<&str> {
        distinct(self.rows.iter().map(|r| r.backend.as_str()))
    }

    /// Distinct operations in first-seen order.
    pub fn operations(&self) -> Vec<&str> {
        distinct(self.rows.iter().map(|r| r.operation.as_str()))
    }

    pub fn to_dataframe(&self) -> BenchResult<DataFrame> {
        let backends: Vec<&str> = self.rows.iter().map(|r| r.backend.as_str()).collect();
        let operations: Vec<&str> = self.rows.iter().map(|r| r.operation.as_str()).collect();
        let secs: Vec<f64> = self.rows.iter().map(ResultRow::secs).collect();
        Ok(df! {
            "backend" => backends,
            "operation" => operations,
            "duration_secs" => secs,
        }?)
    }

    /// Persist the raw table as CSV (`backend,operation,duration_secs`).
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> BenchResult<()> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut df = self.to_dataframe()?;
        io::write_csv(&mut df, path)
    }
}

fn distinct<'a>(items: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen: Vec<&str> = Vec::new();
    for item in items {
        if !seen.contains(&item) {
            seen.push(item);
        }
    }
    seen
}
