//! Benchmark driver
//!
//! A run is one strictly sequential pass: validate the configuration,
//! generate the dataset, materialize it per backend, time every operation,
//! then persist the report, chart and run manifest. Any failure aborts the
//! run.

use crate::backend::{Backend, Output};
use crate::chart::{self, ChartOptions};
use crate::config::{BenchConfig, BenchPlan};
use crate::datagen::Dataset;
use crate::errors::{BenchError, BenchResult};
use crate::observability::{Metrics, RunManifest};
use crate::ops::Operation;
use crate::report::Report;
use crate::verify;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// Paths written by a completed run.
#[derive(Debug, Clone)]
pub struct RunArtifacts {
    pub chart: PathBuf,
    pub results: PathBuf,
    pub summary: PathBuf,
    pub parquet: Vec<PathBuf>,
}

pub fn progress_header() -> String {
    format!(
        "{:<12} | {:<22} | {:<20}\n{}",
        "Framework",
        "Operation",
        "Time",
        "-".repeat(60)
    )
}

pub fn progress_line(backend: &str, operation: &str, secs: f64) -> String {
    format!("{:<12} | {:<22} | {:.4} seconds", backend, operation, secs)
}

pub fn failure_line(backend: &str, operation: &str, secs: f64) -> String {
    format!("{:<12} | {:<22} | FAILED after {:.4} seconds", backend, operation, secs)
}

/// Execute `op` on `backend` exactly once, append the elapsed time to
/// `report` and print the progress line. Only the call itself is timed.
/// A failing call still prints its line, so the last line on stdout names
/// the operation that aborted the run.
pub fn time_operation(
    backend: &Backend,
    op: Operation,
    parquet_path: &Path,
    report: &mut Report,
    pb: &ProgressBar,
) -> BenchResult<Output> {
    let label = backend.kind().label();

    let start = Instant::now();
    let result = backend.execute(op, parquet_path);
    let elapsed = start.elapsed();

    let output = match result {
        Ok(output) => output,
        Err(e) => {
            let line = failure_line(label, op.name(), elapsed.as_secs_f64());
            pb.suspend(|| println!("{}", line));
            return Err(BenchError::OperationFailed {
                backend: label.to_string(),
                operation: op.name().to_string(),
                source: Box::new(e),
            });
        }
    };

    report.record(label, op.name(), elapsed);
    let line = progress_line(label, op.name(), elapsed.as_secs_f64());
    pb.suspend(|| println!("{}", line));
    debug!(
        backend = label,
        operation = op.name(),
        secs = elapsed.as_secs_f64(),
        rows = output.height(),
        "operation timed"
    );
    Ok(output)
}

pub struct Harness {
    config: BenchConfig,
    plan: Option<BenchPlan>,
    report: Report,
    metrics: Metrics,
}

impl Harness {
    pub fn new(config: BenchConfig) -> Self {
        Self {
            config,
            plan: None,
            report: Report::new(),
            metrics: Metrics::new(),
        }
    }

    pub fn report(&self) -> &Report {
        &self.report
    }

    /// Time every configured operation on every configured backend.
    pub fn benchmark(&mut self) -> BenchResult<&Report> {
        let plan = self.config.resolve()?;

        info!("Generating data ({} rows)...", self.config.n_rows);
        let start = Instant::now();
        let dataset = Dataset::generate(self.config.n_rows, self.config.n_cols, self.config.seed)?;
        self.metrics.record_phase("generate", start.elapsed());

        std::fs::create_dir_all(&self.config.data_dir)?;

        let pb = ProgressBar::new(plan.steps() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] {bar:30} {pos}/{len} {msg}")
                .map_err(|e| BenchError::Unknown(e.into()))?
                .progress_chars("#>-"),
        );
        pb.suspend(|| println!("\n--- Benchmarks ---\n{}", progress_header()));

        for kind in &plan.backends {
            let start = Instant::now();
            let backend = kind.materialize(&dataset)?;
            self.metrics
                .record_phase(&format!("materialize:{}", kind.slug()), start.elapsed());
            let parquet_path = kind.parquet_path(&self.config.data_dir);

            for op in &plan.operations {
                pb.set_message(format!("{} {}", kind.label(), op.name()));
                info!(backend = kind.label(), operation = op.name(), "running");

                let output =
                    time_operation(&backend, *op, &parquet_path, &mut self.report, &pb)?;

                if self.config.verify {
                    verify::check_output(*op, &dataset, &output)?
                        .map_err(|m| m.into_error(kind.label()))?;
                    debug!(backend = kind.label(), operation = op.name(), "verified");
                }
                pb.inc(1);
            }
        }
        pb.finish_with_message("Benchmarks complete.");

        self.plan = Some(plan);
        Ok(&self.report)
    }

    /// Persist the report as CSV, render the chart and write the manifest.
    /// Only valid after a completed [`Harness::benchmark`].
    pub fn publish(&mut self, run_id: &str) -> BenchResult<RunArtifacts> {
        let plan = self.plan.as_ref().ok_or_else(|| {
            BenchError::InvalidConfig("publish called before benchmark completed".to_string())
        })?;
        let parquet: Vec<PathBuf> = if plan.operations.contains(&Operation::WriteParquet) {
            plan.backends
                .iter()
                .map(|kind| kind.parquet_path(&self.config.data_dir))
                .collect()
        } else {
            Vec::new()
        };

        std::fs::create_dir_all(&self.config.figures_dir)?;

        let start = Instant::now();
        let results = self.config.results_path();
        self.report.write_csv(&results)?;
        info!("Results saved to {}", results.display());

        let chart_path = self.config.chart_path();
        let options = ChartOptions {
            scale: self.config.time_scale,
            ..Default::default()
        };
        chart::render_chart(&self.report, &chart_path, &options)?;
        println!("\nChart saved to {}", chart_path.display());
        self.metrics.record_phase("publish", start.elapsed());

        let summary = self.config.summary_path();
        let mut artifacts = vec![results.clone(), chart_path.clone()];
        artifacts.extend(parquet.iter().cloned());
        RunManifest::new(
            run_id.to_string(),
            &self.config,
            &self.report,
            &self.metrics,
            &artifacts,
        )?
        .write(&summary)?;

        Ok(RunArtifacts {
            chart: chart_path,
            results,
            summary,
            parquet,
        })
    }

    /// Full benchmark-then-plot sequence.
    pub fn run(config: BenchConfig, run_id: &str) -> BenchResult<(Report, RunArtifacts)> {
        let mut harness = Harness::new(config);
        harness.benchmark()?;
        let artifacts = harness.publish(run_id)?;
        info!(
            "Run completed: {} measurements in {:?}",
            harness.report.len(),
            harness.metrics.total_duration()
        );
        Ok((harness.report, artifacts))
    }
}
