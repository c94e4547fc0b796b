use clap::{Parser, ValueEnum};
use framebench::{BenchConfig, Harness, TimeScale};
use miette::Result;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

#[derive(Clone, ValueEnum, Debug)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "framebench")]
#[command(version = "0.1.0")]
#[command(about = "Benchmark tabular operations across dataframe backends", long_about = None)]
struct Cli {
    /// Benchmark configuration file (YAML); defaults are used when omitted
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the number of generated rows
    #[arg(long)]
    rows: Option<usize>,

    /// Seed for the data generator
    #[arg(long)]
    seed: Option<u64>,

    /// Time axis scale of the chart
    #[arg(long, value_enum)]
    scale: Option<TimeScale>,

    /// Check every output against a reference computation
    #[arg(long)]
    verify: bool,

    /// Increase logging verbosity (Info -> Debug)
    #[arg(short, long)]
    verbose: bool,

    /// Silence all logs
    #[arg(short, long)]
    quiet: bool,

    /// Log format (text or json)
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.quiet {
        Level::ERROR
    } else if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    // FRAMEBENCH_LOG takes precedence over the CLI flags
    let filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .with_env_var("FRAMEBENCH_LOG")
        .from_env_lossy();

    let run_id = Uuid::new_v4();

    match cli.log_format {
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .json()
                .with_span_list(false)
                .with_current_span(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }

    let _span = tracing::info_span!("root", run_id = %run_id).entered();

    let mut config = match &cli.config {
        Some(path) => BenchConfig::from_path(path)?,
        None => BenchConfig::default(),
    };
    if let Some(rows) = cli.rows {
        config.n_rows = rows;
    }
    if let Some(seed) = cli.seed {
        config.seed = Some(seed);
    }
    if let Some(scale) = cli.scale {
        config.time_scale = scale;
    }
    config.verify |= cli.verify;

    Harness::run(config, &run_id.to_string())?;

    Ok(())
}
