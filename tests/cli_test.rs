use std::fs;
use std::process::Command;
use tempfile::tempdir;

fn write_config(dir: &std::path::Path, n_rows: i64, backends: &str) -> std::path::PathBuf {
    let config_path = dir.join("bench.yaml");
    // Absolute paths keep the run independent of the working directory.
    let yaml = format!(
        r#"
n_rows: {n_rows}
seed: 11
figures_dir: "{figures}"
data_dir: "{data}"
backends: {backends}
operations: ["filter", "aggregate", "write_parquet", "read_parquet"]
"#,
        n_rows = n_rows,
        figures = dir.join("figures").to_str().unwrap(),
        data = dir.join("data").to_str().unwrap(),
        backends = backends,
    );
    fs::write(&config_path, yaml).unwrap();
    config_path
}

#[test]
fn test_cli_run_writes_artifacts() {
    let dir = tempdir().unwrap();
    let config_path = write_config(dir.path(), 200, r#"["polars-eager", "polars-lazy", "arrow"]"#);

    let output = Command::new(env!("CARGO_BIN_EXE_framebench"))
        .args(["--config", config_path.to_str().unwrap(), "--verify", "-q"])
        .output()
        .expect("Failed to run framebench");

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("PolarsEager  | filter_data"));
    assert!(stdout.contains("Arrow        | read_parquet"));
    assert!(stdout.contains("seconds"));

    let figures = dir.path().join("figures");
    assert!(figures.join("benchmark_comparison.svg").exists());
    assert!(figures.join("run_summary.json").exists());

    let csv = fs::read_to_string(figures.join("benchmark_results.csv")).unwrap();
    // header plus 3 backends x 4 operations
    assert_eq!(csv.lines().count(), 13);

    for name in [
        "data_polars_eager.parquet",
        "data_polars_lazy.parquet",
        "data_arrow.parquet",
    ] {
        assert!(dir.path().join("data").join(name).exists(), "missing {}", name);
    }
}

#[test]
fn test_cli_rows_override() {
    let dir = tempdir().unwrap();
    let config_path = write_config(dir.path(), 0, r#"["arrow"]"#);

    let output = Command::new(env!("CARGO_BIN_EXE_framebench"))
        .args([
            "--config",
            config_path.to_str().unwrap(),
            "--rows",
            "64",
            "--scale",
            "linear",
            "-q",
        ])
        .output()
        .expect("Failed to run framebench");

    assert!(output.status.success());
    assert!(dir
        .path()
        .join("figures")
        .join("benchmark_comparison.svg")
        .exists());
}

#[test]
fn test_cli_rejects_unknown_backend() {
    let dir = tempdir().unwrap();
    let config_path = write_config(dir.path(), 100, r#"["polars-eager", "fireducks"]"#);

    let output = Command::new(env!("CARGO_BIN_EXE_framebench"))
        .args(["--config", config_path.to_str().unwrap()])
        .output()
        .expect("Failed to run framebench");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("fireducks"), "stderr: {}", stderr);
    assert!(!dir.path().join("figures").exists());
}

#[test]
fn test_cli_rejects_zero_rows() {
    let dir = tempdir().unwrap();
    let config_path = write_config(dir.path(), 0, r#"["polars-lazy"]"#);

    let output = Command::new(env!("CARGO_BIN_EXE_framebench"))
        .args(["--config", config_path.to_str().unwrap()])
        .output()
        .expect("Failed to run framebench");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("n_rows"), "stderr: {}", stderr);
}

#[test]
fn test_cli_failed_operation_is_the_last_progress_line() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("bench.yaml");
    let data = dir.path().join("data");
    // A directory where the parquet fixture should go makes the write fail.
    fs::create_dir_all(data.join("data_arrow.parquet")).unwrap();
    let yaml = format!(
        r#"
n_rows: 50
figures_dir: "{figures}"
data_dir: "{data}"
backends: ["arrow"]
operations: ["filter", "write_parquet"]
"#,
        figures = dir.path().join("figures").to_str().unwrap(),
        data = data.to_str().unwrap(),
    );
    fs::write(&config_path, yaml).unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_framebench"))
        .args(["--config", config_path.to_str().unwrap(), "-q"])
        .output()
        .expect("Failed to run framebench");

    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let last = stdout.lines().last().unwrap_or_default();
    assert!(
        last.starts_with("Arrow        | write_parquet          | FAILED"),
        "stdout: {}",
        stdout
    );
    assert!(stdout.contains("Arrow        | filter_data"));
    assert!(!dir.path().join("figures").exists());
}

#[test]
fn test_cli_rejects_malformed_config() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("bench.yaml");
    fs::write(&config_path, "n_rows: [not, a, number]").unwrap();

    let status = Command::new(env!("CARGO_BIN_EXE_framebench"))
        .args(["--config", config_path.to_str().unwrap()])
        .status()
        .expect("Failed to run framebench");

    assert!(!status.success());
}
