use crate::config::BenchConfig;
use crate::errors::BenchResult;
use crate::report::{Report, ResultRow};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, BufWriter, Read};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Wall-clock bookkeeping for the phases of a run (generation, conversion,
/// persistence). Operation timings live in [`Report`].
#[derive(Debug)]
pub struct Metrics {
    start_time: Instant,
    pub phases: Vec<(String, Duration)>,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            phases: Vec::new(),
        }
    }

    pub fn record_phase(&mut self, name: &str, duration: Duration) {
        self.phases.push((name.to_string(), duration));
    }

    pub fn total_duration(&self) -> Duration {
        self.start_time.elapsed()
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Summary written next to the chart at the end of a run.
#[derive(Debug, Serialize)]
pub struct RunManifest {
    pub run_id: String,
    pub timestamp: DateTime<Utc>,
    pub config: BenchConfig,
    pub rows: Vec<ResultRow>,
    pub phase_durations_ms: Vec<(String, u64)>,
    pub total_duration_ms: u64,
    pub artifacts: Vec<ArtifactStats>,
}

#[derive(Debug, Serialize)]
pub struct ArtifactStats {
    pub path: String,
    pub hash: String, // SHA256 hex
    pub size_bytes: u64,
}

impl ArtifactStats {
    pub fn from_path<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref();
        Ok(Self {
            path: path.display().to_string(),
            hash: compute_file_hash(path)?,
            size_bytes: std::fs::metadata(path)?.len(),
        })
    }
}

impl RunManifest {
    pub fn new(
        run_id: String,
        config: &BenchConfig,
        report: &Report,
        metrics: &Metrics,
        artifacts: &[PathBuf],
    ) -> BenchResult<Self> {
        let artifacts = artifacts
            .iter()
            .filter(|p| p.exists())
            .map(ArtifactStats::from_path)
            .collect::<io::Result<Vec<_>>>()?;

        Ok(Self {
            run_id,
            timestamp: Utc::now(),
            config: config.clone(),
            rows: report.rows().to_vec(),
            phase_durations_ms: metrics
                .phases
                .iter()
                .map(|(name, d)| (name.clone(), d.as_millis() as u64))
                .collect(),
            total_duration_ms: metrics.total_duration().as_millis() as u64,
            artifacts,
        })
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> BenchResult<()> {
        let file = File::create(path.as_ref())?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(())
    }
}

pub fn compute_file_hash<P: AsRef<Path>>(path: P) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0; 8192]; // 8KB buffer

    loop {
        let count = file.read(&mut buffer)?;
        if count == 0 {
            break;
        }
        hasher.update(&buffer[..count]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_compute_file_hash() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("abc.txt");
        std::fs::write(&path, "abc").unwrap();
        assert_eq!(
            compute_file_hash(&path).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_manifest_round_trips_through_json() {
        let dir = tempdir().unwrap();
        let artifact = dir.path().join("data.bin");
        std::fs::write(&artifact, [1u8, 2, 3]).unwrap();

        let mut report = Report::new();
        report.record("Arrow", "filter_data", Duration::from_millis(2));
        let mut metrics = Metrics::new();
        metrics.record_phase("generate", Duration::from_millis(10));

        let manifest = RunManifest::new(
            "run-1".to_string(),
            &BenchConfig::default(),
            &report,
            &metrics,
            &[artifact, dir.path().join("missing.bin")],
        )
        .unwrap();
        assert_eq!(manifest.artifacts.len(), 1);
        assert_eq!(manifest.artifacts[0].size_bytes, 3);

        let out = dir.path().join("summary.json");
        manifest.write(&out).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(json["run_id"], "run-1");
        assert_eq!(json["rows"][0]["backend"], "Arrow");
        assert_eq!(json["rows"][0]["duration_secs"], 0.002);
        assert_eq!(json["config"]["time_scale"], "log");
    }
}
