//! End-to-end tests for the job runner: real files in a temp directory,
//! JSON metrics sink, log captured in memory.

use std::io;
use std::path::Path;

use rollsig_runner::{
    JobOutcome, JobPaths, JobRunner, JobState, JsonFileSink, MetricsRecord, MetricsSink, Status,
};

fn write_config(dir: &Path, body: &str) {
    std::fs::write(dir.join("config.yaml"), body).unwrap();
}

fn write_ohlcv(dir: &Path, closes: &[String]) {
    let mut text = String::from("timestamp,open,high,low,close,volume\n");
    for (i, close) in closes.iter().enumerate() {
        text.push_str(&format!("{i},100,101,99,{close},1000\n"));
    }
    std::fs::write(dir.join("data.csv"), text).unwrap();
}

fn wave(n: usize) -> Vec<String> {
    (0..n)
        .map(|i| format!("{:.4}", 100.0 + (i as f64 * 0.3).sin() * 5.0 + i as f64 * 0.01))
        .collect()
}

fn paths(dir: &Path) -> JobPaths {
    JobPaths {
        input: dir.join("data.csv"),
        config: dir.join("config.yaml"),
        output: dir.join("metrics.json"),
        log_file: dir.join("run.log"),
    }
}

fn run_job(dir: &Path) -> (JobOutcome, String) {
    let mut sink = JsonFileSink::new(dir.join("metrics.json"));
    let mut log = Vec::new();
    let outcome = JobRunner::new(paths(dir)).run(&mut sink, &mut log).unwrap();
    (outcome, String::from_utf8(log).unwrap())
}

fn read_metrics(dir: &Path) -> MetricsRecord {
    let text = std::fs::read_to_string(dir.join("metrics.json")).unwrap();
    serde_json::from_str(&text).unwrap()
}

#[test]
fn successful_run_writes_metrics_and_log() {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), "seed: 42\nwindow: 5\nversion: \"1.0.0\"\n");
    write_ohlcv(dir.path(), &wave(200));

    let (outcome, log) = run_job(dir.path());
    assert_eq!(outcome.exit_code, 0);
    assert_eq!(
        outcome.trail,
        vec![
            JobState::Init,
            JobState::ConfigLoading,
            JobState::DataLoading,
            JobState::Seeding,
            JobState::Computing,
            JobState::Reporting,
            JobState::Done(0),
        ]
    );

    assert!(outcome.log_error.is_none());

    let metrics = read_metrics(dir.path());
    assert_eq!(metrics, outcome.record);
    assert_eq!(metrics.status, Status::Success);
    assert_eq!(metrics.version, "1.0.0");
    assert_eq!(metrics.rows_processed, 200);
    assert!(metrics.error_message.is_none());
    let rate = metrics.signal_rate.unwrap();
    assert!((0.0..=1.0).contains(&rate));
    assert!(metrics.latency_ms >= 0.0);

    assert!(log.contains("Config loaded: version=1.0.0 | seed=42 | window=5"));
    assert!(log.contains("Setting random seed to 42 for reproducibility."));
    assert!(log.contains("Job finished successfully in"));
    assert!(!log.contains("| ERROR"));
    for line in log.lines() {
        let parts: Vec<&str> = line.splitn(3, " | ").collect();
        assert_eq!(parts.len(), 3, "malformed line: {line}");
        assert_eq!(parts[1].len(), 8, "level not padded: {line}");
        assert!(["DEBUG", "INFO", "WARNING"].contains(&parts[1].trim_end()));
    }
}

#[test]
fn identical_inputs_give_identical_rate() {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), "seed: 7\nwindow: 20\nversion: v\n");
    write_ohlcv(dir.path(), &wave(1000));

    let (first, _) = run_job(dir.path());
    let (second, _) = run_job(dir.path());
    assert_eq!(first.record.signal_rate, second.record.signal_rate);
    assert_eq!(first.record.rows_processed, second.record.rows_processed);
}

#[test]
fn toml_config_is_accepted() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("job.toml"),
        "seed = 1\nwindow = 3\nversion = \"t\"\n",
    )
    .unwrap();
    write_ohlcv(dir.path(), &wave(10));

    let mut job_paths = paths(dir.path());
    job_paths.config = dir.path().join("job.toml");
    let mut sink = JsonFileSink::new(dir.path().join("metrics.json"));
    let outcome = JobRunner::new(job_paths)
        .run(&mut sink, &mut io::sink())
        .unwrap();
    assert_eq!(outcome.exit_code, 0);
    assert_eq!(outcome.record.version, "t");
}

#[test]
fn window_larger_than_rows_is_handled_error() {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), "seed: 42\nwindow: 50\nversion: \"1.0.0\"\n");
    write_ohlcv(dir.path(), &wave(10));

    let (outcome, log) = run_job(dir.path());
    assert_eq!(outcome.exit_code, 1);
    let metrics = read_metrics(dir.path());
    assert_eq!(metrics.status, Status::Error);
    // config was validated before the failure
    assert_eq!(metrics.version, "1.0.0");
    assert_eq!(metrics.rows_processed, 0);
    assert_eq!(metrics.signal_rate, None);
    let message = metrics.error_message.unwrap();
    assert_eq!(
        message,
        "Not enough rows (10) to compute a rolling mean with window=50. Need at least 50 rows."
    );
    assert!(log.contains(&format!("Job failed: {message}")));
    assert!(log.contains("Error metrics written to"));
}

#[test]
fn window_checked_against_cleaned_rows() {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), "seed: 1\nwindow: 4\nversion: x\n");
    let closes: Vec<String> = ["1", "2", "n/a", "3", ""].iter().map(|s| s.to_string()).collect();
    write_ohlcv(dir.path(), &closes);

    let (outcome, _) = run_job(dir.path());
    assert_eq!(outcome.exit_code, 1);
    assert!(outcome
        .record
        .error_message
        .unwrap()
        .starts_with("Not enough rows (3)"));
}

#[test]
fn missing_close_column() {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), "seed: 42\nwindow: 2\nversion: \"1.0.0\"\n");
    std::fs::write(
        dir.path().join("data.csv"),
        "date,price\n2024-01-01,10\n2024-01-02,11\n",
    )
    .unwrap();

    let (outcome, _) = run_job(dir.path());
    assert_eq!(outcome.exit_code, 1);
    assert_eq!(
        read_metrics(dir.path()).error_message.as_deref(),
        Some("Required column 'close' not found. Columns present: ['date', 'price']")
    );
}

#[test]
fn all_non_numeric_close() {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), "seed: 42\nwindow: 2\nversion: \"1.0.0\"\n");
    let closes: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
    write_ohlcv(dir.path(), &closes);

    let (outcome, _) = run_job(dir.path());
    assert_eq!(outcome.exit_code, 1);
    assert_eq!(outcome.record.status, Status::Error);
    assert_eq!(
        outcome.record.error_message.as_deref(),
        Some("All values in 'close' column are non-numeric or NaN.")
    );
}

#[test]
fn partially_non_numeric_degrades_gracefully() {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), "seed: 42\nwindow: 3\nversion: \"1.0.0\"\n");
    let mut closes = wave(50);
    closes[10] = "oops".into();
    closes[20] = String::new();
    write_ohlcv(dir.path(), &closes);

    let (outcome, log) = run_job(dir.path());
    assert_eq!(outcome.exit_code, 0);
    assert_eq!(outcome.record.rows_processed, 48);
    let warnings: Vec<&str> = log.lines().filter(|l| l.contains("| WARNING  |")).collect();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].ends_with("2 row(s) with non-numeric 'close' values will be dropped."));
}

#[test]
fn missing_config_key_reports_unknown_version() {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), "seed: 42\nversion: \"1.0.0\"\n");
    write_ohlcv(dir.path(), &wave(10));

    let (outcome, _) = run_job(dir.path());
    assert_eq!(outcome.exit_code, 1);
    assert_eq!(outcome.record.version, "unknown");
    assert_eq!(
        outcome.record.error_message.as_deref(),
        Some("Missing required config keys: ['window']")
    );
}

#[test]
fn empty_input_file() {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), "seed: 42\nwindow: 2\nversion: \"1.0.0\"\n");
    std::fs::write(dir.path().join("data.csv"), "").unwrap();

    let (outcome, _) = run_job(dir.path());
    assert_eq!(outcome.exit_code, 1);
    assert!(outcome
        .record
        .error_message
        .unwrap()
        .starts_with("Input CSV file is empty:"));
}

#[test]
fn unreadable_config_is_unexpected() {
    let dir = tempfile::tempdir().unwrap();
    // a directory where the config file should be
    std::fs::create_dir(dir.path().join("config.yaml")).unwrap();
    write_ohlcv(dir.path(), &wave(10));

    let (outcome, log) = run_job(dir.path());
    assert_eq!(outcome.exit_code, 2);
    assert_eq!(outcome.record.status, Status::Error);
    assert!(outcome
        .record
        .error_message
        .unwrap()
        .starts_with("Unexpected error:"));
    assert!(log.contains("| CRITICAL | Unexpected error:"));
}

struct FailingSink;

impl MetricsSink for FailingSink {
    fn write_metrics(&mut self, _record: &MetricsRecord) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"))
    }

    fn describe(&self) -> String {
        "failing".into()
    }
}

#[test]
fn metrics_write_failure_is_unrecoverable_but_log_is_flushed() {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), "seed: 42\nwindow: 2\nversion: \"1.0.0\"\n");
    write_ohlcv(dir.path(), &wave(10));

    let mut log = Vec::new();
    let err = JobRunner::new(paths(dir.path()))
        .run(&mut FailingSink, &mut log)
        .unwrap_err();
    assert_eq!(err.location, "failing");

    let log = String::from_utf8(log).unwrap();
    assert!(log.contains("| CRITICAL | failed to write metrics to failing: read-only"));
}

/// Log destination that rejects every write.
struct BrokenLog;

impl io::Write for BrokenLog {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::Other, "disk full"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn log_write_failure_is_surfaced_in_outcome() {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), "seed: 42\nwindow: 2\nversion: \"1.0.0\"\n");
    write_ohlcv(dir.path(), &wave(10));

    let mut sink = JsonFileSink::new(dir.path().join("metrics.json"));
    let outcome = JobRunner::new(paths(dir.path()))
        .run(&mut sink, &mut BrokenLog)
        .unwrap();

    assert_eq!(outcome.exit_code, 0);
    assert_eq!(outcome.log_error.as_deref(), Some("disk full"));
    assert_eq!(read_metrics(dir.path()).status, Status::Success);
}
