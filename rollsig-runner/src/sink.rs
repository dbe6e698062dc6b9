//! Output sinks for the metrics record.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use crate::metrics::MetricsRecord;

/// Destination for the single metrics record of a run.
pub trait MetricsSink {
    fn write_metrics(&mut self, record: &MetricsRecord) -> io::Result<()>;

    /// Human-readable location, used in log messages.
    fn describe(&self) -> String;
}

/// Writes the record as pretty JSON to a file.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl MetricsSink for JsonFileSink {
    fn write_metrics(&mut self, record: &MetricsRecord) -> io::Result<()> {
        let mut out = BufWriter::new(File::create(&self.path)?);
        serde_json::to_writer_pretty(&mut out, record)?;
        out.flush()
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Keeps records in memory. Useful in tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub records: Vec<MetricsRecord>,
}

impl MetricsSink for MemorySink {
    fn write_metrics(&mut self, record: &MetricsRecord) -> io::Result<()> {
        self.records.push(record.clone());
        Ok(())
    }

    fn describe(&self) -> String {
        "<memory>".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.json");
        let mut sink = JsonFileSink::new(&path);
        let record = MetricsRecord::error(Some("1.0"), "bad input", 3.5);
        sink.write_metrics(&record).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("{\n  \"version\""));
        let back: MetricsRecord = serde_json::from_str(&text).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn json_file_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = JsonFileSink::new(dir.path().join("nope/metrics.json"));
        let record = MetricsRecord::error(None, "x", 0.0);
        assert!(sink.write_metrics(&record).is_err());
    }
}
