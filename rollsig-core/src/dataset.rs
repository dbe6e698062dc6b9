//! Tabular input loading and cleaning.
//!
//! Reads a headered CSV, requires a `close` column and coerces it to `f64`.
//! Rows whose `close` does not coerce are dropped as a batch with one
//! warning; a dataset with no usable rows is an error. Other columns are
//! read but not used.

use csv::StringRecord;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{format_list, DataError, JobError};
use crate::run_log::RunLog;

/// Name of the column the signal is computed on.
pub const CLOSE_COLUMN: &str = "close";

/// Most dropped row positions listed in the DEBUG entry.
const MAX_LISTED_DROPS: usize = 10;

/// Result of coercing a raw `close` cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Coercion {
    Value(f64),
    Drop,
}

/// Parse a `close` cell. Empty, unparsable and non-finite cells are dropped.
pub fn coerce_close(raw: Option<&str>) -> Coercion {
    match raw.map(str::trim).and_then(|s| s.parse::<f64>().ok()) {
        Some(v) if v.is_finite() => Coercion::Value(v),
        _ => Coercion::Drop,
    }
}

/// Cleaned dataset: every row has a finite `close`.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    closes: Vec<f64>,
    dropped: usize,
}

impl Dataset {
    /// Build directly from close prices (single `close` column).
    pub fn from_closes(closes: &[f64]) -> Self {
        Self {
            columns: vec![CLOSE_COLUMN.to_string()],
            closes: closes.to_vec(),
            dropped: 0,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }

    /// Rows removed during cleaning.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn closes(&self) -> &[f64] {
        &self.closes
    }

    /// BLAKE3 hash over the retained close series.
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for close in &self.closes {
            hasher.update(&close.to_le_bytes());
        }
        hasher.finalize().to_hex().to_string()
    }
}

/// Load and clean the CSV at `path`.
pub fn load_dataset(path: &Path, log: &mut RunLog) -> Result<Dataset, JobError> {
    log.info(format!("Loading data from '{}'", path.display()));

    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(DataError::FileNotFound {
                path: path.to_path_buf(),
            }
            .into())
        }
        Err(e) => return Err(JobError::unexpected(e)),
    };
    let size = file.metadata().map_err(JobError::unexpected)?.len();
    if size == 0 {
        return Err(DataError::EmptyFile {
            path: path.to_path_buf(),
        }
        .into());
    }

    let dataset = read_dataset(file, log)?;
    log.info(format!(
        "Data loaded: {} rows, {} columns. Columns: {}",
        dataset.len(),
        dataset.columns().len(),
        format_list(dataset.columns())
    ));
    log.debug(format!("Dataset fingerprint: {}", dataset.fingerprint()));
    Ok(dataset)
}

/// Parse and clean CSV from any reader.
pub fn read_dataset<R: Read>(reader: R, log: &mut RunLog) -> Result<Dataset, DataError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let parse_err = |e: csv::Error| DataError::Parse {
        reason: e.to_string(),
    };

    let columns: Vec<String> = rdr
        .headers()
        .map_err(parse_err)?
        .iter()
        .map(str::to_string)
        .collect();

    let records = rdr
        .records()
        .collect::<Result<Vec<StringRecord>, _>>()
        .map_err(parse_err)?;

    if records.is_empty() {
        return Err(DataError::NoRows);
    }

    let close_idx = columns
        .iter()
        .position(|c| c == CLOSE_COLUMN)
        .ok_or_else(|| DataError::MissingColumn {
            columns: columns.clone(),
        })?;

    let total = records.len();
    let mut closes = Vec::with_capacity(total);
    let mut dropped_at = Vec::new();
    for (i, record) in records.iter().enumerate() {
        match coerce_close(record.get(close_idx)) {
            Coercion::Value(close) => closes.push(close),
            Coercion::Drop => dropped_at.push(i),
        }
    }

    if closes.is_empty() {
        return Err(DataError::AllNonNumeric { rows: total });
    }
    let dropped = dropped_at.len();
    if dropped > 0 {
        log.warning(format!(
            "{dropped} row(s) with non-numeric 'close' values will be dropped."
        ));
        let listed: Vec<String> = dropped_at
            .iter()
            .take(MAX_LISTED_DROPS)
            .map(usize::to_string)
            .collect();
        let more = if dropped > MAX_LISTED_DROPS { ", ..." } else { "" };
        log.debug(format!("Dropped data rows at positions [{}{more}]", listed.join(", ")));
    }

    Ok(Dataset {
        columns,
        closes,
        dropped,
    })
}
