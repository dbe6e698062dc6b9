//! Error taxonomy for the batch pipeline.
//!
//! Every component returns a typed error. `JobError` is what the runner
//! inspects to pick an exit path: classified config/data failures exit with
//! code 1, anything else is unexpected and exits with code 2.

use std::path::PathBuf;
use thiserror::Error;

/// Classification of a [`ConfigError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigErrorKind {
    FileNotFound,
    ParseError,
    MissingKey,
    TypeMismatch,
    WindowTooLarge,
}

/// Classification of a [`DataError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataErrorKind {
    FileNotFound,
    Empty,
    ParseError,
    MissingColumn,
    AllNonNumeric,
}

/// Errors from loading or validating the job configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Config file not found: {}", .path.display())]
    FileNotFound { path: PathBuf },

    #[error("Config file is empty: {}", .path.display())]
    EmptyFile { path: PathBuf },

    #[error("Invalid {format} in config file: {reason}")]
    Parse { format: &'static str, reason: String },

    #[error("Config file must contain a mapping (key: value pairs).")]
    NotAMapping,

    #[error("Missing required config keys: {}", format_list(.keys))]
    MissingKeys { keys: Vec<String> },

    #[error("'{key}' must be {expected}, got {found}")]
    TypeMismatch {
        key: &'static str,
        expected: &'static str,
        found: String,
    },

    #[error(
        "Not enough rows ({rows}) to compute a rolling mean with window={window}. \
         Need at least {window} rows."
    )]
    WindowTooLarge { rows: usize, window: usize },
}

impl ConfigError {
    pub fn kind(&self) -> ConfigErrorKind {
        match self {
            ConfigError::FileNotFound { .. } => ConfigErrorKind::FileNotFound,
            ConfigError::EmptyFile { .. }
            | ConfigError::Parse { .. }
            | ConfigError::NotAMapping => ConfigErrorKind::ParseError,
            ConfigError::MissingKeys { .. } => ConfigErrorKind::MissingKey,
            ConfigError::TypeMismatch { .. } => ConfigErrorKind::TypeMismatch,
            ConfigError::WindowTooLarge { .. } => ConfigErrorKind::WindowTooLarge,
        }
    }
}

/// Errors from loading and cleaning the input dataset.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    #[error("Input CSV not found: {}", .path.display())]
    FileNotFound { path: PathBuf },

    #[error("Input CSV file is empty: {}", .path.display())]
    EmptyFile { path: PathBuf },

    #[error("CSV file contains no data rows.")]
    NoRows,

    #[error("Failed to parse CSV file: {reason}")]
    Parse { reason: String },

    #[error("Required column 'close' not found. Columns present: {}", format_list(.columns))]
    MissingColumn { columns: Vec<String> },

    #[error("All values in 'close' column are non-numeric or NaN.")]
    AllNonNumeric { rows: usize },
}

impl DataError {
    pub fn kind(&self) -> DataErrorKind {
        match self {
            DataError::FileNotFound { .. } => DataErrorKind::FileNotFound,
            DataError::EmptyFile { .. } | DataError::NoRows => DataErrorKind::Empty,
            DataError::Parse { .. } => DataErrorKind::ParseError,
            DataError::MissingColumn { .. } => DataErrorKind::MissingColumn,
            DataError::AllNonNumeric { .. } => DataErrorKind::AllNonNumeric,
        }
    }
}

/// Any failure that can end a job.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum JobError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl JobError {
    /// Wrap an unclassified failure (I/O, panics, ...).
    pub fn unexpected(err: impl std::fmt::Display) -> Self {
        JobError::Unexpected(err.to_string())
    }

    /// True for failures the pipeline knows how to classify.
    pub fn is_handled(&self) -> bool {
        !matches!(self, JobError::Unexpected(_))
    }

    /// Process exit code for this failure.
    pub fn exit_code(&self) -> i32 {
        if self.is_handled() {
            1
        } else {
            2
        }
    }
}

/// Render names as a bracketed, single-quoted list: `['date', 'price']`.
pub fn format_list<S: AsRef<str>>(items: &[S]) -> String {
    let quoted: Vec<String> = items
        .iter()
        .map(|s| format!("'{}'", s.as_ref()))
        .collect();
    format!("[{}]", quoted.join(", "))
}
