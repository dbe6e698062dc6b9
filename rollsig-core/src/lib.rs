//! Rollsig Core — the validation-and-transform pipeline of the batch job.
//!
//! - Config loading (YAML / TOML) and validation into [`JobConfig`]
//! - CSV dataset loading with `close` coercion and row dropping
//! - Seeded [`RandomSource`]
//! - Rolling-mean signal engine
//! - Typed error taxonomy and the append-only [`RunLog`]

pub mod config;
pub mod dataset;
pub mod error;
pub mod rng;
pub mod run_log;
pub mod signal;

pub use config::{load_config, validate, ConfigFormat, JobConfig};
pub use dataset::{load_dataset, read_dataset, Dataset};
pub use error::{ConfigError, ConfigErrorKind, DataError, DataErrorKind, JobError};
pub use rng::RandomSource;
pub use run_log::{Level, LogEntry, RunLog, CRITICAL_TARGET, TIMESTAMP_FORMAT};
pub use signal::{compute_signals, rolling_mean, SignalPoint, SignalSeries};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn pipeline_types_are_send_sync() {
        assert_send::<JobConfig>();
        assert_sync::<JobConfig>();
        assert_send::<Dataset>();
        assert_sync::<Dataset>();
        assert_send::<SignalSeries>();
        assert_sync::<SignalSeries>();
        assert_send::<RunLog>();
        assert_sync::<RunLog>();
    }

    #[test]
    fn errors_are_send_sync() {
        assert_send::<JobError>();
        assert_sync::<JobError>();
    }
}
