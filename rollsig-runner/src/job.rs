//! Job runner — drives the pipeline and maps failures to exit codes.
//!
//! States run in order:
//! `Init → ConfigLoading → DataLoading → Seeding → Computing → Reporting → Done`.
//! Any stage failure jumps straight to `Reporting` with an error record.
//! Classified config/data failures exit with 1; unexpected failures (including
//! panics caught at a stage boundary) are logged CRITICAL and exit with 2.
//! The only failure that escapes is a metrics sink error, after it has been
//! logged and the run log flushed.

use std::any::Any;
use std::fmt;
use std::io::{self, Write};
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::time::Instant;

use thiserror::Error;

use rollsig_core::{
    compute_signals, load_config, load_dataset, Dataset, JobConfig, JobError, RandomSource,
    RunLog, SignalSeries,
};

use crate::metrics::MetricsRecord;
use crate::sink::MetricsSink;

const BANNER: &str = "============================================================";

/// Exit code for a successful run.
pub const EXIT_SUCCESS: i32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Init,
    ConfigLoading,
    DataLoading,
    Seeding,
    Computing,
    Reporting,
    Done(i32),
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Init => write!(f, "Init"),
            JobState::ConfigLoading => write!(f, "ConfigLoading"),
            JobState::DataLoading => write!(f, "DataLoading"),
            JobState::Seeding => write!(f, "Seeding"),
            JobState::Computing => write!(f, "Computing"),
            JobState::Reporting => write!(f, "Reporting"),
            JobState::Done(code) => write!(f, "Done({code})"),
        }
    }
}

/// File locations for one job. `output` and `log_file` are only reported;
/// the sinks themselves are passed to [`JobRunner::run`].
#[derive(Debug, Clone)]
pub struct JobPaths {
    pub input: PathBuf,
    pub config: PathBuf,
    pub output: PathBuf,
    pub log_file: PathBuf,
}

/// Metrics could not be written. Unrecoverable.
#[derive(Debug, Error)]
#[error("failed to write metrics to {location}: {source}")]
pub struct ReportError {
    pub location: String,
    #[source]
    pub source: io::Error,
}

/// What a finished job hands back to the process boundary.
#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub exit_code: i32,
    pub record: MetricsRecord,
    /// Every state entered, in order, ending with `Done`.
    pub trail: Vec<JobState>,
    /// Set when the run log could not be written to its sink. The exit code
    /// and metrics are unaffected.
    pub log_error: Option<String>,
}

pub struct JobRunner {
    paths: JobPaths,
    state: JobState,
    trail: Vec<JobState>,
    log: RunLog,
    started: Instant,
}

impl JobRunner {
    pub fn new(paths: JobPaths) -> Self {
        Self {
            paths,
            state: JobState::Init,
            trail: vec![JobState::Init],
            log: RunLog::new(),
            started: Instant::now(),
        }
    }

    /// Run the job to completion.
    ///
    /// The run log is written to `log_sink` exactly once before returning,
    /// on every path.
    pub fn run(
        mut self,
        metrics: &mut dyn MetricsSink,
        log_sink: &mut dyn Write,
    ) -> Result<JobOutcome, ReportError> {
        self.started = Instant::now();
        self.log.info(BANNER);
        self.log.info("Rolling-mean signal batch job starting.");
        self.log.info(format!(
            "Arguments: input={} | config={} | output={} | log={}",
            self.paths.input.display(),
            self.paths.config.display(),
            self.paths.output.display(),
            self.paths.log_file.display()
        ));

        let mut version: Option<String> = None;
        let result = self.pipeline(&mut version);

        self.transition(JobState::Reporting);
        let latency_ms = self.started.elapsed().as_secs_f64() * 1000.0;
        let (record, exit_code) = match &result {
            Ok((dataset, series)) => {
                let version = version.as_deref().unwrap_or_default();
                (
                    MetricsRecord::success(version, dataset, series, latency_ms),
                    EXIT_SUCCESS,
                )
            }
            Err(err) => {
                if err.is_handled() {
                    self.log.error(format!("Job failed: {err}"));
                } else {
                    self.log.critical(err.to_string());
                }
                (
                    MetricsRecord::error(version.as_deref(), err.to_string(), latency_ms),
                    err.exit_code(),
                )
            }
        };

        if let Err(source) = metrics.write_metrics(&record) {
            let err = ReportError {
                location: metrics.describe(),
                source,
            };
            self.log.critical(err.to_string());
            self.log.info(BANNER);
            if let Err(e) = self.flush_log(log_sink) {
                log::error!("failed to write run log: {e}");
            }
            return Err(err);
        }

        if record.is_success() {
            self.log
                .info(format!("Metrics written to '{}'.", metrics.describe()));
            self.log.info(format!(
                "Job finished successfully in {:.3} ms.",
                record.latency_ms
            ));
        } else {
            self.log
                .info(format!("Error metrics written to '{}'.", metrics.describe()));
        }
        self.transition(JobState::Done(exit_code));
        self.log.info(BANNER);
        let log_error = self.flush_log(log_sink).err().map(|e| {
            log::error!("failed to write run log: {e}");
            e.to_string()
        });

        Ok(JobOutcome {
            exit_code,
            record,
            trail: self.trail,
            log_error,
        })
    }

    /// Stages up to, but not including, reporting.
    fn pipeline(&mut self, version: &mut Option<String>) -> Result<(Dataset, SignalSeries), JobError> {
        self.transition(JobState::ConfigLoading);
        let config_path = self.paths.config.clone();
        let config: JobConfig = self.stage(|log| load_config(&config_path, log))?;
        *version = Some(config.version.clone());

        self.transition(JobState::DataLoading);
        let input_path = self.paths.input.clone();
        let dataset = self.stage(|log| load_dataset(&input_path, log))?;

        self.transition(JobState::Seeding);
        let seed = config.seed;
        let mut rng = self.stage(|log| {
            log.info(format!("Setting random seed to {seed} for reproducibility."));
            Ok(RandomSource::seeded(seed))
        })?;

        self.transition(JobState::Computing);
        let series = self.stage(|log| {
            compute_signals(&config, &dataset, &mut rng, log).map_err(JobError::from)
        })?;

        Ok((dataset, series))
    }

    /// Run one stage, turning a panic into an unexpected failure.
    fn stage<T>(
        &mut self,
        f: impl FnOnce(&mut RunLog) -> Result<T, JobError>,
    ) -> Result<T, JobError> {
        let log = &mut self.log;
        match panic::catch_unwind(AssertUnwindSafe(|| f(log))) {
            Ok(result) => result,
            Err(payload) => Err(JobError::Unexpected(panic_message(payload.as_ref()))),
        }
    }

    fn transition(&mut self, next: JobState) {
        self.log
            .debug(format!("State transition: {} -> {}", self.state, next));
        self.state = next;
        self.trail.push(next);
    }

    fn flush_log(&self, log_sink: &mut dyn Write) -> io::Result<()> {
        self.log.write_to(log_sink)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}
