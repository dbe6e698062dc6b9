//! Rollsig CLI — run the rolling-mean signal batch job once.
//!
//! Reads an OHLCV CSV and a YAML (or TOML) config, writes a metrics JSON and
//! a run log, and exits with:
//! - `0` on success
//! - `1` on a classified config or data failure
//! - `2` on an unexpected failure, or when metrics could not be written

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use rollsig_core::{CRITICAL_TARGET, TIMESTAMP_FORMAT};
use rollsig_runner::{JobPaths, JobRunner, JsonFileSink};

/// Exit code when the metrics record itself could not be written.
const EXIT_REPORT_FAILURE: i32 = 2;

#[derive(Parser, Debug)]
#[command(
    name = "rollsig",
    about = "Rolling-mean signal batch job: OHLCV CSV in, metrics JSON and run log out"
)]
struct Cli {
    /// Path to the OHLCV CSV file.
    #[arg(long, default_value = "data.csv")]
    input: PathBuf,

    /// Path to the YAML (or .toml) config file.
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Path to write the metrics JSON.
    #[arg(long, default_value = "metrics.json")]
    output: PathBuf,

    /// Path to write the run log.
    #[arg(long, default_value = "run.log")]
    log_file: PathBuf,
}

fn main() {
    let cli = Cli::parse();
    init_console_logger();
    std::process::exit(run(cli));
}

/// Run the job once and return the process exit code.
fn run(cli: Cli) -> i32 {
    // An unwritable log path must not cost the metrics record: the run log
    // goes to stderr instead.
    let mut log_sink = open_log_sink(&cli.log_file).unwrap_or_else(|e| {
        eprintln!("Warning: {e:#}; writing run log to stderr");
        Box::new(io::stderr())
    });
    let mut metrics_sink = JsonFileSink::new(&cli.output);

    let paths = JobPaths {
        input: cli.input,
        config: cli.config,
        output: cli.output,
        log_file: cli.log_file,
    };

    match JobRunner::new(paths).run(&mut metrics_sink, &mut log_sink) {
        Ok(outcome) => {
            if let Some(e) = outcome.log_error {
                eprintln!("Warning: failed to write run log: {e}");
            }
            outcome.exit_code
        }
        Err(e) => {
            eprintln!("Error: {e}");
            EXIT_REPORT_FAILURE
        }
    }
}

fn open_log_sink(path: &Path) -> Result<Box<dyn Write>> {
    let file = File::create(path)
        .with_context(|| format!("failed to create log file {}", path.display()))?;
    Ok(Box::new(BufWriter::new(file)))
}

/// Echo run log entries to stdout in the log-file line format. INFO by
/// default; `RUST_LOG` overrides.
fn init_console_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .target(env_logger::Target::Stdout)
        .format(|buf, record| {
            let level = if record.target() == CRITICAL_TARGET {
                "CRITICAL"
            } else {
                match record.level() {
                    log::Level::Error => "ERROR",
                    log::Level::Warn => "WARNING",
                    log::Level::Info => "INFO",
                    log::Level::Debug | log::Level::Trace => "DEBUG",
                }
            };
            writeln!(
                buf,
                "{} | {:<8} | {}",
                chrono::Local::now().format(TIMESTAMP_FORMAT),
                level,
                record.args()
            )
        })
        .init();
}
