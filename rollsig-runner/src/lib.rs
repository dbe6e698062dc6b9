//! Rollsig Runner — job orchestration and metrics reporting.
//!
//! This crate builds on `rollsig-core` to provide:
//! - `MetricsRecord` assembly (success and error shapes)
//! - The `MetricsSink` seam with JSON-file and in-memory sinks
//! - `JobRunner`: the stage state machine, error-to-exit-code mapping and
//!   latency measurement

pub mod job;
pub mod metrics;
pub mod sink;

pub use job::{JobOutcome, JobPaths, JobRunner, JobState, ReportError, EXIT_SUCCESS};
pub use metrics::{MetricsRecord, Status, UNKNOWN_VERSION};
pub use sink::{JsonFileSink, MemorySink, MetricsSink};
