//! Metrics record assembly.
//!
//! Exactly one [`MetricsRecord`] is produced per run. The success shape
//! carries the signal rate; the error shape has `rows_processed = 0`,
//! `signal_rate = null` and an `error_message`.

use serde::{Deserialize, Serialize};

use rollsig_core::{Dataset, SignalSeries};

/// Version reported when the job fails before config validation.
pub const UNKNOWN_VERSION: &str = "unknown";

const SIGNAL_RATE_DECIMALS: i32 = 4;
const LATENCY_DECIMALS: i32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

/// Field order here is the key order of the written JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub version: String,
    pub status: Status,
    pub rows_processed: usize,
    pub signal_rate: Option<f64>,
    pub latency_ms: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl MetricsRecord {
    /// Success record for a completed computation.
    pub fn success(
        version: &str,
        dataset: &Dataset,
        series: &SignalSeries,
        latency_ms: f64,
    ) -> Self {
        Self {
            version: version.to_string(),
            status: Status::Success,
            rows_processed: dataset.len(),
            signal_rate: series
                .signal_rate()
                .map(|r| round_to(r, SIGNAL_RATE_DECIMALS)),
            latency_ms: round_to(latency_ms, LATENCY_DECIMALS),
            error_message: None,
        }
    }

    /// Error record. `version` is `None` until config has been validated.
    pub fn error(version: Option<&str>, message: impl Into<String>, latency_ms: f64) -> Self {
        Self {
            version: version.unwrap_or(UNKNOWN_VERSION).to_string(),
            status: Status::Error,
            rows_processed: 0,
            signal_rate: None,
            latency_ms: round_to(latency_ms, LATENCY_DECIMALS),
            error_message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }

    /// Pretty JSON, two-space indent.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}
