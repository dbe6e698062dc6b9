//! Rolling-mean signal engine.
//!
//! For each row `i`, the rolling mean covers closes `[i - window + 1, i]`.
//! Warm-up rows (`i < window - 1`) have no mean and a signal of 0; every
//! other row signals 1 when its close is strictly above the mean.

use serde::{Deserialize, Serialize};

use crate::config::JobConfig;
use crate::dataset::Dataset;
use crate::error::ConfigError;
use crate::rng::RandomSource;
use crate::run_log::RunLog;

/// Signal entry for one retained row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalPoint {
    pub rolling_mean: Option<f64>,
    pub signal: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalSeries {
    points: Vec<SignalPoint>,
}

impl SignalSeries {
    pub fn points(&self) -> &[SignalPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn signals(&self) -> impl Iterator<Item = u8> + '_ {
        self.points.iter().map(|p| p.signal)
    }

    /// Rows without a rolling mean.
    pub fn warmup_rows(&self) -> usize {
        self.points
            .iter()
            .filter(|p| p.rolling_mean.is_none())
            .count()
    }

    /// Fraction of rows whose signal is 1, unrounded. `None` when empty.
    pub fn signal_rate(&self) -> Option<f64> {
        if self.points.is_empty() {
            return None;
        }
        let ones = self.signals().filter(|&s| s == 1).count();
        Some(ones as f64 / self.points.len() as f64)
    }
}

/// Trailing-window arithmetic mean. `None` for warm-up positions, and for
/// every position when `window` is 0.
///
/// Each window is summed on its own, so rounding or overflow in one window
/// never carries into the next. A window of identical values averages to
/// exactly that value.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }
    let mut out = Vec::with_capacity(values.len());
    // length of the run of equal values ending at i
    let mut same_run = 0usize;

    for (i, &x) in values.iter().enumerate() {
        same_run = if i > 0 && values[i - 1] == x {
            same_run + 1
        } else {
            1
        };
        if i + 1 < window {
            out.push(None);
            continue;
        }
        let mean = if same_run >= window {
            x
        } else {
            values[i + 1 - window..=i].iter().sum::<f64>() / window as f64
        };
        out.push(Some(mean));
    }
    out
}

/// Compute the signal series for a cleaned dataset.
///
/// `rng` must already be seeded for this job; the engine draws from nothing
/// else, so identical seed, data and window give identical output.
pub fn compute_signals(
    config: &JobConfig,
    dataset: &Dataset,
    rng: &mut RandomSource,
    log: &mut RunLog,
) -> Result<SignalSeries, ConfigError> {
    let window = config.window;
    if window > dataset.len() {
        return Err(ConfigError::WindowTooLarge {
            rows: dataset.len(),
            window,
        });
    }
    log.debug(format!(
        "Random source seed={} draws={}",
        rng.seed(),
        rng.draws()
    ));

    log.info(format!("Computing rolling mean with window={window}."));
    let closes = dataset.closes();
    let means = rolling_mean(closes, window);

    log.info("Computing binary signal (1 if close > rolling_mean, else 0).");
    let points: Vec<SignalPoint> = closes
        .iter()
        .zip(means)
        .map(|(&close, mean)| SignalPoint {
            rolling_mean: mean,
            signal: match mean {
                Some(m) if close > m => 1,
                _ => 0,
            },
        })
        .collect();
    let series = SignalSeries { points };

    let warmup = series.warmup_rows();
    if warmup > 0 {
        log.debug(format!(
            "{warmup} warmup row(s) have no rolling_mean; signal defaulted to 0."
        ));
    }
    log.info(format!(
        "Processing complete: rows={} | signal_rate={:.6}",
        series.len(),
        series.signal_rate().unwrap_or(0.0)
    ));
    Ok(series)
}
