//! Classical additive decomposition: series = seasonal + trend + residual.

use chrono::Duration;

use crate::config;
use crate::error::{AnalysisError, Result};
use crate::models::{DecompositionResult, DecompositionSummary, Series};
use crate::stats;

/// Decompose an evenly spaced daily series with the given period.
///
/// The series must hold consecutive days with no gaps or repeated dates and
/// at least two full periods of data.
pub fn decompose(series: &Series, period: usize) -> Result<DecompositionResult> {
    config::check_period(period)?;
    check_daily_spacing(series)?;

    let required = period
        .checked_mul(2)
        .ok_or_else(|| AnalysisError::InvalidParameter {
            name: "period".to_string(),
            reason: format!("two full periods of {period} days cannot be represented"),
        })?;
    let n = series.len();
    if n < required {
        return Err(AnalysisError::InsufficientData { required, got: n });
    }

    let values = series.temperatures();
    let trend = centred_moving_average(&values, period);

    let detrended: Vec<Option<f64>> = values
        .iter()
        .zip(trend.iter())
        .map(|(value, trend)| trend.map(|trend| value - trend))
        .collect();

    let mut phase_means: Vec<f64> = (0..period)
        .map(|phase| {
            let defined: Vec<f64> = detrended
                .iter()
                .skip(phase)
                .step_by(period)
                .flatten()
                .copied()
                .collect();
            stats::mean(&defined).unwrap_or(0.0)
        })
        .collect();
    let offset = stats::mean(&phase_means).unwrap_or(0.0);
    for phase_mean in phase_means.iter_mut() {
        *phase_mean -= offset;
    }

    let seasonal: Vec<f64> = (0..n).map(|i| phase_means[i % period]).collect();
    let residual = detrended
        .iter()
        .zip(seasonal.iter())
        .map(|(detrended, seasonal)| detrended.map(|value| value - seasonal))
        .collect();

    tracing::debug!(
        city = %series.city,
        observations = n,
        period,
        "decomposed series"
    );

    Ok(DecompositionResult {
        period,
        seasonal,
        trend,
        residual,
    })
}

fn check_daily_spacing(series: &Series) -> Result<()> {
    for pair in series.observations.windows(2) {
        let (previous, next) = (pair[0].date, pair[1].date);
        if next - previous != Duration::days(1) {
            return Err(AnalysisError::IrregularSpacing { previous, next });
        }
    }
    Ok(())
}

/// Centred moving average over one period. Even periods use a window of
/// `period + 1` with half weight on both ends.
fn centred_moving_average(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let n = values.len();
    let half = period / 2;
    let weights: Vec<f64> = if period % 2 == 0 {
        (0..=period)
            .map(|k| (if k == 0 || k == period { 0.5 } else { 1.0 }) / period as f64)
            .collect()
    } else {
        vec![1.0 / period as f64; period]
    };

    (0..n)
        .map(|i| {
            if i < half || i + half >= n {
                return None;
            }
            let window = &values[i - half..i - half + weights.len()];
            Some(window.iter().zip(weights.iter()).map(|(v, w)| v * w).sum())
        })
        .collect()
}

pub fn summarize(decomposition: &DecompositionResult) -> DecompositionSummary {
    let (low, high) = decomposition
        .seasonal
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(low, high), value| {
            (low.min(*value), high.max(*value))
        });
    let residuals: Vec<f64> = decomposition.residual.iter().flatten().copied().collect();

    DecompositionSummary {
        period: decomposition.period,
        seasonal_amplitude: if high >= low { high - low } else { 0.0 },
        trend_start: decomposition.trend.iter().flatten().next().copied(),
        trend_end: decomposition.trend.iter().rev().flatten().next().copied(),
        residual_std_dev: stats::sample_std_dev(&residuals),
    }
}
