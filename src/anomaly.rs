use crate::config::{self, AnalysisConfig};
use crate::decomposition;
use crate::error::{AnalysisError, Result};
use crate::models::{Anomaly, AnomalyReport, HistoricalAnalysis, Series};
use crate::stats;

/// Flags every observation whose distance from the series mean is strictly
/// greater than `sigma` standard deviations.
pub fn flag_anomalies(series: &Series, sigma: f64) -> Result<AnomalyReport> {
    config::check_sigma("anomaly_sigma", sigma)?;
    let values = series.temperatures();
    let mean = stats::mean(&values).ok_or_else(|| AnalysisError::EmptySeries {
        city: series.city.clone(),
    })?;
    let std_dev = stats::sample_std_dev(&values);
    let threshold = std_dev.map(|std| sigma * std);

    let anomalies = match threshold {
        Some(threshold) => series
            .observations
            .iter()
            .filter_map(|observation| {
                let deviation = observation.temperature - mean;
                (deviation.abs() > threshold).then(|| Anomaly {
                    date: observation.date,
                    temperature: observation.temperature,
                    deviation,
                })
            })
            .collect(),
        None => Vec::new(),
    };

    tracing::debug!(
        city = %series.city,
        observations = series.len(),
        anomalies = anomalies.len(),
        "flagged historical anomalies"
    );

    Ok(AnomalyReport {
        mean,
        std_dev,
        threshold,
        anomalies,
    })
}

/// Statistics, anomaly flags and decomposition in one pass; fails with the
/// first error any of them raises.
pub fn detect(series: &Series, config: &AnalysisConfig) -> Result<HistoricalAnalysis> {
    config.validate()?;
    let stats = stats::describe(series)?;
    let anomalies = flag_anomalies(series, config.anomaly_sigma)?;
    let decomposition = decomposition::decompose(series, config.period)?;

    Ok(HistoricalAnalysis {
        stats,
        anomalies,
        decomposition,
    })
}
