use std::time::Duration;

use crate::error::{AnalysisError, Result};

pub const DEFAULT_ANOMALY_SIGMA: f64 = 2.0;
pub const DEFAULT_SEASONAL_SIGMA: f64 = 1.0;
pub const DEFAULT_PERIOD: usize = 365;
pub const DEFAULT_WEATHER_URL: &str = "http://api.openweathermap.org/data/2.5";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Thresholds and decomposition period shared by both features.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisConfig {
    /// Multiple of the series standard deviation beyond which an
    /// observation is flagged.
    pub anomaly_sigma: f64,
    /// Multiple of the month-of-year standard deviation beyond which the
    /// live reading is anomalous.
    pub seasonal_sigma: f64,
    pub period: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            anomaly_sigma: DEFAULT_ANOMALY_SIGMA,
            seasonal_sigma: DEFAULT_SEASONAL_SIGMA,
            period: DEFAULT_PERIOD,
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<()> {
        check_sigma("anomaly_sigma", self.anomaly_sigma)?;
        check_sigma("seasonal_sigma", self.seasonal_sigma)?;
        check_period(self.period)
    }
}

pub fn check_sigma(name: &str, sigma: f64) -> Result<()> {
    if sigma.is_finite() && sigma > 0.0 {
        Ok(())
    } else {
        Err(AnalysisError::InvalidParameter {
            name: name.to_string(),
            reason: format!("must be a positive number, got {sigma}"),
        })
    }
}

pub fn check_period(period: usize) -> Result<()> {
    if period >= 2 {
        Ok(())
    } else {
        Err(AnalysisError::InvalidParameter {
            name: "period".to_string(),
            reason: format!("must be at least 2, got {period}"),
        })
    }
}

#[derive(Debug, Clone)]
pub struct WeatherSettings {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for WeatherSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_WEATHER_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}
