use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub city: String,
    pub date: NaiveDate,
    pub temperature: f64,
}

/// Observations of a single city, ordered by date.
#[derive(Debug, Clone, Default)]
pub struct Series {
    pub city: String,
    pub observations: Vec<Observation>,
}

impl Series {
    pub fn new(city: impl Into<String>, mut observations: Vec<Observation>) -> Self {
        observations.sort_by_key(|observation| observation.date);
        Self {
            city: city.into(),
            observations,
        }
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn temperatures(&self) -> Vec<f64> {
        self.observations
            .iter()
            .map(|observation| observation.temperature)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescriptiveStats {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; undefined for a single observation.
    pub std_dev: Option<f64>,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Anomaly {
    pub date: NaiveDate,
    pub temperature: f64,
    pub deviation: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalyReport {
    pub mean: f64,
    pub std_dev: Option<f64>,
    /// Absolute deviation an observation must exceed to be flagged.
    pub threshold: Option<f64>,
    pub anomalies: Vec<Anomaly>,
}

/// Components aligned with the input series. Trend and residual are `None`
/// at the edges where the centred moving average is not defined.
#[derive(Debug, Clone, PartialEq)]
pub struct DecompositionResult {
    pub period: usize,
    pub seasonal: Vec<f64>,
    pub trend: Vec<Option<f64>>,
    pub residual: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecompositionSummary {
    pub period: usize,
    pub seasonal_amplitude: f64,
    pub trend_start: Option<f64>,
    pub trend_end: Option<f64>,
    pub residual_std_dev: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoricalAnalysis {
    pub stats: DescriptiveStats,
    pub anomalies: AnomalyReport,
    pub decomposition: DecompositionResult,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LiveReading {
    pub temperature: f64,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Anomalous,
    Normal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonalComparison {
    pub month: u32,
    pub current: f64,
    pub mean: f64,
    pub std_dev: f64,
    pub samples: usize,
    pub verdict: Verdict,
}
