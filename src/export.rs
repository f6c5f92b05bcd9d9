use std::collections::HashSet;

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{HistoricalAnalysis, Series};

/// One plot-ready line per observation; undefined components are left blank.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRow {
    pub date: NaiveDate,
    pub temperature: f64,
    pub anomaly: bool,
    pub seasonal: f64,
    pub trend: Option<f64>,
    pub residual: Option<f64>,
}

pub fn export_rows(series: &Series, analysis: &HistoricalAnalysis) -> Vec<ExportRow> {
    let flagged: HashSet<NaiveDate> = analysis
        .anomalies
        .anomalies
        .iter()
        .map(|anomaly| anomaly.date)
        .collect();
    let decomposition = &analysis.decomposition;

    series
        .observations
        .iter()
        .enumerate()
        .map(|(i, observation)| ExportRow {
            date: observation.date,
            temperature: observation.temperature,
            anomaly: flagged.contains(&observation.date),
            seasonal: decomposition.seasonal[i],
            trend: decomposition.trend[i],
            residual: decomposition.residual[i],
        })
        .collect()
}

pub fn write_export<W: std::io::Write>(output: W, rows: &[ExportRow]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_writer(output);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
