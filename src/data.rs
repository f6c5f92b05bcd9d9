use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::Deserialize;

use crate::error::{AnalysisError, Result};
use crate::models::{Observation, Series};

pub const REQUIRED_COLUMNS: [&str; 3] = ["city", "date", "temperature"];

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

#[derive(Deserialize)]
struct CsvRow {
    city: String,
    date: String,
    temperature: f64,
}

pub fn load_observations(csv_path: &Path) -> Result<Vec<Observation>> {
    let file = std::fs::File::open(csv_path).map_err(|source| AnalysisError::Io {
        path: csv_path.to_path_buf(),
        source,
    })?;
    let observations = read_observations(file)?;
    tracing::info!(
        path = %csv_path.display(),
        rows = observations.len(),
        "loaded historical observations"
    );
    Ok(observations)
}

pub fn read_observations<R: Read>(input: R) -> Result<Vec<Observation>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(input);
    let headers = reader.headers().map_err(csv_error)?.clone();

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|column| !headers.iter().any(|header| header == **column))
        .map(|column| column.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(AnalysisError::Schema { missing });
    }

    let mut observations = Vec::new();

    for result in reader.records() {
        let record = result.map_err(csv_error)?;
        let line = record.position().map(|pos| pos.line()).unwrap_or(0);
        let row: CsvRow = record
            .deserialize(Some(&headers))
            .map_err(|err| AnalysisError::Parse {
                line,
                reason: err.to_string(),
            })?;

        let date = parse_date(&row.date).ok_or_else(|| AnalysisError::Parse {
            line,
            reason: format!("unrecognised date '{}'", row.date),
        })?;
        if !row.temperature.is_finite() {
            return Err(AnalysisError::Parse {
                line,
                reason: format!("temperature must be finite, got {}", row.temperature),
            });
        }

        observations.push(Observation {
            city: row.city,
            date,
            temperature: row.temperature,
        });
    }

    Ok(observations)
}

fn csv_error(err: csv::Error) -> AnalysisError {
    let line = err.position().map(|pos| pos.line()).unwrap_or(1);
    AnalysisError::Parse {
        line,
        reason: err.to_string(),
    }
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
                .map(|datetime| datetime.date())
        })
}

fn normalize_city(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Observations whose city matches `city`, ignoring case and surrounding
/// whitespace.
pub fn filter_city(observations: &[Observation], city: &str) -> Series {
    let wanted = normalize_city(city);
    let matching = observations
        .iter()
        .filter(|observation| normalize_city(&observation.city) == wanted)
        .cloned()
        .collect();
    Series::new(city.trim(), matching)
}

/// Observations from calendar month `month` across every year present.
pub fn filter_month(observations: &[Observation], month: u32) -> Vec<Observation> {
    observations
        .iter()
        .filter(|observation| observation.date.month() == month)
        .cloned()
        .collect()
}

pub fn cities(observations: &[Observation]) -> BTreeSet<String> {
    observations
        .iter()
        .map(|observation| observation.city.trim().to_string())
        .collect()
}
