use std::fmt::Write;

use crate::anomaly;
use crate::config::AnalysisConfig;
use crate::decomposition;
use crate::error::{AnalysisError, FetchError};
use crate::models::{LiveReading, SeasonalComparison, Series, Verdict};
use crate::stats;

/// Outcome of the live half of the report; each failure mode renders its
/// own message.
#[derive(Debug)]
pub enum LiveSection {
    Compared {
        reading: LiveReading,
        comparison: SeasonalComparison,
    },
    ComparisonFailed {
        reading: LiveReading,
        error: AnalysisError,
    },
    /// Live reading fetched but no historical series to compare it with.
    NoBaseline { reading: LiveReading },
    FetchFailed(FetchError),
}

pub fn build_report(
    city: &str,
    historical: &Result<Series, AnalysisError>,
    live: &LiveSection,
    config: &AnalysisConfig,
    limit: usize,
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Weather Data Analysis: {city}");
    let _ = writeln!(output);

    match historical {
        Ok(series) => write_historical(&mut output, series, config, limit),
        Err(AnalysisError::MissingFileInput) => {
            let _ = writeln!(output, "## Historical Data");
            let _ = writeln!(
                output,
                "No historical data supplied. Provide a CSV with city, date and temperature columns."
            );
        }
        Err(error) => {
            let _ = writeln!(output, "## Historical Data");
            let _ = writeln!(output, "Error: {error}");
        }
    }

    let _ = writeln!(output);
    write_live(&mut output, city, live, config);

    output
}

fn write_historical(output: &mut String, series: &Series, config: &AnalysisConfig, limit: usize) {
    let _ = writeln!(output, "## Descriptive Statistics");
    match stats::describe(series) {
        Ok(summary) => {
            let _ = writeln!(output, "| statistic | temperature |");
            let _ = writeln!(output, "|---|---|");
            let _ = writeln!(output, "| count | {} |", summary.count);
            let _ = writeln!(output, "| mean | {:.2} |", summary.mean);
            let _ = writeln!(output, "| std | {} |", format_optional(summary.std_dev));
            let _ = writeln!(output, "| min | {:.2} |", summary.min);
            let _ = writeln!(output, "| 25% | {:.2} |", summary.q25);
            let _ = writeln!(output, "| 50% | {:.2} |", summary.median);
            let _ = writeln!(output, "| 75% | {:.2} |", summary.q75);
            let _ = writeln!(output, "| max | {:.2} |", summary.max);
        }
        Err(error) => {
            let _ = writeln!(output, "Error: {error}");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Anomalies");
    match anomaly::flag_anomalies(series, config.anomaly_sigma) {
        Ok(report) if report.anomalies.is_empty() => {
            let _ = writeln!(
                output,
                "No observations deviate from the mean by more than {} standard deviations.",
                config.anomaly_sigma
            );
        }
        Ok(report) => {
            let _ = writeln!(
                output,
                "{} of {} observations deviate from the mean ({:.2}) by more than {} standard deviations ({}).",
                report.anomalies.len(),
                series.len(),
                report.mean,
                config.anomaly_sigma,
                format_optional(report.threshold)
            );
            for anomaly in report.anomalies.iter().take(limit) {
                let _ = writeln!(
                    output,
                    "- {}: {:.2} ({:+.2})",
                    anomaly.date, anomaly.temperature, anomaly.deviation
                );
            }
            if report.anomalies.len() > limit {
                let _ = writeln!(output, "- ... {} more", report.anomalies.len() - limit);
            }
        }
        Err(error) => {
            let _ = writeln!(output, "Error: {error}");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Seasonal Decomposition");
    match decomposition::decompose(series, config.period) {
        Ok(result) => {
            let summary = decomposition::summarize(&result);
            let _ = writeln!(output, "Additive model, period {} days.", summary.period);
            let _ = writeln!(
                output,
                "- Seasonal amplitude: {:.2}",
                summary.seasonal_amplitude
            );
            let _ = writeln!(
                output,
                "- Trend: {} to {}",
                format_optional(summary.trend_start),
                format_optional(summary.trend_end)
            );
            let _ = writeln!(
                output,
                "- Residual std: {}",
                format_optional(summary.residual_std_dev)
            );
        }
        Err(error) => {
            let _ = writeln!(output, "Error: {error}");
        }
    }
}

fn write_live(output: &mut String, city: &str, live: &LiveSection, config: &AnalysisConfig) {
    let _ = writeln!(output, "## Current Weather");
    match live {
        LiveSection::Compared {
            reading,
            comparison,
        } => {
            let _ = writeln!(
                output,
                "Current temperature in {city}: {:.2}°C (fetched {})",
                reading.temperature,
                reading.fetched_at.format("%Y-%m-%d %H:%M UTC")
            );
            let _ = writeln!(
                output,
                "Historical mean for month {}: {:.2}°C (std {:.2}, {} observations, threshold {} std).",
                comparison.month,
                comparison.mean,
                comparison.std_dev,
                comparison.samples,
                config.seasonal_sigma
            );
            let _ = writeln!(output, "{}", verdict_sentence(comparison.verdict));
        }
        LiveSection::ComparisonFailed { reading, error } => {
            let _ = writeln!(
                output,
                "Current temperature in {city}: {:.2}°C",
                reading.temperature
            );
            let _ = writeln!(output, "Error: {error}");
        }
        LiveSection::NoBaseline { reading } => {
            let _ = writeln!(
                output,
                "Current temperature in {city}: {:.2}°C",
                reading.temperature
            );
            let _ = writeln!(
                output,
                "No historical baseline available to judge this reading."
            );
        }
        LiveSection::FetchFailed(FetchError::MissingApiKey) => {
            let _ = writeln!(
                output,
                "Please enter a valid OpenWeatherMap API key to see the current weather data."
            );
        }
        LiveSection::FetchFailed(error) => {
            let _ = writeln!(output, "Error: {error}");
        }
    }
}

pub fn verdict_sentence(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Anomalous => "The current temperature is considered an anomaly for this season.",
        Verdict::Normal => "The current temperature is normal for this season.",
    }
}

fn format_optional(value: Option<f64>) -> String {
    value
        .map(|value| format!("{value:.2}"))
        .unwrap_or_else(|| "n/a".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Observation;
    use chrono::{Duration, NaiveDate, Utc};

    fn series(values: &[f64]) -> Series {
        let start = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        let observations = values
            .iter()
            .enumerate()
            .map(|(i, value)| Observation {
                city: "Berlin".to_string(),
                date: start + Duration::days(i as i64),
                temperature: *value,
            })
            .collect();
        Series::new("Berlin", observations)
    }

    fn reading() -> LiveReading {
        LiveReading {
            temperature: 4.25,
            fetched_at: Utc::now(),
        }
    }

    #[test]
    fn short_history_still_reports_statistics_and_anomalies() {
        let mut values = vec![2.0; 20];
        values.push(30.0);
        let live = LiveSection::FetchFailed(FetchError::MissingApiKey);
        let report = build_report(
            "Berlin",
            &Ok(series(&values)),
            &live,
            &AnalysisConfig::default(),
            10,
        );

        assert!(report.contains("# Weather Data Analysis: Berlin"));
        assert!(report.contains("| count | 21 |"));
        assert!(report.contains("- 2021-01-21: 30.00"));
        assert!(report.contains("Insufficient data: required 730 observations, got 21"));
        assert!(report.contains("Please enter a valid OpenWeatherMap API key"));
    }

    #[test]
    fn missing_file_does_not_hide_live_comparison() {
        let live = LiveSection::Compared {
            reading: reading(),
            comparison: SeasonalComparison {
                month: 1,
                current: 4.25,
                mean: 1.0,
                std_dev: 2.0,
                samples: 62,
                verdict: Verdict::Anomalous,
            },
        };
        let report = build_report(
            "Berlin",
            &Err(AnalysisError::MissingFileInput),
            &live,
            &AnalysisConfig::default(),
            10,
        );

        assert!(report.contains("No historical data supplied"));
        assert!(report.contains("Current temperature in Berlin: 4.25°C"));
        assert!(report.contains("considered an anomaly for this season"));
    }

    #[test]
    fn unopenable_history_names_the_file() {
        let historical = Err(AnalysisError::Io {
            path: std::path::PathBuf::from("data/berlin.csv"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "No such file or directory"),
        });
        let live = LiveSection::FetchFailed(FetchError::MissingApiKey);
        let report = build_report("Berlin", &historical, &live, &AnalysisConfig::default(), 10);
        assert!(report.contains(
            "Error: Failed to read historical data from data/berlin.csv: No such file or directory"
        ));
    }

    #[test]
    fn unreadable_history_leaves_reading_without_baseline() {
        let live = LiveSection::NoBaseline { reading: reading() };
        let report = build_report(
            "Berlin",
            &Err(AnalysisError::Schema {
                missing: vec!["date".to_string()],
            }),
            &live,
            &AnalysisConfig::default(),
            10,
        );
        assert!(report.contains("Error: Missing required column(s): date"));
        assert!(report.contains("No historical baseline available"));
    }

    #[test]
    fn live_failures_are_rendered_in_their_section() {
        let live = LiveSection::ComparisonFailed {
            reading: reading(),
            error: AnalysisError::InsufficientSeasonalData { month: 1, got: 1 },
        };
        let report = build_report(
            "Berlin",
            &Ok(series(&[1.0, 2.0, 3.0])),
            &live,
            &AnalysisConfig::default(),
            10,
        );
        assert!(report.contains("Insufficient seasonal data for month 1"));

        let live = LiveSection::FetchFailed(FetchError::Api {
            code: "404".to_string(),
            message: "city not found".to_string(),
        });
        let report = build_report(
            "Berlin",
            &Ok(series(&[1.0, 2.0, 3.0])),
            &live,
            &AnalysisConfig::default(),
            10,
        );
        assert!(report.contains("API error [404]: city not found"));
        assert!(report.contains("No observations deviate from the mean"));
    }

    #[test]
    fn anomaly_list_is_capped() {
        let mut values = vec![0.0; 200];
        values[10] = 50.0;
        values[20] = -50.0;
        values[30] = 50.0;
        let live = LiveSection::FetchFailed(FetchError::MissingApiKey);
        let report = build_report(
            "Berlin",
            &Ok(series(&values)),
            &live,
            &AnalysisConfig::default(),
            2,
        );
        assert!(report.contains("3 of 200 observations"));
        assert!(report.contains("- ... 1 more"));
    }
}
