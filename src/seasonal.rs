use crate::config;
use crate::data;
use crate::error::{AnalysisError, Result};
use crate::models::{SeasonalComparison, Series, Verdict};
use crate::stats;

/// Compares a current reading against the historical readings of the same
/// calendar month, across every year in the series.
pub fn compare(
    current: f64,
    month: u32,
    series: &Series,
    sigma: f64,
) -> Result<SeasonalComparison> {
    if !(1..=12).contains(&month) {
        return Err(AnalysisError::InvalidParameter {
            name: "month".to_string(),
            reason: format!("must be between 1 and 12, got {month}"),
        });
    }
    config::check_sigma("seasonal_sigma", sigma)?;

    let baseline: Vec<f64> = data::filter_month(&series.observations, month)
        .iter()
        .map(|observation| observation.temperature)
        .collect();
    let (mean, std_dev) = match (stats::mean(&baseline), stats::sample_std_dev(&baseline)) {
        (Some(mean), Some(std_dev)) => (mean, std_dev),
        _ => {
            return Err(AnalysisError::InsufficientSeasonalData {
                month,
                got: baseline.len(),
            })
        }
    };

    let verdict = if (current - mean).abs() > sigma * std_dev {
        Verdict::Anomalous
    } else {
        Verdict::Normal
    };

    tracing::info!(
        city = %series.city,
        month,
        samples = baseline.len(),
        mean,
        std_dev,
        current,
        ?verdict,
        "compared live reading with seasonal baseline"
    );

    Ok(SeasonalComparison {
        month,
        current,
        mean,
        std_dev,
        samples: baseline.len(),
        verdict,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Observation;
    use chrono::NaiveDate;

    fn observation(year: i32, month: u32, day: u32, temperature: f64) -> Observation {
        Observation {
            city: "Dubai".to_string(),
            date: NaiveDate::from_ymd_opt(year, month, day).unwrap(),
            temperature,
        }
    }

    fn dubai() -> Series {
        Series::new(
            "Dubai",
            vec![
                observation(2019, 7, 1, 34.0),
                observation(2019, 7, 2, 36.0),
                observation(2020, 7, 1, 38.0),
                observation(2020, 7, 15, 36.0),
                observation(2020, 1, 10, 19.0),
                observation(2021, 1, 10, 21.0),
                observation(2021, 3, 3, 27.0),
            ],
        )
    }

    #[test]
    fn baseline_spans_every_year_of_the_month() {
        let comparison = compare(36.5, 7, &dubai(), 1.0).unwrap();
        assert_eq!(comparison.samples, 4);
        assert!((comparison.mean - 36.0).abs() < 1e-9);
        assert!((comparison.std_dev - (8.0f64 / 3.0).sqrt()).abs() < 1e-9);
        assert_eq!(comparison.verdict, Verdict::Normal);
    }

    #[test]
    fn reading_beyond_one_sigma_is_anomalous() {
        let comparison = compare(40.0, 7, &dubai(), 1.0).unwrap();
        assert_eq!(comparison.verdict, Verdict::Anomalous);

        let comparison = compare(40.0, 7, &dubai(), 3.0).unwrap();
        assert_eq!(comparison.verdict, Verdict::Normal);
    }

    #[test]
    fn reading_exactly_one_sigma_away_is_normal() {
        let series = Series::new(
            "Dubai",
            vec![
                observation(2019, 2, 1, 18.0),
                observation(2020, 2, 1, 20.0),
                observation(2021, 2, 1, 22.0),
            ],
        );
        let comparison = compare(22.0, 2, &series, 1.0).unwrap();
        assert_eq!(comparison.std_dev, 2.0);
        assert_eq!(comparison.verdict, Verdict::Normal);
    }

    #[test]
    fn single_observation_month_is_insufficient() {
        assert!(matches!(
            compare(27.0, 3, &dubai(), 1.0),
            Err(AnalysisError::InsufficientSeasonalData { month: 3, got: 1 })
        ));
    }

    #[test]
    fn month_without_history_is_insufficient() {
        assert!(matches!(
            compare(30.0, 11, &dubai(), 1.0),
            Err(AnalysisError::InsufficientSeasonalData { month: 11, got: 0 })
        ));
    }

    #[test]
    fn constant_history_is_normal_at_the_constant() {
        let series = Series::new(
            "Dubai",
            (1..=10).map(|day| observation(2020, 5, day, 31.0)).collect(),
        );
        let comparison = compare(31.0, 5, &series, 1.0).unwrap();
        assert_eq!(comparison.std_dev, 0.0);
        assert_eq!(comparison.verdict, Verdict::Normal);
    }

    #[test]
    fn rejects_out_of_range_month() {
        assert!(matches!(
            compare(20.0, 13, &dubai(), 1.0),
            Err(AnalysisError::InvalidParameter { .. })
        ));
        assert!(matches!(
            compare(20.0, 0, &dubai(), 1.0),
            Err(AnalysisError::InvalidParameter { .. })
        ));
    }
}
