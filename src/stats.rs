use crate::error::{AnalysisError, Result};
use crate::models::{DescriptiveStats, Series};

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator).
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean(values)?;
    let sum_sq: f64 = values.iter().map(|value| (value - mean).powi(2)).sum();
    Some((sum_sq / (values.len() - 1) as f64).sqrt())
}

/// Quantile of already sorted values, interpolating linearly between the
/// two closest ranks.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

pub fn describe(series: &Series) -> Result<DescriptiveStats> {
    let mut values = series.temperatures();
    let mean = mean(&values).ok_or_else(|| AnalysisError::EmptySeries {
        city: series.city.clone(),
    })?;
    let std_dev = sample_std_dev(&values);
    values.sort_by(f64::total_cmp);

    Ok(DescriptiveStats {
        count: values.len(),
        mean,
        std_dev,
        min: values[0],
        q25: quantile(&values, 0.25),
        median: quantile(&values, 0.5),
        q75: quantile(&values, 0.75),
        max: values[values.len() - 1],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Observation;
    use chrono::{Duration, NaiveDate};

    fn series(values: &[f64]) -> Series {
        let start = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
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

    #[test]
    fn describes_like_a_standard_summary() {
        let stats = describe(&series(&[4.0, 1.0, 3.0, 2.0])).unwrap();
        assert_eq!(stats.count, 4);
        assert!((stats.mean - 2.5).abs() < 1e-9);
        assert!((stats.std_dev.unwrap() - 1.290_994_448_7).abs() < 1e-9);
        assert_eq!(stats.min, 1.0);
        assert!((stats.q25 - 1.75).abs() < 1e-9);
        assert!((stats.median - 2.5).abs() < 1e-9);
        assert!((stats.q75 - 3.25).abs() < 1e-9);
        assert_eq!(stats.max, 4.0);
    }

    #[test]
    fn single_observation_has_no_std_dev() {
        let stats = describe(&series(&[7.5])).unwrap();
        assert_eq!(stats.count, 1);
        assert_eq!(stats.std_dev, None);
        assert_eq!(stats.median, 7.5);
    }

    #[test]
    fn empty_series_is_an_error() {
        assert!(matches!(
            describe(&series(&[])),
            Err(AnalysisError::EmptySeries { city }) if city == "Berlin"
        ));
    }

    #[test]
    fn sample_std_dev_uses_n_minus_one() {
        let std = sample_std_dev(&[10.0, 10.0, 10.0, 10.0, 50.0]).unwrap();
        assert!((std - 320f64.sqrt()).abs() < 1e-9);
        assert_eq!(sample_std_dev(&[3.0]), None);
    }
}
