//! Basic Statistics

use data_validator::PlantRecord;
use tracing::debug;

/// Number of points in the trailing rolling average
pub const ROLLING_WINDOW: usize = 7;

/// Arithmetic mean, zero for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1), `None` with fewer than two values
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values);
    let sum_sq: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    Some((sum_sq / (values.len() - 1) as f64).sqrt())
}

/// Trailing mean over up to `window` points ending at each position.
///
/// The first points average over however many values exist so far.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    let mut out = Vec::with_capacity(values.len());
    let mut sum = 0.0;
    for (i, v) in values.iter().enumerate() {
        sum += v;
        if i >= window {
            sum -= values[i - window];
        }
        let n = (i + 1).min(window);
        out.push(sum / n as f64);
    }
    out
}

/// Drop records whose production is more than three standard deviations from the mean.
///
/// With fewer than two records there is no spread to judge, so all are kept.
pub fn remove_outliers(records: &[PlantRecord]) -> Vec<PlantRecord> {
    let values: Vec<f64> = records
        .iter()
        .map(|r| r.record.bottles_produced as f64)
        .collect();
    let Some(std_dev) = sample_std_dev(&values) else {
        return records.to_vec();
    };
    let m = mean(&values);

    let kept: Vec<PlantRecord> = records
        .iter()
        .zip(&values)
        .filter(|(_, v)| (*v - m).abs() <= 3.0 * std_dev)
        .map(|(r, _)| r.clone())
        .collect();
    debug!("Outlier filter kept {} of {} records", kept.len(), records.len());
    kept
}
