//! Regression metrics and the distribution helpers used by the evaluation
//! report.

use itertools_num::linspace;
use statrs::statistics::Statistics;

/// Coefficient of determination.
///
/// Undefined (NaN) for fewer than two samples. A constant target of two or
/// more samples yields 1.0 for a perfect prediction and 0.0 otherwise.
pub fn r2_score(y_true: &[f64], y_pred: &[f64]) -> f64 {
    if y_true.len() < 2 {
        return f64::NAN;
    }
    let mean = y_true.mean();
    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred)
        .map(|(t, p)| (t - p).powi(2))
        .sum();
    let ss_tot: f64 = y_true.iter().map(|t| (t - mean).powi(2)).sum();
    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

pub fn rmse(y_true: &[f64], y_pred: &[f64]) -> f64 {
    let n = y_true.len() as f64;
    let mse = y_true
        .iter()
        .zip(y_pred)
        .map(|(t, p)| (t - p).powi(2))
        .sum::<f64>()
        / n;
    mse.sqrt()
}

/// Mean and population standard deviation.
pub fn mean_std(values: &[f64]) -> (f64, f64) {
    (values.mean(), values.population_std_dev())
}

/// Sample quantiles with the plotting positions
/// `(k - alphap) / (n + 1 - alphap - betap)`.
///
/// With `alphap = betap = 0.4` this is the approximately unbiased estimator
/// that is the default of most statistics packages. Returns NaN for every
/// probability when `data` is empty.
pub fn mquantiles(data: &[f64], probs: &[f64], alphap: f64, betap: f64) -> Vec<f64> {
    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let n = sorted.len();
    probs
        .iter()
        .map(|&p| match n {
            0 => f64::NAN,
            1 => sorted[0],
            _ => {
                let m = alphap + p * (1.0 - alphap - betap);
                let aleph = n as f64 * p + m;
                let k = aleph.clamp(1.0, (n - 1) as f64).floor();
                let gamma = (aleph - k).clamp(0.0, 1.0);
                let k = k as usize;
                (1.0 - gamma) * sorted[k - 1] + gamma * sorted[k]
            }
        })
        .collect()
}

/// Gaussian kernel density estimate on `points` evenly spaced positions
/// spanning the data, with Scott's bandwidth.
pub fn gaussian_kde(data: &[f64], points: usize) -> (Vec<f64>, Vec<f64>) {
    let n = data.len();
    if n < 2 {
        return (Vec::new(), Vec::new());
    }
    let std = data.std_dev();
    let bandwidth = std * (n as f64).powf(-0.2);
    if !(bandwidth > 0.0) {
        return (Vec::new(), Vec::new());
    }
    let lo = data.min() - 3.0 * bandwidth;
    let hi = data.max() + 3.0 * bandwidth;
    let norm = 1.0 / (n as f64 * bandwidth * (2.0 * std::f64::consts::PI).sqrt());
    let xs: Vec<f64> = linspace(lo, hi, points).collect();
    let density = xs
        .iter()
        .map(|&x| {
            norm * data
                .iter()
                .map(|&d| (-0.5 * ((x - d) / bandwidth).powi(2)).exp())
                .sum::<f64>()
        })
        .collect();
    (xs, density)
}
