//! Numeric primitives shared by the forecasters and the analytics summaries.
//!
//! Every helper here is total: empty or degenerate input yields a neutral
//! value (`None`, `0.0`) instead of an error or a NaN.

use statrs::statistics::Statistics;

/// Ordinary least squares fit of `value ~ intercept + slope * index`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    /// Fitted value at index `x`.
    pub fn at(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().mean())
    }
}

/// Sample standard deviation (n-1 denominator); 0 when fewer than two values.
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let sd = values.iter().std_dev();
    if sd.is_finite() {
        sd
    } else {
        0.0
    }
}

/// Minimum and maximum, `None` for an empty slice.
pub fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    Some((min, max))
}

/// Quantile `q` in [0, 1] of an ascending slice, interpolating between ranks.
///
/// Backs [`median`] and the [`tukey_fences`]; NaN when empty.
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    let (Some(&first), Some(&last)) = (sorted.first(), sorted.last()) else {
        return f64::NAN;
    };
    let rank = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let below = rank.floor() as usize;
    if below + 1 >= sorted.len() {
        return if q <= 0.0 { first } else { last };
    }
    let weight = rank - below as f64;
    sorted[below] + (sorted[below + 1] - sorted[below]) * weight
}

fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    sorted
}

/// Median, `None` for an empty slice.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(percentile(&sorted_copy(values), 0.5))
}

/// Fit a straight line against the positions `0..n`.
///
/// With a single point the slope is 0 and the intercept is that point.
/// Returns `None` for empty input or when the fit is not finite.
pub fn linear_fit(values: &[f64]) -> Option<LinearFit> {
    let n = values.len();
    if n == 0 {
        return None;
    }

    let x_mean = (n - 1) as f64 / 2.0;
    let y_mean = values.iter().sum::<f64>() / n as f64;

    let mut ss_xx = 0.0;
    let mut ss_xy = 0.0;
    for (i, &y) in values.iter().enumerate() {
        let x = i as f64;
        ss_xx += (x - x_mean).powi(2);
        ss_xy += (x - x_mean) * (y - y_mean);
    }

    let slope = if ss_xx > 0.0 { ss_xy / ss_xx } else { 0.0 };
    let intercept = y_mean - slope * x_mean;

    if slope.is_finite() && intercept.is_finite() {
        Some(LinearFit { slope, intercept })
    } else {
        None
    }
}

/// Sample standard deviation of the residuals of `fit`; 0 with fewer than two points.
pub fn residual_std(values: &[f64], fit: &LinearFit) -> f64 {
    let residuals: Vec<f64> = values
        .iter()
        .enumerate()
        .map(|(i, &y)| y - fit.at(i as f64))
        .collect();
    sample_std(&residuals)
}

/// Tukey fences `[Q1 - 1.5 IQR, Q3 + 1.5 IQR]`, only defined for four or more values.
pub fn tukey_fences(values: &[f64]) -> Option<(f64, f64)> {
    if values.len() < 4 {
        return None;
    }
    let sorted = sorted_copy(values);
    let q1 = percentile(&sorted, 0.25);
    let q3 = percentile(&sorted, 0.75);
    let iqr = q3 - q1;
    Some((q1 - 1.5 * iqr, q3 + 1.5 * iqr))
}

/// Number of values outside the Tukey fences (0 when fewer than four values).
pub fn count_iqr_outliers(values: &[f64]) -> usize {
    match tukey_fences(values) {
        Some((lower, upper)) => values.iter().filter(|&&v| v < lower || v > upper).count(),
        None => 0,
    }
}

/// Correlation between `values[..n-lag]` and `values[lag..]`, each centred on its own mean.
///
/// `None` when the series is not longer than `lag` or either centred vector has zero norm.
pub fn lagged_correlation(values: &[f64], lag: usize) -> Option<f64> {
    if lag == 0 || values.len() <= lag {
        return None;
    }
    let head = &values[..values.len() - lag];
    let tail = &values[lag..];

    let head_mean = head.iter().sum::<f64>() / head.len() as f64;
    let tail_mean = tail.iter().sum::<f64>() / tail.len() as f64;

    let mut dot = 0.0;
    let mut head_sq = 0.0;
    let mut tail_sq = 0.0;
    for (&a, &b) in head.iter().zip(tail.iter()) {
        let a = a - head_mean;
        let b = b - tail_mean;
        dot += a * b;
        head_sq += a * a;
        tail_sq += b * b;
    }

    let denom = head_sq.sqrt() * tail_sq.sqrt();
    if denom == 0.0 || !denom.is_finite() {
        None
    } else {
        Some(dot / denom)
    }
}

/// Percentage change from `reference` to `value`; `None` when the reference is 0.
pub fn pct_change(reference: f64, value: f64) -> Option<f64> {
    if reference == 0.0 {
        return None;
    }
    let pct = (value - reference) / reference * 100.0;
    pct.is_finite().then_some(pct)
}
