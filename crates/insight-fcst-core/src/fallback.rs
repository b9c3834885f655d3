//! Deterministic fallback forecaster.
//!
//! Straight-line extrapolation of the trailing window with a constant-width
//! band. It never fails and always returns exactly `horizon` steps, which is
//! what lets the orchestrator guarantee a complete forecast.

use crate::forecast::{ForecastOutput, Z_95};
use crate::stats::{linear_fit, residual_std};

/// Number of trailing observations the trend is fitted on.
pub const FALLBACK_WINDOW: usize = 30;

/// Model name reported for fallback forecasts.
pub const FALLBACK_MODEL_NAME: &str = "LinearTrendFallback";

/// Parameters of the fallback extrapolation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallbackFit {
    /// Anchor of the extrapolation (last observed value)
    pub level: f64,
    /// Per-step slope of the trailing window
    pub slope: f64,
    /// Sample std of the window's fit residuals
    pub sigma: f64,
}

/// Fit the fallback parameters on the trailing window of `history`.
pub fn fit_fallback(history: &[f64]) -> FallbackFit {
    let start = history.len().saturating_sub(FALLBACK_WINDOW);
    let recent = &history[start..];

    let Some(&last) = recent.last() else {
        return FallbackFit {
            level: 0.0,
            slope: 0.0,
            sigma: 0.0,
        };
    };

    match linear_fit(recent) {
        Some(fit) => FallbackFit {
            level: last,
            slope: fit.slope,
            sigma: residual_std(recent, &fit),
        },
        None => FallbackFit {
            level: last,
            slope: 0.0,
            sigma: 0.0,
        },
    }
}

/// Forecast `horizon` steps from `history` by linear extrapolation.
pub fn forecast_fallback(history: &[f64], horizon: usize) -> ForecastOutput {
    let fit = fit_fallback(history);

    let point: Vec<f64> = (1..=horizon)
        .map(|i| fit.level + fit.slope * i as f64)
        .collect();
    let lower = point.iter().map(|p| p - Z_95 * fit.sigma).collect();
    let upper = point.iter().map(|p| p + Z_95 * fit.sigma).collect();

    ForecastOutput {
        point,
        lower,
        upper,
        model_name: FALLBACK_MODEL_NAME.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_empty_history() {
        let output = forecast_fallback(&[], 5);
        assert_eq!(output.point, vec![0.0; 5]);
        assert_eq!(output.lower, vec![0.0; 5]);
        assert_eq!(output.upper, vec![0.0; 5]);
    }

    #[test]
    fn test_single_point() {
        let output = forecast_fallback(&[42.0], 3);
        assert_eq!(output.point, vec![42.0; 3]);
        assert_eq!(output.lower, output.upper);
    }

    #[test]
    fn test_anchors_at_last_observation() {
        // Noisy upward series: the regression line at the last index differs
        // from the last value, but the forecast must continue from the value.
        let history = [10.0, 12.0, 11.0, 14.0, 13.0, 16.0, 20.0];
        let fit = fit_fallback(&history);
        let output = forecast_fallback(&history, 2);

        assert_relative_eq!(output.point[0], 20.0 + fit.slope, epsilon = 1e-10);
        assert_relative_eq!(output.point[1], 20.0 + 2.0 * fit.slope, epsilon = 1e-10);
        assert!(fit.sigma > 0.0);
        assert_relative_eq!(
            output.upper[0] - output.lower[0],
            2.0 * Z_95 * fit.sigma,
            epsilon = 1e-10
        );
    }

    #[test]
    fn test_uses_trailing_window_only() {
        // A jump far back in history must not influence the trailing slope.
        let mut history = vec![1000.0; 10];
        history.extend((0..30).map(|i| i as f64));
        let fit = fit_fallback(&history);
        assert_relative_eq!(fit.slope, 1.0, epsilon = 1e-10);
        assert_relative_eq!(fit.sigma, 0.0, epsilon = 1e-10);
        assert_eq!(fit.level, 29.0);
    }

    #[test]
    fn test_no_clamping_of_negative_values() {
        let history: Vec<f64> = (0..10).map(|i| 10.0 - 2.0 * i as f64).collect();
        let output = forecast_fallback(&history, 10);
        assert!(output.point.iter().any(|&p| p < 0.0));
    }

    #[test]
    fn test_always_returns_horizon_points() {
        for horizon in [0, 1, 7, 90] {
            let output = forecast_fallback(&[1.0, 2.0], horizon);
            assert_eq!(output.point.len(), horizon);
            assert!(output.validate(horizon).is_ok());
        }
    }
}
