//! Forecast types and the primary forecasting model.
//!
//! The primary model sits behind [`PrimaryModel`] so the orchestrator can be
//! exercised with substitute implementations. The default implementation
//! wraps the `anofox-forecast` MSTL forecaster and is only compiled with the
//! `primary-model` feature; without it [`default_primary`] returns `None` and
//! every request takes the fallback path.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{InsightError, Result};
use crate::series::TimeSeries;

/// Z-score of the 95% interval used by every forecaster in this crate.
pub const Z_95: f64 = 1.96;

/// A single forecast step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub point_estimate: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

impl ForecastPoint {
    /// Create a point, widening the bounds if needed so that
    /// `lower_bound <= point_estimate <= upper_bound` holds.
    pub fn new(date: NaiveDate, point_estimate: f64, lower: f64, upper: f64) -> Self {
        Self {
            date,
            point_estimate,
            lower_bound: lower.min(point_estimate),
            upper_bound: upper.max(point_estimate),
        }
    }

    /// Interval width relative to the point estimate; `None` at a zero estimate.
    pub fn band_ratio(&self) -> Option<f64> {
        if self.point_estimate == 0.0 {
            return None;
        }
        let ratio = (self.upper_bound - self.lower_bound).abs() / self.point_estimate.abs();
        ratio.is_finite().then_some(ratio)
    }
}

/// How future dates are laid out after the last observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FutureDates {
    /// Every calendar day
    #[default]
    Calendar,
    /// Monday to Friday only
    BusinessDays,
}

impl std::str::FromStr for FutureDates {
    type Err = InsightError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "calendar" | "d" | "daily" => Ok(FutureDates::Calendar),
            "business" | "business_days" | "b" | "weekdays" => Ok(FutureDates::BusinessDays),
            _ => Err(InsightError::InvalidParameter {
                param: "future_dates".into(),
                value: s.into(),
                reason: "expected 'calendar' or 'business'".into(),
            }),
        }
    }
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// The `horizon` dates following `last`.
pub fn future_dates(last: NaiveDate, horizon: usize, layout: FutureDates) -> Vec<NaiveDate> {
    let days = last.iter_days().skip(1);
    match layout {
        FutureDates::Calendar => days.take(horizon).collect(),
        FutureDates::BusinessDays => days.filter(|d| !is_weekend(*d)).take(horizon).collect(),
    }
}

/// Raw output of a forecasting model, before dates are attached.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastOutput {
    /// Point forecasts
    pub point: Vec<f64>,
    /// Lower interval bounds
    pub lower: Vec<f64>,
    /// Upper interval bounds
    pub upper: Vec<f64>,
    /// Model name used
    pub model_name: String,
}

impl ForecastOutput {
    /// Check that the output has exactly `horizon` finite steps on every band.
    pub fn validate(&self, horizon: usize) -> Result<()> {
        for (name, band) in [
            ("point", &self.point),
            ("lower", &self.lower),
            ("upper", &self.upper),
        ] {
            if band.len() != horizon {
                return Err(InsightError::ModelError(format!(
                    "{} returned {} {} values for horizon {}",
                    self.model_name,
                    band.len(),
                    name,
                    horizon
                )));
            }
            if band.iter().any(|v| !v.is_finite()) {
                return Err(InsightError::ModelError(format!(
                    "{} returned non-finite {} values",
                    self.model_name, name
                )));
            }
        }
        Ok(())
    }

    /// Attach dates to each step.
    pub fn into_points(self, dates: &[NaiveDate]) -> Vec<ForecastPoint> {
        dates
            .iter()
            .zip(self.point)
            .zip(self.lower.into_iter().zip(self.upper))
            .map(|((&date, point), (lower, upper))| ForecastPoint::new(date, point, lower, upper))
            .collect()
    }
}

/// Capability interface of the primary forecasting model.
pub trait PrimaryModel {
    /// Model name for diagnostics.
    fn name(&self) -> &str;

    /// Fit on `series` and forecast `horizon` steps with a 95% interval.
    fn fit_predict(&self, series: &TimeSeries, horizon: usize) -> Result<ForecastOutput>;
}

/// The primary model compiled into this build, if any.
pub fn default_primary() -> Option<Box<dyn PrimaryModel>> {
    #[cfg(feature = "primary-model")]
    {
        Some(Box::new(MstlPrimary::default()))
    }
    #[cfg(not(feature = "primary-model"))]
    {
        None
    }
}

#[cfg(feature = "primary-model")]
pub use mstl::MstlPrimary;

#[cfg(feature = "primary-model")]
mod mstl {
    use anofox_forecast::core::TimeSeries as ModelSeries;
    use anofox_forecast::models::exponential::AutoETS;
    use anofox_forecast::models::MSTLForecaster;
    use anofox_forecast::prelude::Forecaster;
    use chrono::{DateTime, Utc};

    use super::{ForecastOutput, PrimaryModel};
    use crate::error::{InsightError, Result};
    use crate::series::TimeSeries;

    /// Seasonal/trend decomposition forecaster: MSTL with weekly and yearly
    /// periods and an AutoETS trend, degrading to non-seasonal AutoETS when
    /// the series is shorter than two weekly cycles.
    #[derive(Debug, Clone)]
    pub struct MstlPrimary {
        /// Candidate seasonal periods, in days
        pub periods: Vec<usize>,
        /// Interval level (0-1)
        pub confidence_level: f64,
    }

    impl Default for MstlPrimary {
        fn default() -> Self {
            Self {
                periods: vec![7, 365],
                confidence_level: 0.95,
            }
        }
    }

    impl MstlPrimary {
        /// Periods with at least two full cycles of history.
        fn usable_periods(&self, n: usize) -> Vec<usize> {
            self.periods
                .iter()
                .copied()
                .filter(|&p| p > 1 && n >= 2 * p)
                .collect()
        }
    }

    fn to_model_series(series: &TimeSeries) -> Result<ModelSeries> {
        let timestamps = series
            .dates()
            .iter()
            .map(|d| {
                d.and_hms_opt(0, 0, 0)
                    .map(|dt| dt.and_utc())
                    .ok_or_else(|| InsightError::ComputationError(format!("Invalid date {}", d)))
            })
            .collect::<Result<Vec<DateTime<Utc>>>>()?;

        ModelSeries::univariate(timestamps, series.values().to_vec()).map_err(|e| {
            InsightError::ComputationError(format!("Failed to build TimeSeries: {}", e))
        })
    }

    impl PrimaryModel for MstlPrimary {
        fn name(&self) -> &str {
            "MSTL"
        }

        fn fit_predict(&self, series: &TimeSeries, horizon: usize) -> Result<ForecastOutput> {
            let model_series = to_model_series(series)?;
            let periods = self.usable_periods(series.len());

            let (mut forecaster, model_name) = if periods.is_empty() {
                (
                    Box::new(AutoETS::non_seasonal()) as Box<dyn Forecaster>,
                    "AutoETS".to_string(),
                )
            } else {
                let name = format!("MSTL({:?})", periods);
                (
                    Box::new(MSTLForecaster::new(periods)) as Box<dyn Forecaster>,
                    name,
                )
            };

            forecaster
                .fit(&model_series)
                .map_err(|e| {
                    InsightError::ModelError(format!("Failed to fit {}: {}", model_name, e))
                })?;

            let forecast = forecaster
                .predict_with_intervals(horizon, self.confidence_level)
                .map_err(|e| {
                    InsightError::ModelError(format!("Failed to predict {}: {}", model_name, e))
                })?;

            let point = forecast.primary().to_vec();
            // Models with zero residual variance return no bands; collapse them onto the point.
            let lower = forecast
                .lower_series(0)
                .map(|s| s.to_vec())
                .unwrap_or_else(|_| point.clone());
            let upper = forecast
                .upper_series(0)
                .map(|s| s.to_vec())
                .unwrap_or_else(|_| point.clone());

            Ok(ForecastOutput {
                point,
                lower,
                upper,
                model_name,
            })
        }
    }

}
