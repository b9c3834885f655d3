//! Analytical summaries of a series and its forecast.
//!
//! Four independent pure functions: [`compute_profile`], [`compute_trend`],
//! [`compute_seasonality`] and [`summarize_forecast`]. Degenerate inputs
//! produce `None` or an `Unknown` label, never an error.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::forecast::ForecastPoint;
use crate::orchestrator::ForecastResult;
use crate::series::TimeSeries;
use crate::stats::{
    count_iqr_outliers, lagged_correlation, linear_fit, mean, median, min_max, pct_change,
    sample_std,
};

/// Trailing points used for the trend slope.
pub const TREND_WINDOW: usize = 30;
/// Trailing points used for the ~3 month change (63 business days).
pub const QUARTER_LOOKBACK: usize = 63;
/// Minimum series length before the lag-7 autocorrelation is computed.
pub const MIN_ACF_ROWS: usize = 14;
/// Forecast rank reported as the near-term point.
pub const NEAR_RANK: usize = 5;

/// |acf7| thresholds for the weekly strength label.
pub const STRONG_ACF: f64 = 0.5;
pub const MEDIUM_ACF: f64 = 0.2;

/// Band-ratio thresholds for the confidence label.
pub const HIGH_CONFIDENCE_BAND: f64 = 0.1;
pub const MEDIUM_CONFIDENCE_BAND: f64 = 0.2;

/// Weekly seasonality strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strength {
    Strong,
    Medium,
    Weak,
    Unknown,
}

impl Strength {
    pub fn from_acf(acf: Option<f64>) -> Self {
        match acf.map(f64::abs) {
            None => Strength::Unknown,
            Some(a) if a >= STRONG_ACF => Strength::Strong,
            Some(a) if a >= MEDIUM_ACF => Strength::Medium,
            Some(_) => Strength::Weak,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Strength::Strong => "strong",
            Strength::Medium => "medium",
            Strength::Weak => "weak",
            Strength::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Strength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Forecast confidence derived from the band ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Medium,
    Low,
    Unknown,
}

impl Confidence {
    pub fn from_band_ratio(ratio: Option<f64>) -> Self {
        match ratio {
            None => Confidence::Unknown,
            Some(r) if r < HIGH_CONFIDENCE_BAND => Confidence::High,
            Some(r) if r < MEDIUM_CONFIDENCE_BAND => Confidence::Medium,
            Some(_) => Confidence::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
            Confidence::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Descriptive statistics of the series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profile {
    pub rows: usize,
    pub date_min: Option<NaiveDate>,
    pub date_max: Option<NaiveDate>,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Sample standard deviation, 0 for fewer than two rows
    pub std: f64,
    /// Coefficient of variation, `None` when the mean is 0 or absent
    pub cv: Option<f64>,
    pub outliers: usize,
    pub missing: usize,
    pub duplicates: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSummary {
    /// OLS slope per step over the trailing window
    pub slope_30d: f64,
    pub delta_3mo_pct: Option<f64>,
    /// Reserved; currently always empty
    pub changepoints: Vec<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonalitySummary {
    pub weekly_strength: Strength,
    /// Weekend mean relative to weekday mean, in percent
    pub weekend_delta_pct: Option<f64>,
    pub acf7: Option<f64>,
}

/// Point and interval at one forecast rank.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BandPoint {
    pub point: f64,
    pub lower: f64,
    pub upper: f64,
}

impl From<&ForecastPoint> for BandPoint {
    fn from(p: &ForecastPoint) -> Self {
        Self {
            point: p.point_estimate,
            lower: p.lower_bound,
            upper: p.upper_bound,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastSynthesis {
    pub horizon_days: usize,
    /// Forecast at the 5-day mark
    pub near: Option<BandPoint>,
    /// Forecast at the horizon-day mark
    pub horizon: Option<BandPoint>,
    /// Change from the latest observed value to the horizon point, in percent
    pub delta_pct: Option<f64>,
    /// Median of `|upper - lower| / |point|` over non-zero points
    pub band_ratio: Option<f64>,
    pub confidence: Confidence,
}

/// All four summaries of one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summaries {
    pub profile: Profile,
    pub trend: TrendSummary,
    pub seasonality: SeasonalitySummary,
    pub forecast_synthesis: ForecastSynthesis,
}

/// Profile of `series`; `missing` and `duplicates` come from normalization.
pub fn compute_profile(series: &TimeSeries, missing: usize, duplicates: usize) -> Profile {
    let values = series.values();
    let mean = mean(values);
    let std = sample_std(values);
    let (min, max) = match min_max(values) {
        Some((lo, hi)) => (Some(lo), Some(hi)),
        None => (None, None),
    };
    let cv = mean
        .filter(|&m| m != 0.0)
        .map(|m| std / m)
        .filter(|cv| cv.is_finite());

    Profile {
        rows: series.len(),
        date_min: series.first_date(),
        date_max: series.last_date(),
        mean,
        median: median(values),
        min,
        max,
        std,
        cv,
        outliers: count_iqr_outliers(values),
        missing,
        duplicates,
    }
}

pub fn compute_trend(series: &TimeSeries) -> TrendSummary {
    let values = series.values();
    let n = values.len();

    let slope_30d = if n < 2 {
        0.0
    } else {
        linear_fit(&values[n - TREND_WINDOW.min(n)..])
            .map(|fit| fit.slope)
            .unwrap_or(0.0)
    };

    let lookback = n.saturating_sub(1).min(QUARTER_LOOKBACK);
    let delta_3mo_pct = if lookback > 0 {
        pct_change(values[n - 1 - lookback], values[n - 1])
    } else {
        None
    };

    TrendSummary {
        slope_30d,
        delta_3mo_pct,
        changepoints: Vec::new(),
    }
}

/// Mean of the per-weekday means for `days`, `None` unless every day is present.
fn mean_of_weekday_means(by_weekday: &[Vec<f64>; 7], days: &[usize]) -> Option<f64> {
    let means = days
        .iter()
        .map(|&d| mean(&by_weekday[d]))
        .collect::<Option<Vec<f64>>>()?;
    mean(&means)
}

pub fn compute_seasonality(series: &TimeSeries) -> SeasonalitySummary {
    let mut by_weekday: [Vec<f64>; 7] = Default::default();
    for (date, value) in series.iter() {
        by_weekday[date.weekday().num_days_from_monday() as usize].push(value);
    }

    let weekday_mean = mean_of_weekday_means(&by_weekday, &[0, 1, 2, 3, 4]);
    let weekend_mean = mean_of_weekday_means(&by_weekday, &[5, 6]);
    let weekend_delta_pct = match (weekday_mean, weekend_mean) {
        (Some(wd), Some(we)) if we != 0.0 => pct_change(wd, we),
        _ => None,
    };

    let acf7 = if series.len() > MIN_ACF_ROWS {
        lagged_correlation(series.values(), 7)
    } else {
        None
    };

    SeasonalitySummary {
        weekly_strength: Strength::from_acf(acf7),
        weekend_delta_pct,
        acf7,
    }
}

/// Synthesize the forecast: points at rank 5 and at `horizon_days`, band ratio,
/// confidence, and change from the latest value in `series`.
pub fn summarize_forecast(
    series: &TimeSeries,
    forecast: &[ForecastPoint],
    horizon_days: usize,
) -> ForecastSynthesis {
    let future = &forecast[forecast.len().saturating_sub(horizon_days)..];

    let pick = |rank: usize| -> Option<BandPoint> {
        let idx = rank.saturating_sub(1).min(future.len().checked_sub(1)?);
        future.get(idx).map(BandPoint::from)
    };
    let near = pick(NEAR_RANK);
    let horizon = pick(horizon_days);

    let ratios: Vec<f64> = future.iter().filter_map(ForecastPoint::band_ratio).collect();
    let band_ratio = median(&ratios);

    let delta_pct = series
        .last_value()
        .zip(horizon)
        .and_then(|(latest, h)| pct_change(latest, h.point));

    ForecastSynthesis {
        horizon_days,
        near,
        horizon,
        delta_pct,
        band_ratio,
        confidence: Confidence::from_band_ratio(band_ratio),
    }
}

/// Compute all four summaries for a series and its forecast result.
pub fn summarize(series: &TimeSeries, result: &ForecastResult) -> Summaries {
    Summaries {
        profile: compute_profile(
            series,
            result.diagnostics.missing,
            result.diagnostics.deduped,
        ),
        trend: compute_trend(series),
        seasonality: compute_seasonality(series),
        forecast_synthesis: summarize_forecast(series, &result.forecast, result.forecast.len()),
    }
}
