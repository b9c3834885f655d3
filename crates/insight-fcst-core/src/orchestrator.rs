//! Forecast orchestration: primary model first, deterministic fallback second.
//!
//! ```text
//! TRY_PRIMARY ──ok──────────────────────────────▶ SUCCESS
//!      │ unavailable / too few rows / fit error
//!      ▼
//!   FALLBACK ──(never fails)─────────────────────▶ SUCCESS
//! ```

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Instant;

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{InsightError, Result};
use crate::fallback::forecast_fallback;
use crate::forecast::{
    default_primary, future_dates, ForecastOutput, ForecastPoint, FutureDates, PrimaryModel,
};
use crate::normalize::{normalize_with_report, NormalizeReport};
use crate::series::{Observation, TimeSeries};
use crate::stats::{count_iqr_outliers, pct_change};
use crate::table::Table;

/// Default forecast horizon in days.
pub const DEFAULT_HORIZON_DAYS: usize = 30;

/// Minimum number of rows before the primary model is attempted.
pub const MIN_PRIMARY_ROWS: usize = 10;

/// Forecast configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ForecastConfig {
    /// Number of future periods to forecast
    pub horizon_days: usize,
    /// Calendar or business-day layout of future dates
    pub future_dates: FutureDates,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            horizon_days: DEFAULT_HORIZON_DAYS,
            future_dates: FutureDates::Calendar,
        }
    }
}

impl ForecastConfig {
    pub fn with_horizon(horizon_days: usize) -> Self {
        Self {
            horizon_days,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.horizon_days == 0 {
            return Err(InsightError::InvalidParameter {
                param: "horizon_days".into(),
                value: self.horizon_days.to_string(),
                reason: "must be positive".into(),
            });
        }
        Ok(())
    }
}

/// Why the fallback forecaster was used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FallbackReason {
    /// No primary model is compiled into this build
    Unavailable,
    /// Fewer rows than `max(10, horizon_days)`
    TooFewRows { rows: usize, required: usize },
    /// The primary model failed to fit or predict
    FitPredictError { detail: String },
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::Unavailable => write!(f, "unavailable"),
            FallbackReason::TooFewRows { .. } => write!(f, "too few rows"),
            FallbackReason::FitPredictError { detail } => write!(f, "fit/predict error: {}", detail),
        }
    }
}

/// Outcome of the primary/fallback selection.
#[derive(Debug, Clone, PartialEq)]
pub enum ForecastOutcome {
    /// The primary model produced the forecast
    Primary(ForecastOutput),
    /// The fallback forecaster produced the forecast
    Degraded {
        output: ForecastOutput,
        reason: FallbackReason,
    },
}

impl ForecastOutcome {
    pub fn output(&self) -> &ForecastOutput {
        match self {
            ForecastOutcome::Primary(output) => output,
            ForecastOutcome::Degraded { output, .. } => output,
        }
    }

    pub fn reason(&self) -> Option<&FallbackReason> {
        match self {
            ForecastOutcome::Primary(_) => None,
            ForecastOutcome::Degraded { reason, .. } => Some(reason),
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, ForecastOutcome::Degraded { .. })
    }

    fn into_parts(self) -> (ForecastOutput, Option<FallbackReason>) {
        match self {
            ForecastOutcome::Primary(output) => (output, None),
            ForecastOutcome::Degraded { output, reason } => (output, Some(reason)),
        }
    }
}

/// Counts gathered while normalizing and fitting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    /// IQR outliers in the normalized series
    pub outliers: usize,
    /// Rows dropped for a missing or unparseable date or value
    pub missing: usize,
    /// Rows removed as duplicate dates
    pub deduped: usize,
}

/// Unified forecast result, whichever path produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastResult {
    pub history: Vec<Observation>,
    pub forecast: Vec<ForecastPoint>,
    pub summary_text: String,
    pub warnings: Vec<String>,
    pub diagnostics: Diagnostics,
    /// Name of the model that produced `forecast`
    pub model_name: String,
    /// Set when the fallback forecaster was used
    pub fallback_reason: Option<FallbackReason>,
}

impl ForecastResult {
    pub fn is_degraded(&self) -> bool {
        self.fallback_reason.is_some()
    }
}

/// Choose between the primary model and the fallback for `series`.
pub fn select_forecast(
    series: &TimeSeries,
    horizon: usize,
    primary: Option<&dyn PrimaryModel>,
) -> ForecastOutcome {
    let rows = series.len();
    let required = MIN_PRIMARY_ROWS.max(horizon);

    let reason = match primary {
        None => FallbackReason::Unavailable,
        Some(_) if rows < required => FallbackReason::TooFewRows { rows, required },
        Some(model) => match try_primary(model, series, horizon) {
            Ok(output) => return ForecastOutcome::Primary(output),
            Err(e) => FallbackReason::FitPredictError {
                detail: e.to_string(),
            },
        },
    };

    warn!(
        reason = %reason,
        rows,
        horizon,
        "Primary forecast unavailable, using fallback"
    );

    ForecastOutcome::Degraded {
        output: forecast_fallback(series.values(), horizon),
        reason,
    }
}

fn try_primary(
    model: &dyn PrimaryModel,
    series: &TimeSeries,
    horizon: usize,
) -> Result<ForecastOutput> {
    let start = Instant::now();
    let output = catch_unwind(AssertUnwindSafe(|| model.fit_predict(series, horizon)))
        .map_err(|_| InsightError::ModelError(format!("panic in {}", model.name())))??;
    output.validate(horizon)?;

    debug!(
        model = %output.model_name,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Primary model fitted"
    );
    Ok(output)
}

fn round1(x: f64) -> f64 {
    let r = (x * 10.0).round() / 10.0;
    if r == 0.0 {
        0.0
    } else {
        r
    }
}

fn summary_text(series: &TimeSeries, forecast: &[ForecastPoint], horizon: usize, degraded: bool) -> String {
    let delta = series
        .last_value()
        .zip(forecast.last())
        .and_then(|(latest, fp)| pct_change(latest, fp.point_estimate));

    match delta {
        Some(delta) if degraded => format!(
            "{}-day (simple) forecast median is {:+.1}% vs the latest value.",
            horizon,
            round1(delta)
        ),
        Some(delta) => format!(
            "{}-day forecast median is {:+.1}% vs the latest value. Treat the overall trend as indicative only.",
            horizon,
            round1(delta)
        ),
        None => "-".to_string(),
    }
}

/// Forecast an already-normalized series.
pub fn forecast_series(
    series: &TimeSeries,
    report: &NormalizeReport,
    config: &ForecastConfig,
    primary: Option<&dyn PrimaryModel>,
) -> Result<ForecastResult> {
    config.validate()?;
    let horizon = config.horizon_days;
    let start = Instant::now();

    info!(rows = series.len(), horizon, "Starting forecast");

    let outcome = select_forecast(series, horizon, primary);
    let (output, fallback_reason) = outcome.into_parts();
    let model_name = output.model_name.clone();

    let last_date: NaiveDate = series
        .last_date()
        .unwrap_or_else(|| Utc::now().date_naive());
    let dates = future_dates(last_date, horizon, config.future_dates);
    let forecast = output.into_points(&dates);

    let mut warnings = Vec::new();
    if let Some(reason) = &fallback_reason {
        warnings.push(format!(
            "Degraded to simple fallback forecast (linear trend extrapolation). Reason: {}",
            reason
        ));
    }
    if series.len() < horizon * 2 {
        warnings.push(format!(
            "Limited data ({} rows for a {}-day horizon); consider a shorter forecast horizon.",
            series.len(),
            horizon
        ));
    }

    let diagnostics = Diagnostics {
        outliers: count_iqr_outliers(series.values()),
        missing: report.dropped,
        deduped: report.deduped,
    };

    let summary_text = summary_text(series, &forecast, horizon, fallback_reason.is_some());

    info!(
        model = %model_name,
        degraded = fallback_reason.is_some(),
        points = forecast.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Forecast complete"
    );

    Ok(ForecastResult {
        history: series.observations(),
        forecast,
        summary_text,
        warnings,
        diagnostics,
        model_name,
        fallback_reason,
    })
}

/// Normalize `table` and forecast it with an explicit configuration and model.
pub fn run_forecast_with(
    table: &Table,
    date_col: &str,
    value_col: &str,
    config: &ForecastConfig,
    primary: Option<&dyn PrimaryModel>,
) -> Result<ForecastResult> {
    config.validate()?;
    let (series, report) = normalize_with_report(table, date_col, value_col)?;
    forecast_series(&series, &report, config, primary)
}

/// Normalize `table` and forecast `horizon_days` ahead with the default primary model.
///
/// Only contract violations (missing columns, zero horizon) are errors; model
/// failures degrade to the fallback forecaster and surface as warnings.
pub fn run_forecast(
    table: &Table,
    date_col: &str,
    value_col: &str,
    horizon_days: usize,
) -> Result<ForecastResult> {
    let primary = default_primary();
    run_forecast_with(
        table,
        date_col,
        value_col,
        &ForecastConfig::with_horizon(horizon_days),
        primary.as_deref(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn daily_series(n: usize) -> TimeSeries {
        let pairs = d(2024, 1, 1)
            .iter_days()
            .take(n)
            .enumerate()
            .map(|(i, date)| (date, 100.0 + i as f64))
            .collect();
        TimeSeries::from_pairs(pairs).unwrap()
    }

    /// Returns a flat forecast at a fixed level.
    struct FlatModel(f64);

    impl PrimaryModel for FlatModel {
        fn name(&self) -> &str {
            "Flat"
        }

        fn fit_predict(&self, _series: &TimeSeries, horizon: usize) -> Result<ForecastOutput> {
            Ok(ForecastOutput {
                point: vec![self.0; horizon],
                lower: vec![self.0 - 1.0; horizon],
                upper: vec![self.0 + 1.0; horizon],
                model_name: "Flat".into(),
            })
        }
    }

    struct FailingModel;

    impl PrimaryModel for FailingModel {
        fn name(&self) -> &str {
            "Failing"
        }

        fn fit_predict(&self, _series: &TimeSeries, _horizon: usize) -> Result<ForecastOutput> {
            Err(InsightError::ModelError("singular matrix".into()))
        }
    }

    struct PanickingModel;

    impl PrimaryModel for PanickingModel {
        fn name(&self) -> &str {
            "Panicking"
        }

        fn fit_predict(&self, _series: &TimeSeries, _horizon: usize) -> Result<ForecastOutput> {
            panic!("model blew up")
        }
    }

    struct ShortModel;

    impl PrimaryModel for ShortModel {
        fn name(&self) -> &str {
            "Short"
        }

        fn fit_predict(&self, _series: &TimeSeries, horizon: usize) -> Result<ForecastOutput> {
            Ok(ForecastOutput {
                point: vec![1.0; horizon - 1],
                lower: vec![1.0; horizon - 1],
                upper: vec![1.0; horizon - 1],
                model_name: "Short".into(),
            })
        }
    }

    #[test]
    fn test_primary_success() {
        let series = daily_series(60);
        let outcome = select_forecast(&series, 30, Some(&FlatModel(5.0)));
        assert!(!outcome.is_degraded());
        assert_eq!(outcome.output().point, vec![5.0; 30]);
    }

    #[test]
    fn test_unavailable_primary() {
        let series = daily_series(60);
        let outcome = select_forecast(&series, 30, None);
        assert_eq!(outcome.reason(), Some(&FallbackReason::Unavailable));
    }

    #[test]
    fn test_too_few_rows() {
        let series = daily_series(3);
        let outcome = select_forecast(&series, 30, Some(&FlatModel(5.0)));
        assert_eq!(
            outcome.reason(),
            Some(&FallbackReason::TooFewRows {
                rows: 3,
                required: 30
            })
        );
        assert_eq!(outcome.reason().unwrap().to_string(), "too few rows");

        // The floor of 10 rows applies even for short horizons
        let outcome = select_forecast(&daily_series(9), 5, Some(&FlatModel(5.0)));
        assert!(outcome.is_degraded());
        let outcome = select_forecast(&daily_series(10), 5, Some(&FlatModel(5.0)));
        assert!(!outcome.is_degraded());
    }

    #[test]
    fn test_fit_error_falls_back() {
        let series = daily_series(60);
        let outcome = select_forecast(&series, 30, Some(&FailingModel));
        let reason = outcome.reason().unwrap().to_string();
        assert!(reason.starts_with("fit/predict error: "));
        assert!(reason.contains("singular matrix"));
        assert_eq!(outcome.output().point.len(), 30);
    }

    #[test]
    fn test_panicking_model_falls_back() {
        let series = daily_series(60);
        let outcome = select_forecast(&series, 30, Some(&PanickingModel));
        assert!(matches!(
            outcome.reason(),
            Some(FallbackReason::FitPredictError { .. })
        ));
    }

    #[test]
    fn test_wrong_length_output_falls_back() {
        let series = daily_series(60);
        let outcome = select_forecast(&series, 30, Some(&ShortModel));
        assert!(outcome.is_degraded());
        assert_eq!(outcome.output().point.len(), 30);
    }

    #[test]
    fn test_result_dates_are_contiguous() {
        let series = daily_series(60);
        let config = ForecastConfig::with_horizon(14);
        let result =
            forecast_series(&series, &NormalizeReport::default(), &config, Some(&FlatModel(1.0)))
                .unwrap();

        assert_eq!(result.forecast.len(), 14);
        assert_eq!(result.forecast[0].date, d(2024, 3, 1));
        for w in result.forecast.windows(2) {
            assert_eq!(w[1].date, w[0].date.succ_opt().unwrap());
        }
        assert!(result.warnings.is_empty());
        assert_eq!(result.model_name, "Flat");
    }

    #[test]
    fn test_fallback_warnings() {
        let series = daily_series(3);
        let result = forecast_series(
            &series,
            &NormalizeReport::default(),
            &ForecastConfig::default(),
            Some(&FlatModel(1.0)),
        )
        .unwrap();

        assert!(result.is_degraded());
        assert_eq!(result.warnings.len(), 2);
        assert!(result.warnings[0].contains("Degraded to simple fallback"));
        assert!(result.warnings[0].contains("too few rows"));
        assert!(result.warnings[1].contains("Limited data"));
        assert!(result.summary_text.contains("(simple)"));
    }

    #[test]
    fn test_data_sufficiency_warning_on_primary_path() {
        let series = daily_series(40);
        let result = forecast_series(
            &series,
            &NormalizeReport::default(),
            &ForecastConfig::default(),
            Some(&FlatModel(1.0)),
        )
        .unwrap();
        assert!(!result.is_degraded());
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("Limited data"));
    }

    #[test]
    fn test_summary_text() {
        let series = daily_series(60); // latest value 159
        let result = forecast_series(
            &series,
            &NormalizeReport::default(),
            &ForecastConfig::with_horizon(10),
            Some(&FlatModel(159.0 * 1.1)),
        )
        .unwrap();
        assert!(result.summary_text.starts_with("10-day forecast median is +10.0%"));
    }

    #[test]
    fn test_zero_horizon_is_rejected() {
        let series = daily_series(5);
        let err = forecast_series(
            &series,
            &NormalizeReport::default(),
            &ForecastConfig::with_horizon(0),
            None,
        )
        .unwrap_err();
        assert!(err.is_client_error());
    }

    #[test]
    fn test_empty_series_still_forecasts() {
        let result = forecast_series(
            &TimeSeries::default(),
            &NormalizeReport::default(),
            &ForecastConfig::with_horizon(7),
            None,
        )
        .unwrap();
        assert_eq!(result.forecast.len(), 7);
        assert!(result
            .forecast
            .iter()
            .all(|p| p.point_estimate == 0.0 && p.lower_bound == 0.0 && p.upper_bound == 0.0));
        assert_eq!(result.summary_text, "-");
    }

    #[test]
    fn test_constant_weekly_gaps_example() {
        let table =
            Table::from_csv_str("date,value\n2024-01-01,100\n2024-01-02,100\n2024-01-08,100\n")
                .unwrap();
        let result =
            run_forecast_with(&table, "date", "value", &ForecastConfig::with_horizon(5), None)
                .unwrap();

        assert_eq!(result.forecast.len(), 5);
        assert_eq!(result.forecast[0].date, d(2024, 1, 9));
        for p in &result.forecast {
            assert_relative_eq!(p.point_estimate, 100.0, epsilon = 1e-9);
            assert_relative_eq!(p.upper_bound - p.lower_bound, 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_diagnostics_report_real_counts() {
        let table = Table::from_csv_str(
            "date,value\n2024-01-01,1\n2024-01-01,2\nxx,3\n2024-01-03,\n2024-01-04,4\n",
        )
        .unwrap();
        let result =
            run_forecast_with(&table, "date", "value", &ForecastConfig::with_horizon(3), None)
                .unwrap();
        assert_eq!(result.diagnostics.deduped, 1);
        assert_eq!(result.diagnostics.missing, 2);
        assert_eq!(result.history.len(), 2);
    }

    #[test]
    fn test_missing_column_is_an_error() {
        let table = Table::from_csv_str("date,value\n2024-01-01,1\n").unwrap();
        let err = run_forecast(&table, "date", "close", 30).unwrap_err();
        assert_eq!(err.code(), "BAD_COLUMNS");
    }
}
