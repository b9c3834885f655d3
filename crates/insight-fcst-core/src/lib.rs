//! Core of the insight-fcst forecast-and-diagnostics pipeline.
//!
//! This crate turns a CSV table into a canonical daily series, forecasts it
//! with a seasonal/trend model (falling back to a linear extrapolation),
//! derives descriptive summaries and renders them as narrative text.

pub mod analytics;
pub mod error;
pub mod fallback;
pub mod forecast;
pub mod narrative;
pub mod normalize;
pub mod orchestrator;
pub mod pipeline;
pub mod series;
pub mod stats;
pub mod table;

// Re-exports for convenience
pub use analytics::{
    compute_profile, compute_seasonality, compute_trend, summarize, summarize_forecast, BandPoint,
    Confidence, ForecastSynthesis, Profile, SeasonalitySummary, Strength, Summaries, TrendSummary,
};
pub use error::{InsightError, Result};
pub use fallback::{fit_fallback, forecast_fallback, FallbackFit};
#[cfg(feature = "primary-model")]
pub use forecast::MstlPrimary;
pub use forecast::{
    default_primary, future_dates, ForecastOutput, ForecastPoint, FutureDates, PrimaryModel,
};
pub use narrative::{
    render_narrative, render_narrative_with, AnalysisContext, Judgments, NarrationBeat, Narrative,
    ReportSource, TemplateReport, TextGenerator,
};
pub use normalize::{normalize, normalize_with_report, NormalizeReport};
pub use orchestrator::{
    forecast_series, run_forecast, run_forecast_with, select_forecast, Diagnostics,
    FallbackReason, ForecastConfig, ForecastOutcome, ForecastResult,
};
pub use pipeline::{analyze, Analysis};
pub use series::{Observation, TimeSeries};
pub use table::{preview, Table, TablePreview};
