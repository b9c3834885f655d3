//! Narrative rendering of the analytical summaries.
//!
//! Everything here is deterministic except the extended report, which is
//! delegated to a [`TextGenerator`]. A failing generator is replaced by a
//! templated report; rendering itself never fails.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{info, warn};

use crate::analytics::{BandPoint, Confidence, Strength, Summaries};
use crate::error::{InsightError, Result};

/// |mean - median| / max(mean, 1) below this is a symmetric distribution.
pub const SYMMETRY_TOLERANCE: f64 = 0.1;
/// CV thresholds for the volatility judgment.
pub const STABLE_CV: f64 = 0.15;
pub const VOLATILE_CV: f64 = 0.3;
/// 3-month change in percent beyond which the trend has a direction.
pub const TREND_DIRECTION_PCT: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionShape {
    Symmetric,
    Skewed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Volatility {
    Stable,
    SomewhatVolatile,
    Volatile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Up,
    Down,
    Flat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Reliability {
    High,
    Moderate,
    Limited,
}

/// Qualitative judgments driving the narration beats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Judgments {
    pub distribution: DistributionShape,
    pub volatility: Volatility,
    pub seasonality: Strength,
    pub trend: TrendDirection,
    pub reliability: Reliability,
}

impl Judgments {
    pub fn from_summaries(s: &Summaries) -> Self {
        let mean = s.profile.mean.unwrap_or(0.0);
        let median = s.profile.median.unwrap_or(0.0);
        let distribution = if (mean - median).abs() / mean.max(1.0) < SYMMETRY_TOLERANCE {
            DistributionShape::Symmetric
        } else {
            DistributionShape::Skewed
        };

        let cv = s.profile.cv.unwrap_or(0.0);
        let volatility = if cv < STABLE_CV {
            Volatility::Stable
        } else if cv < VOLATILE_CV {
            Volatility::SomewhatVolatile
        } else {
            Volatility::Volatile
        };

        let delta = s.trend.delta_3mo_pct.unwrap_or(0.0);
        let trend = if delta > TREND_DIRECTION_PCT {
            TrendDirection::Up
        } else if delta < -TREND_DIRECTION_PCT {
            TrendDirection::Down
        } else {
            TrendDirection::Flat
        };

        let reliability = match s.forecast_synthesis.confidence {
            Confidence::High => Reliability::High,
            Confidence::Medium => Reliability::Moderate,
            Confidence::Low | Confidence::Unknown => Reliability::Limited,
        };

        Self {
            distribution,
            volatility,
            seasonality: s.seasonality.weekly_strength,
            trend,
            reliability,
        }
    }
}

/// One step of the guided narration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NarrationBeat {
    pub id: &'static str,
    pub text: String,
    /// Metric keys to highlight, see [`narration_targets`]
    pub highlight: Vec<&'static str>,
    /// Dwell duration in milliseconds
    pub wait_ms: u32,
}

/// Metric keys that can be highlighted by a narration beat.
pub const METRIC_KEYS: &[&str] = &[
    "profile.rows",
    "profile.range",
    "profile.mean",
    "profile.median",
    "profile.std",
    "profile.cv",
    "seasonality.weekly_strength",
    "seasonality.weekend_delta_pct",
    "trend.slope_30d",
    "trend.delta_3mo_pct",
    "forecast.p50_5",
    "forecast.p50_30",
    "forecast.delta_30_pct",
    "forecast.confidence",
    "forecast.band_ratio",
];

/// Map from metric key to the UI selectors displaying it.
pub fn narration_targets() -> BTreeMap<String, Vec<String>> {
    METRIC_KEYS
        .iter()
        .map(|key| (key.to_string(), vec![format!("[data-metric='{}']", key)]))
        .collect()
}

/// Structured context handed to a [`TextGenerator`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisContext {
    pub data_profile: DataProfileContext,
    pub trend_analysis: TrendContext,
    pub seasonality_analysis: SeasonalityContext,
    pub forecast_results: ForecastContext,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataProfileContext {
    pub rows: usize,
    pub date_range: String,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub std: f64,
    pub cv: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub outliers: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendContext {
    pub slope_30d: f64,
    pub delta_3mo_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonalityContext {
    pub weekly_strength: Strength,
    pub weekend_delta_pct: Option<f64>,
    pub acf7: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastContext {
    pub horizon_days: usize,
    pub p50_5: Option<f64>,
    pub p50_horizon: Option<f64>,
    pub delta_horizon_pct: Option<f64>,
    pub confidence: Confidence,
    pub band_ratio: Option<f64>,
}

fn date_range(s: &Summaries) -> String {
    match (s.profile.date_min, s.profile.date_max) {
        (Some(lo), Some(hi)) => format!("{} ~ {}", lo, hi),
        _ => "-".to_string(),
    }
}

impl AnalysisContext {
    pub fn from_summaries(s: &Summaries) -> Self {
        let p = &s.profile;
        let f = &s.forecast_synthesis;
        Self {
            data_profile: DataProfileContext {
                rows: p.rows,
                date_range: date_range(s),
                mean: p.mean,
                median: p.median,
                std: p.std,
                cv: p.cv,
                min: p.min,
                max: p.max,
                outliers: p.outliers,
            },
            trend_analysis: TrendContext {
                slope_30d: s.trend.slope_30d,
                delta_3mo_pct: s.trend.delta_3mo_pct,
            },
            seasonality_analysis: SeasonalityContext {
                weekly_strength: s.seasonality.weekly_strength,
                weekend_delta_pct: s.seasonality.weekend_delta_pct,
                acf7: s.seasonality.acf7,
            },
            forecast_results: ForecastContext {
                horizon_days: f.horizon_days,
                p50_5: f.near.map(|b| b.point),
                p50_horizon: f.horizon.map(|b| b.point),
                delta_horizon_pct: f.delta_pct,
                confidence: f.confidence,
                band_ratio: f.band_ratio,
            },
        }
    }
}

/// External text generation collaborator for the extended report.
pub trait TextGenerator {
    /// Generate a markdown report for `context`.
    ///
    /// Return [`InsightError::GeneratorNotConfigured`] when the generator
    /// cannot be used at all, any other error when a call failed.
    fn generate(&self, context: &AnalysisContext) -> Result<String>;

    /// Source recorded for a successful [`TextGenerator::generate`].
    fn source(&self) -> ReportSource {
        ReportSource::Generated
    }
}

/// Deterministic markdown report built from the context alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateReport;

impl TextGenerator for TemplateReport {
    fn generate(&self, context: &AnalysisContext) -> Result<String> {
        Ok(template_report(context))
    }

    fn source(&self) -> ReportSource {
        ReportSource::Template
    }
}

/// Where the extended report came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportSource {
    /// Produced by an external generator
    Generated,
    /// Deterministic template, no generator requested
    Template,
    NotConfigured,
    Failed { detail: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Narrative {
    pub business_text: String,
    pub technical_text: String,
    pub judgments: Judgments,
    pub narration_beats: Vec<NarrationBeat>,
    pub targets: BTreeMap<String, Vec<String>>,
    pub extended_report: String,
    pub report_source: ReportSource,
}

fn num(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) => format!("{:.*}", decimals, v),
        None => "-".to_string(),
    }
}

fn signed(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) => format!("{:+.*}%", decimals, v),
        None => "-".to_string(),
    }
}

fn band(b: Option<BandPoint>) -> String {
    match b {
        Some(b) => format!("{:.2} ({:.2} to {:.2})", b.point, b.lower, b.upper),
        None => "-".to_string(),
    }
}

/// Business-tone text, one paragraph per topic.
pub fn business_text(s: &Summaries) -> String {
    let p = &s.profile;
    let f = &s.forecast_synthesis;
    [
        format!("Data overview: {} ({} rows).", date_range(s), p.rows),
        format!(
            "Mean {}, median {}, min {}, max {}. Standard deviation {:.2}, coefficient of variation {}.",
            num(p.mean, 2),
            num(p.median, 2),
            num(p.min, 2),
            num(p.max, 2),
            p.std,
            num(p.cv, 2)
        ),
        format!(
            "{} missing, {} duplicate and {} outlier rows.",
            p.missing, p.duplicates, p.outliers
        ),
        format!(
            "Weekly seasonality is {}; weekends differ from weekdays by {}.",
            s.seasonality.weekly_strength,
            signed(s.seasonality.weekend_delta_pct, 1)
        ),
        format!(
            "The slope over the last 30 points is {:.4}; the change over the last 3 months is {}.",
            s.trend.slope_30d,
            signed(s.trend.delta_3mo_pct, 1)
        ),
        format!(
            "The 5-day forecast median is {}. The {}-day forecast is {}, {} vs the latest value.",
            band(f.near),
            f.horizon_days,
            band(f.horizon),
            signed(f.delta_pct, 1)
        ),
        format!(
            "Confidence is {} (band ratio {}).",
            f.confidence,
            num(f.band_ratio, 3)
        ),
    ]
    .join("\n\n")
}

/// Technical-tone text with raw figures.
pub fn technical_text(s: &Summaries) -> String {
    let p = &s.profile;
    let f = &s.forecast_synthesis;
    [
        format!(
            "stats: mean={}, median={}, std={:.3}, cv={}",
            num(p.mean, 3),
            num(p.median, 3),
            p.std,
            num(p.cv, 3)
        ),
        format!(
            "seasonality: acf7={}, weekend_delta_pct={}",
            num(s.seasonality.acf7, 3),
            num(s.seasonality.weekend_delta_pct, 2)
        ),
        format!(
            "trend: slope_30d={:.6}, delta_3mo_pct={}",
            s.trend.slope_30d,
            num(s.trend.delta_3mo_pct, 3)
        ),
        format!(
            "forecast: p50_5={}, p50_{}={}, band_ratio={}, confidence={}",
            num(f.near.map(|b| b.point), 4),
            f.horizon_days,
            num(f.horizon.map(|b| b.point), 4),
            num(f.band_ratio, 4),
            f.confidence
        ),
    ]
    .join("\n\n")
}

/// Guided narration: eight beats in a fixed order.
pub fn narration_beats(s: &Summaries, j: &Judgments) -> Vec<NarrationBeat> {
    let p = &s.profile;
    let f = &s.forecast_synthesis;

    let distribution = match j.distribution {
        DistributionShape::Symmetric => "a fairly symmetric distribution",
        DistributionShape::Skewed => "a somewhat skewed distribution",
    };
    let volatility = match j.volatility {
        Volatility::Stable => "stable",
        Volatility::SomewhatVolatile => "somewhat volatile",
        Volatility::Volatile => "volatile",
    };
    let weekend = s.seasonality.weekend_delta_pct.unwrap_or(0.0);
    let seasonality = match j.seasonality {
        Strength::Strong => format!("a clear weekly pattern (weekend {:+.1}%)", weekend),
        Strength::Medium => format!("some weekly variation ({:+.1}%)", weekend),
        Strength::Weak | Strength::Unknown => "limited seasonality".to_string(),
    };
    let trend = match j.trend {
        TrendDirection::Up => "upward",
        TrendDirection::Down => "downward",
        TrendDirection::Flat => "flat",
    };
    let reliability = match j.reliability {
        Reliability::High => "high precision",
        Reliability::Moderate => "moderate precision",
        Reliability::Limited => "limited precision",
    };

    vec![
        NarrationBeat {
            id: "opening",
            text: format!(
                "The analysis is complete. It covers {} rows from {}. Let's start with the big picture.",
                p.rows,
                date_range(s)
            ),
            highlight: vec!["profile.rows"],
            wait_ms: 4000,
        },
        NarrationBeat {
            id: "data_overview",
            text: format!(
                "The mean is {} and the median {}, which indicates {}.",
                num(p.mean, 1),
                num(p.median, 1),
                distribution
            ),
            highlight: vec!["profile.mean", "profile.median"],
            wait_ms: 4500,
        },
        NarrationBeat {
            id: "variation_analysis",
            text: format!(
                "The coefficient of variation is {}, so the data is {}. This affects how far the forecast can be trusted.",
                num(p.cv, 2),
                volatility
            ),
            highlight: vec!["profile.cv"],
            wait_ms: 5000,
        },
        NarrationBeat {
            id: "seasonality_analysis",
            text: format!(
                "The pattern analysis shows {}, an important input for the forecasting model.",
                seasonality
            ),
            highlight: vec!["seasonality.weekly_strength"],
            wait_ms: 5500,
        },
        NarrationBeat {
            id: "trend_analysis",
            text: format!(
                "The longer-term trend is {}, with a {} change over the last 3 months.",
                trend,
                signed(s.trend.delta_3mo_pct, 1)
            ),
            highlight: vec!["trend.delta_3mo_pct"],
            wait_ms: 4500,
        },
        NarrationBeat {
            id: "forecast_results",
            text: format!(
                "The {}-day forecast median is {}, a {} change from the latest value.",
                f.horizon_days,
                num(f.horizon.map(|b| b.point), 1),
                signed(f.delta_pct, 1)
            ),
            highlight: vec!["forecast.p50_30", "forecast.delta_30_pct"],
            wait_ms: 6000,
        },
        NarrationBeat {
            id: "reliability_assessment",
            text: format!(
                "This forecast comes with {} and can serve as a practical outlook.",
                reliability
            ),
            highlight: vec!["forecast.confidence"],
            wait_ms: 5000,
        },
        NarrationBeat {
            id: "conclusion",
            text: "That concludes the walkthrough. See the detailed report for more.".to_string(),
            highlight: Vec::new(),
            wait_ms: 5500,
        },
    ]
}

fn template_report(c: &AnalysisContext) -> String {
    let p = &c.data_profile;
    let f = &c.forecast_results;
    format!(
        "# Data analysis report\n\n\
         ## Executive summary\n\n\
         Analyzed {rows} rows covering {range}.\n\n\
         ## Key figures\n\n\
         - **Mean**: {mean}\n\
         - **Median**: {median}\n\
         - **Standard deviation**: {std:.2}\n\
         - **Coefficient of variation**: {cv}\n\n\
         ## Forecast\n\n\
         The {h}-day forecast is {p50}, a {delta} change from the latest value.\n\n\
         Forecast confidence is {conf}.\n",
        rows = p.rows,
        range = p.date_range,
        mean = num(p.mean, 2),
        median = num(p.median, 2),
        std = p.std,
        cv = num(p.cv, 3),
        h = f.horizon_days,
        p50 = num(f.p50_horizon, 2),
        delta = signed(f.delta_horizon_pct, 1),
        conf = f.confidence,
    )
}

/// Substitute report when no generator is configured.
pub fn not_configured_report(c: &AnalysisContext) -> String {
    format!(
        "# Data analysis report\n\n\
         ## Notice\n\n\
         A detailed AI-generated report requires the `ANTHROPIC_API_KEY` environment variable.\n\
         Only the basic analysis is shown.\n\n\
         ### Setup\n\n\
         ```bash\nexport ANTHROPIC_API_KEY=your_api_key_here\n```\n\n\
         ## Basic results\n\n\
         - Rows: {}\n\
         - Period: {}\n\
         - {}-day forecast: {} expected change\n",
        c.data_profile.rows,
        c.data_profile.date_range,
        c.forecast_results.horizon_days,
        signed(c.forecast_results.delta_horizon_pct, 1)
    )
}

/// Substitute report when the generator failed.
pub fn failed_report(c: &AnalysisContext) -> String {
    format!(
        "{}\n## Notice\n\n\
         The report generator is currently unavailable, so a simplified report is shown.\n",
        template_report(c)
    )
}

/// Run `generator`, substituting a templated report on any failure.
pub fn extended_report(
    context: &AnalysisContext,
    generator: &dyn TextGenerator,
) -> (String, ReportSource) {
    match generator.generate(context) {
        Ok(text) => {
            let source = generator.source();
            info!(chars = text.len(), ?source, "Extended report rendered");
            (text, source)
        }
        Err(InsightError::GeneratorNotConfigured(detail)) => {
            info!(%detail, "Report generator not configured, using template");
            (not_configured_report(context), ReportSource::NotConfigured)
        }
        Err(e) => {
            warn!(error = %e, "Report generation failed, using template");
            (
                failed_report(context),
                ReportSource::Failed {
                    detail: e.to_string(),
                },
            )
        }
    }
}

/// Render the narrative with the deterministic template report.
pub fn render_narrative(summaries: &Summaries) -> Narrative {
    render_narrative_with(summaries, &TemplateReport)
}

/// Render the narrative, delegating the extended report to `generator`.
pub fn render_narrative_with(summaries: &Summaries, generator: &dyn TextGenerator) -> Narrative {
    let judgments = Judgments::from_summaries(summaries);
    let context = AnalysisContext::from_summaries(summaries);
    let (extended_report, report_source) = extended_report(&context, generator);

    Narrative {
        business_text: business_text(summaries),
        technical_text: technical_text(summaries),
        narration_beats: narration_beats(summaries, &judgments),
        judgments,
        targets: narration_targets(),
        extended_report,
        report_source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::{summarize, ForecastSynthesis, Profile, SeasonalitySummary, TrendSummary};
    use crate::orchestrator::{forecast_series, ForecastConfig};
    use crate::normalize::NormalizeReport;
    use crate::series::TimeSeries;
    use chrono::NaiveDate;

    fn summaries() -> Summaries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let pairs = start
            .iter_days()
            .take(90)
            .enumerate()
            .map(|(i, d)| (d, 100.0 + i as f64 * 0.5))
            .collect();
        let series = TimeSeries::from_pairs(pairs).unwrap();
        let result = forecast_series(
            &series,
            &NormalizeReport::default(),
            &ForecastConfig::default(),
            None,
        )
        .unwrap();
        summarize(&series, &result)
    }

    fn empty_summaries() -> Summaries {
        Summaries {
            profile: Profile {
                rows: 0,
                date_min: None,
                date_max: None,
                mean: None,
                median: None,
                min: None,
                max: None,
                std: 0.0,
                cv: None,
                outliers: 0,
                missing: 0,
                duplicates: 0,
            },
            trend: TrendSummary {
                slope_30d: 0.0,
                delta_3mo_pct: None,
                changepoints: Vec::new(),
            },
            seasonality: SeasonalitySummary {
                weekly_strength: Strength::Unknown,
                weekend_delta_pct: None,
                acf7: None,
            },
            forecast_synthesis: ForecastSynthesis {
                horizon_days: 30,
                near: None,
                horizon: None,
                delta_pct: None,
                band_ratio: None,
                confidence: Confidence::Unknown,
            },
        }
    }

    struct Unconfigured;

    impl TextGenerator for Unconfigured {
        fn generate(&self, _context: &AnalysisContext) -> Result<String> {
            Err(InsightError::GeneratorNotConfigured("no key".into()))
        }
    }

    struct Broken;

    impl TextGenerator for Broken {
        fn generate(&self, _context: &AnalysisContext) -> Result<String> {
            Err(InsightError::GeneratorError("timeout".into()))
        }
    }

    struct Echo;

    impl TextGenerator for Echo {
        fn generate(&self, context: &AnalysisContext) -> Result<String> {
            Ok(format!("rows={}", context.data_profile.rows))
        }
    }

    #[test]
    fn test_judgments() {
        let s = summaries();
        let j = Judgments::from_summaries(&s);
        assert_eq!(j.distribution, DistributionShape::Symmetric);
        assert_eq!(j.volatility, Volatility::Stable);
        assert_eq!(j.trend, TrendDirection::Up);
        assert_eq!(j.seasonality, s.seasonality.weekly_strength);
    }

    fn judge(edit: impl FnOnce(&mut Summaries)) -> Judgments {
        let mut s = empty_summaries();
        edit(&mut s);
        Judgments::from_summaries(&s)
    }

    #[test]
    fn test_judgment_thresholds() {
        assert_eq!(judge(|s| s.profile.cv = Some(0.149)).volatility, Volatility::Stable);
        assert_eq!(
            judge(|s| s.profile.cv = Some(STABLE_CV)).volatility,
            Volatility::SomewhatVolatile
        );
        assert_eq!(judge(|s| s.profile.cv = Some(VOLATILE_CV)).volatility, Volatility::Volatile);

        let skewed = judge(|s| {
            s.profile.mean = Some(100.0);
            s.profile.median = Some(80.0);
        });
        assert_eq!(skewed.distribution, DistributionShape::Skewed);

        assert_eq!(judge(|s| s.trend.delta_3mo_pct = Some(-2.5)).trend, TrendDirection::Down);
        assert_eq!(judge(|s| s.trend.delta_3mo_pct = Some(2.0)).trend, TrendDirection::Flat);
        assert_eq!(judge(|s| s.trend.delta_3mo_pct = Some(-2.0)).trend, TrendDirection::Flat);

        let reliability = |c: Confidence| judge(|s| s.forecast_synthesis.confidence = c).reliability;
        assert_eq!(reliability(Confidence::High), Reliability::High);
        assert_eq!(reliability(Confidence::Medium), Reliability::Moderate);
        assert_eq!(reliability(Confidence::Low), Reliability::Limited);
    }

    #[test]
    fn test_weekend_drop_keeps_its_sign() {
        let mut s = empty_summaries();
        s.seasonality.weekly_strength = Strength::Strong;
        s.seasonality.weekend_delta_pct = Some(-20.0);
        let beats = narration_beats(&s, &Judgments::from_summaries(&s));
        let beat = beats
            .iter()
            .find(|b| b.id == "seasonality_analysis")
            .unwrap();
        assert!(beat.text.contains("-20.0%"), "{}", beat.text);
        assert!(!beat.text.contains("+20.0%"));

        s.seasonality.weekly_strength = Strength::Medium;
        s.seasonality.weekend_delta_pct = Some(12.5);
        let beats = narration_beats(&s, &Judgments::from_summaries(&s));
        assert!(beats[3].text.contains("+12.5%"));
    }

    #[test]
    fn test_beats_order_and_durations() {
        let s = summaries();
        let beats = narration_beats(&s, &Judgments::from_summaries(&s));
        let ids: Vec<&str> = beats.iter().map(|b| b.id).collect();
        assert_eq!(
            ids,
            vec![
                "opening",
                "data_overview",
                "variation_analysis",
                "seasonality_analysis",
                "trend_analysis",
                "forecast_results",
                "reliability_assessment",
                "conclusion"
            ]
        );
        let waits: Vec<u32> = beats.iter().map(|b| b.wait_ms).collect();
        assert_eq!(waits, vec![4000, 4500, 5000, 5500, 4500, 6000, 5000, 5500]);
    }

    #[test]
    fn test_highlights_are_known_targets() {
        let s = summaries();
        let targets = narration_targets();
        assert_eq!(targets.len(), METRIC_KEYS.len());
        for beat in narration_beats(&s, &Judgments::from_summaries(&s)) {
            for key in beat.highlight {
                assert!(targets.contains_key(key), "unknown metric {}", key);
            }
        }
        assert_eq!(targets["profile.mean"], vec!["[data-metric='profile.mean']"]);
    }

    #[test]
    fn test_text_uses_summary_labels() {
        let s = summaries();
        let business = business_text(&s);
        assert!(business.contains(&format!("Confidence is {}", s.forecast_synthesis.confidence)));
        assert!(business.contains("90 rows"));
        let technical = technical_text(&s);
        assert!(technical.contains(&format!("confidence={}", s.forecast_synthesis.confidence)));
        assert_eq!(technical.split("\n\n").count(), 4);
    }

    #[test]
    fn test_degenerate_summaries_render() {
        let n = render_narrative(&empty_summaries());
        assert!(n.business_text.contains("0 rows"));
        assert_eq!(n.narration_beats.len(), 8);
        assert_eq!(n.judgments.reliability, Reliability::Limited);
    }

    #[test]
    fn test_generator_outcomes() {
        let s = summaries();

        let n = render_narrative_with(&s, &Echo);
        assert_eq!(n.extended_report, "rows=90");
        assert_eq!(n.report_source, ReportSource::Generated);

        let n = render_narrative_with(&s, &TemplateReport);
        assert_eq!(n.report_source, ReportSource::Template);
        assert!(n.extended_report.starts_with("# Data analysis report"));

        let n = render_narrative_with(&s, &Unconfigured);
        assert_eq!(n.report_source, ReportSource::NotConfigured);
        assert!(n.extended_report.contains("ANTHROPIC_API_KEY"));

        let n = render_narrative_with(&s, &Broken);
        assert!(matches!(n.report_source, ReportSource::Failed { .. }));
        assert!(n.extended_report.contains("simplified report"));
        assert!(n.extended_report.contains("Key figures"));
    }

    #[test]
    fn test_context_serializes_with_expected_keys() {
        let context = AnalysisContext::from_summaries(&summaries());
        let json = serde_json::to_value(&context).unwrap();
        for key in ["data_profile", "trend_analysis", "seasonality_analysis", "forecast_results"] {
            assert!(json.get(key).is_some(), "missing {}", key);
        }
        assert_eq!(json["data_profile"]["rows"], 90);
    }
}
