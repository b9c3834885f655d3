//! End-to-end analysis: normalize, forecast, summarize and narrate in one call.

use serde::Serialize;
use tracing::info;

use crate::analytics::{summarize, Summaries};
use crate::error::Result;
use crate::forecast::PrimaryModel;
use crate::narrative::{render_narrative_with, Narrative, TextGenerator};
use crate::normalize::normalize_with_report;
use crate::orchestrator::{forecast_series, ForecastConfig, ForecastResult};
use crate::table::Table;

/// Everything produced for one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub forecast: ForecastResult,
    pub summaries: Summaries,
    pub narrative: Narrative,
}

/// Run the whole pipeline on `table`.
///
/// Fails only for input errors; model and generator failures degrade.
pub fn analyze(
    table: &Table,
    date_col: &str,
    value_col: &str,
    config: &ForecastConfig,
    primary: Option<&dyn PrimaryModel>,
    generator: &dyn TextGenerator,
) -> Result<Analysis> {
    config.validate()?;
    let (series, report) = normalize_with_report(table, date_col, value_col)?;
    info!(
        input_rows = report.input_rows,
        rows = series.len(),
        dropped = report.dropped,
        deduped = report.deduped,
        "Normalized input"
    );

    let forecast = forecast_series(&series, &report, config, primary)?;
    let summaries = summarize(&series, &forecast);
    let narrative = render_narrative_with(&summaries, generator);

    Ok(Analysis {
        forecast,
        summaries,
        narrative,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::Confidence;
    use crate::narrative::{ReportSource, TemplateReport};

    #[test]
    fn test_analyze_weekly_gap_example() {
        let table =
            Table::from_csv_str("date,value\n2024-01-01,100\n2024-01-02,100\n2024-01-08,100\n")
                .unwrap();
        let analysis = analyze(
            &table,
            "date",
            "value",
            &ForecastConfig::with_horizon(5),
            None,
            &TemplateReport,
        )
        .unwrap();

        assert_eq!(analysis.forecast.forecast.len(), 5);
        assert_eq!(analysis.summaries.trend.slope_30d, 0.0);
        assert_eq!(
            analysis.summaries.forecast_synthesis.confidence,
            Confidence::High
        );
        assert_eq!(analysis.narrative.report_source, ReportSource::Template);
    }

    #[test]
    fn test_analyze_rejects_bad_columns() {
        let table = Table::from_csv_str("date,value\n2024-01-01,1\n").unwrap();
        let err = analyze(
            &table,
            "ds",
            "value",
            &ForecastConfig::default(),
            None,
            &TemplateReport,
        )
        .unwrap_err();
        assert_eq!(err.code(), "BAD_COLUMNS");
    }
}
