//! # insight-fcst
//!
//! Command-line front end: analyze a CSV time series and print the result as JSON.

mod error;

use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use insight_fcst_core::{
    analyze, default_primary, preview, ForecastConfig, FutureDates, Table, TemplateReport,
    TextGenerator,
};
use insight_fcst_report::{HttpTextGenerator, UnavailableGenerator};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::{CliError, Result};

#[derive(Parser)]
#[command(name = "insight-fcst")]
#[command(about = "Time series forecast and diagnostics from CSV", long_about = None)]
struct Cli {
    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Forecast a series and print the full analysis
    Forecast {
        /// Input CSV file with a header row
        #[arg(short, long)]
        input: PathBuf,

        /// Name of the date column
        #[arg(short, long, default_value = "date")]
        date_col: String,

        /// Name of the value column
        #[arg(short, long, default_value = "value")]
        value_col: String,

        /// Number of days to forecast
        #[arg(long, default_value = "30")]
        horizon: usize,

        /// Future date layout: calendar or business
        #[arg(long, default_value = "calendar")]
        future_dates: FutureDates,

        /// Request the extended report from the external generator
        #[arg(long)]
        report: bool,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the columns and first rows of a CSV file
    Preview {
        /// Input CSV file with a header row
        #[arg(short, long)]
        input: PathBuf,

        /// Number of rows to show
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },
}

fn load_table(path: &Path) -> Result<Table> {
    if !path.is_file() {
        return Err(CliError::FileNotFound(path.to_path_buf()));
    }
    let file = File::open(path)?;
    Ok(Table::from_csv_reader(BufReader::new(file))?)
}

fn write_json<T: Serialize>(value: &T, pretty: bool, output: Option<&Path>) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    match output {
        Some(path) => std::fs::write(path, json + "\n")?,
        None => writeln!(io::stdout().lock(), "{}", json)?,
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_forecast(
    input: &Path,
    date_col: &str,
    value_col: &str,
    horizon: usize,
    future_dates: FutureDates,
    report: bool,
    output: Option<&Path>,
    pretty: bool,
) -> Result<()> {
    let table = load_table(input)?;
    let config = ForecastConfig {
        horizon_days: horizon,
        future_dates,
    };

    let generator: Box<dyn TextGenerator> = if report {
        match HttpTextGenerator::from_env() {
            Ok(http) => Box::new(http),
            Err(e) => {
                warn!(error = %e, "Report generator configuration invalid");
                Box::new(UnavailableGenerator::new(e.to_string()))
            }
        }
    } else {
        Box::new(TemplateReport)
    };

    let primary = default_primary();
    info!(input = %input.display(), horizon, report, "Running analysis");
    let analysis = analyze(
        &table,
        date_col,
        value_col,
        &config,
        primary.as_deref(),
        generator.as_ref(),
    )?;
    write_json(&analysis, pretty, output)
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "insight_fcst_core=info,insight_fcst_report=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Forecast {
            input,
            date_col,
            value_col,
            horizon,
            future_dates,
            report,
            output,
        } => run_forecast(
            &input,
            &date_col,
            &value_col,
            horizon,
            future_dates,
            report,
            output.as_deref(),
            cli.pretty,
        ),
        Commands::Preview { input, limit } => {
            load_table(&input).and_then(|t| write_json(&preview(&t, limit), cli.pretty, None))
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            e.exit_code()
        }
    }
}
