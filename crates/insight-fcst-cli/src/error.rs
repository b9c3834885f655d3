//! Error types for the CLI.

use std::path::PathBuf;
use std::process::ExitCode;

use insight_fcst_core::InsightError;
use thiserror::Error;

pub(crate) type Result<T> = std::result::Result<T, CliError>;

#[derive(Error, Debug)]
pub(crate) enum CliError {
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Pipeline(#[from] InsightError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    pub(crate) fn exit_code(&self) -> ExitCode {
        match self {
            Self::FileNotFound(_) => ExitCode::from(3),
            Self::Pipeline(e) if e.is_client_error() => ExitCode::from(4),
            Self::Pipeline(_) => ExitCode::from(1),
            Self::Io(_) | Self::Json(_) => ExitCode::from(7),
        }
    }
}
