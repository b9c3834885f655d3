//! Errors of the report generator.

use insight_fcst_core::InsightError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Report generator not configured: {0}")]
    NotConfigured(String),

    #[error("Invalid report configuration: {0}")]
    InvalidConfig(String),

    #[error("Report request failed with HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Report request failed: {0}")]
    Transport(String),

    #[error("Invalid report response: {0}")]
    InvalidResponse(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<ReportError> for InsightError {
    fn from(err: ReportError) -> Self {
        match err {
            ReportError::NotConfigured(detail) => InsightError::GeneratorNotConfigured(detail),
            other => InsightError::GeneratorError(other.to_string()),
        }
    }
}

impl From<ureq::Error> for ReportError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(status, response) => {
                let body = response
                    .into_string()
                    .unwrap_or_else(|e| format!("<unreadable body: {}>", e));
                ReportError::Status { status, body }
            }
            ureq::Error::Transport(transport) => ReportError::Transport(transport.to_string()),
        }
    }
}
