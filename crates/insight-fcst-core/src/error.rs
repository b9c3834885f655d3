//! Error types for the forecast-and-diagnostics pipeline.

use thiserror::Error;

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, InsightError>;

/// Error types for pipeline operations.
///
/// Only the input-error variants ever reach the caller of `run_forecast`;
/// model and generator failures are recovered inside the pipeline.
#[derive(Error, Debug)]
pub enum InsightError {
    #[error("Column not found: '{column}' (available: {})", available.join(", "))]
    ColumnNotFound {
        column: String,
        available: Vec<String>,
    },

    #[error("Invalid CSV: {0}")]
    InvalidCsv(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid parameter '{param}' = '{value}': {reason}")]
    InvalidParameter {
        param: String,
        value: String,
        reason: String,
    },

    #[error("Computation error: {0}")]
    ComputationError(String),

    #[error("Model error: {0}")]
    ModelError(String),

    #[error("Text generator not configured: {0}")]
    GeneratorNotConfigured(String),

    #[error("Text generator error: {0}")]
    GeneratorError(String),
}

impl InsightError {
    /// Stable error code for the hosting request layer.
    pub fn code(&self) -> &'static str {
        match self {
            InsightError::ColumnNotFound { .. } => "BAD_COLUMNS",
            InsightError::InvalidCsv(_) => "INVALID_CSV",
            InsightError::InvalidInput(_) => "INVALID_INPUT",
            InsightError::InvalidParameter { .. } => "INVALID_PARAMETER",
            InsightError::ComputationError(_) => "COMPUTATION_ERROR",
            InsightError::ModelError(_) => "MODEL_ERROR",
            InsightError::GeneratorNotConfigured(_) => "GENERATOR_NOT_CONFIGURED",
            InsightError::GeneratorError(_) => "GENERATOR_ERROR",
        }
    }

    /// Whether the error was caused by the request itself (never retried).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            InsightError::ColumnNotFound { .. }
                | InsightError::InvalidCsv(_)
                | InsightError::InvalidInput(_)
                | InsightError::InvalidParameter { .. }
        )
    }
}

impl From<csv::Error> for InsightError {
    fn from(err: csv::Error) -> Self {
        InsightError::InvalidCsv(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_conversion() {
        assert_eq!(
            InsightError::ColumnNotFound {
                column: "close".into(),
                available: vec![]
            }
            .code(),
            "BAD_COLUMNS"
        );
        assert_eq!(InsightError::InvalidCsv("x".into()).code(), "INVALID_CSV");
        assert_eq!(InsightError::ModelError("x".into()).code(), "MODEL_ERROR");
        assert_eq!(
            InsightError::GeneratorError("x".into()).code(),
            "GENERATOR_ERROR"
        );
    }

    #[test]
    fn test_error_display() {
        let err = InsightError::ColumnNotFound {
            column: "close".into(),
            available: vec!["date".into(), "open".into()],
        };
        assert_eq!(
            format!("{}", err),
            "Column not found: 'close' (available: date, open)"
        );

        let err = InsightError::InvalidParameter {
            param: "horizon_days".into(),
            value: "0".into(),
            reason: "must be positive".into(),
        };
        assert_eq!(
            format!("{}", err),
            "Invalid parameter 'horizon_days' = '0': must be positive"
        );
    }

    #[test]
    fn test_client_error_classification() {
        assert!(InsightError::InvalidCsv("bad".into()).is_client_error());
        assert!(InsightError::ColumnNotFound {
            column: "y".into(),
            available: vec![]
        }
        .is_client_error());
        assert!(!InsightError::ModelError("fit".into()).is_client_error());
        assert!(!InsightError::GeneratorNotConfigured("key".into()).is_client_error());
    }
}
