//! Blocking HTTP client for the messages endpoint.

use std::time::Instant;

use insight_fcst_core::{AnalysisContext, InsightError, TextGenerator};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{ReportConfig, API_KEY_VAR};
use crate::error::ReportError;
use crate::prompt::{build_prompt, MessagesRequest, MessagesResponse};

const API_VERSION: &str = "2023-06-01";

/// [`TextGenerator`] backed by the Anthropic messages API.
pub struct HttpTextGenerator {
    config: ReportConfig,
    agent: ureq::Agent,
}

impl HttpTextGenerator {
    pub fn new(config: ReportConfig) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(config.timeout).build();
        Self { config, agent }
    }

    /// Build a generator from the process environment.
    pub fn from_env() -> Result<Self, ReportError> {
        ReportConfig::from_env().map(Self::new)
    }

    /// Request a report for `context`.
    pub fn request_report(&self, context: &AnalysisContext) -> Result<String, ReportError> {
        let Some(api_key) = self.config.usable_key() else {
            let reason = if self.config.enabled {
                format!("{} is not set", API_KEY_VAR)
            } else {
                "report generation is disabled".to_string()
            };
            return Err(ReportError::NotConfigured(reason));
        };

        let request_id = Uuid::new_v4();
        let body = MessagesRequest::new(&self.config, build_prompt(context)?);
        let start = Instant::now();

        debug!(%request_id, model = %self.config.model, endpoint = %self.config.endpoint, "Sending report request");

        let response = self
            .agent
            .post(&self.config.endpoint)
            .set("x-api-key", api_key)
            .set("anthropic-version", API_VERSION)
            .set("content-type", "application/json")
            .send_json(&body)
            .map_err(|e| {
                let err = ReportError::from(e);
                warn!(%request_id, error = %err, elapsed_ms = start.elapsed().as_millis() as u64, "Report request failed");
                err
            })?;

        let status = response.status();
        let parsed: MessagesResponse = response
            .into_json()
            .map_err(|e| ReportError::InvalidResponse(e.to_string()))?;
        let text = parsed.into_text()?;

        info!(
            %request_id,
            status,
            chars = text.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Report generated"
        );
        Ok(text)
    }
}

impl TextGenerator for HttpTextGenerator {
    fn generate(&self, context: &AnalysisContext) -> insight_fcst_core::Result<String> {
        self.request_report(context).map_err(Into::into)
    }
}

/// Stand-in for an [`HttpTextGenerator`] whose configuration could not be
/// loaded. Every call fails with the load error, so the narrative degrades to
/// the key-figures report instead of aborting the analysis.
pub struct UnavailableGenerator {
    reason: String,
}

impl UnavailableGenerator {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl TextGenerator for UnavailableGenerator {
    fn generate(&self, _context: &AnalysisContext) -> insight_fcst_core::Result<String> {
        Err(InsightError::GeneratorError(self.reason.clone()))
    }
}
