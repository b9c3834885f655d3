//! Report generator configuration.
//!
//! Read from the environment:
//! - `ANTHROPIC_API_KEY`: API key; without it the generator is not configured
//! - `INSIGHT_REPORT_MODEL`: model name
//! - `INSIGHT_REPORT_ENDPOINT`: messages endpoint URL
//! - `INSIGHT_REPORT_TIMEOUT_SECS`: request timeout
//! - `INSIGHT_REPORT_MAX_TOKENS`: response token limit
//! - `INSIGHT_DISABLE_REPORT`: disables the generator when set
//!
//! The generator is also disabled in CI environments (detected via common CI
//! environment variables like CI, GITHUB_ACTIONS, GITLAB_CI, etc.).

use std::env;
use std::time::Duration;

use crate::error::ReportError;

pub const DEFAULT_ENDPOINT: &str = "https://api.anthropic.com/v1/messages";
pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";
pub const DEFAULT_MAX_TOKENS: u32 = 4000;
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

pub const API_KEY_VAR: &str = "ANTHROPIC_API_KEY";
pub const MODEL_VAR: &str = "INSIGHT_REPORT_MODEL";
pub const ENDPOINT_VAR: &str = "INSIGHT_REPORT_ENDPOINT";
pub const TIMEOUT_VAR: &str = "INSIGHT_REPORT_TIMEOUT_SECS";
pub const MAX_TOKENS_VAR: &str = "INSIGHT_REPORT_MAX_TOKENS";
pub const DISABLE_VAR: &str = "INSIGHT_DISABLE_REPORT";

/// Variables whose presence, even empty, marks a CI runner.
pub const CI_ENV_VARS: &[&str] = &[
    "CI",
    "GITHUB_ACTIONS",
    "GITLAB_CI",
    "CIRCLECI",
    "TRAVIS",
    "JENKINS_URL",
    "BUILDKITE",
    "TEAMCITY_VERSION",
    "TF_BUILD",
    "CODEBUILD_BUILD_ID",
];

/// Whether any of [`CI_ENV_VARS`] is set. [`ReportConfig::from_env`] turns
/// the external generator off in that case.
pub fn is_ci_environment() -> bool {
    CI_ENV_VARS.iter().any(|var| env::var_os(var).is_some())
}

/// Settings of the external report generator.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
    pub timeout: Duration,
    pub max_tokens: u32,
    pub temperature: f64,
    /// False when disabled explicitly or by CI detection
    pub enabled: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            enabled: true,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, raw: String) -> Result<T, ReportError> {
    raw.trim()
        .parse()
        .map_err(|_| ReportError::InvalidConfig(format!("{}='{}' is not a valid number", name, raw)))
}

impl ReportConfig {
    /// Build the configuration from the process environment.
    pub fn from_env() -> Result<Self, ReportError> {
        let mut config = Self::from_lookup(|name| env::var(name).ok())?;
        if is_ci_environment() {
            config.enabled = false;
        }
        Ok(config)
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ReportError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self {
            api_key: lookup(API_KEY_VAR).filter(|k| !k.trim().is_empty()),
            ..Default::default()
        };

        if let Some(model) = lookup(MODEL_VAR).filter(|m| !m.is_empty()) {
            config.model = model;
        }
        if let Some(endpoint) = lookup(ENDPOINT_VAR).filter(|e| !e.is_empty()) {
            config.endpoint = endpoint;
        }
        if let Some(raw) = lookup(TIMEOUT_VAR) {
            config.timeout = Duration::from_secs(parse_var(TIMEOUT_VAR, raw)?);
        }
        if let Some(raw) = lookup(MAX_TOKENS_VAR) {
            config.max_tokens = parse_var(MAX_TOKENS_VAR, raw)?;
        }
        if lookup(DISABLE_VAR).is_some() {
            config.enabled = false;
        }
        Ok(config)
    }

    /// API key, if the generator is enabled and has one.
    pub fn usable_key(&self) -> Option<&str> {
        if self.enabled {
            self.api_key.as_deref()
        } else {
            None
        }
    }
}
