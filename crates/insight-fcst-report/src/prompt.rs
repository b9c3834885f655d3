//! Prompt construction and the messages API wire types.

use insight_fcst_core::AnalysisContext;
use serde::{Deserialize, Serialize};

use crate::config::ReportConfig;
use crate::error::ReportError;

/// Sections the generated report must contain, in order.
pub const REPORT_SECTIONS: &[&str] = &[
    "Executive summary",
    "Data characteristics",
    "Trend and seasonality",
    "Forecast results and reliability",
    "Business implications",
    "Risks and caveats",
    "Recommended actions",
];

/// Build the user prompt for `context`.
pub fn build_prompt(context: &AnalysisContext) -> Result<String, ReportError> {
    let json = serde_json::to_string_pretty(context)?;
    let sections = REPORT_SECTIONS
        .iter()
        .enumerate()
        .map(|(i, s)| format!("  {}. {}", i + 1, s))
        .collect::<Vec<_>>()
        .join("\n");

    Ok(format!(
        "You are an expert in time series analysis. Using the analysis results below, \
         write a detailed analysis report for a business audience.\n\n\
         # Analysis data\n```json\n{json}\n```\n\n\
         # Report requirements\n\
         - Output in **Markdown**\n\
         - A detailed report of roughly 1000-1500 words\n\
         - Practical content for business readers\n\
         - Include the following sections:\n{sections}\n\n\
         # Perspective\n\
         - Explain the statistical characteristics in plain language\n\
         - Focus on what the figures mean for the business\n\
         - State forecast uncertainty and risks explicitly\n\
         - Propose concrete actions\n\
         - Explain technical terms\n\n\
         Write the report.\n"
    ))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

/// Request body of the messages endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessagesRequest {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
    pub messages: Vec<Message>,
}

impl MessagesRequest {
    pub fn new(config: &ReportConfig, prompt: String) -> Self {
        Self {
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt,
            }],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
}

/// Response body of the messages endpoint; only the content is used.
#[derive(Debug, Clone, Deserialize)]
pub struct MessagesResponse {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
}

impl MessagesResponse {
    /// Concatenated text blocks; an empty response is an error.
    pub fn into_text(self) -> Result<String, ReportError> {
        let text: String = self
            .content
            .into_iter()
            .filter(|b| b.kind == "text")
            .filter_map(|b| b.text)
            .collect();
        if text.trim().is_empty() {
            Err(ReportError::InvalidResponse("no text content".into()))
        } else {
            Ok(text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insight_fcst_core::{analyze, ForecastConfig, Table, TemplateReport};

    fn context() -> AnalysisContext {
        let table = Table::from_csv_str(
            "date,value\n2024-01-01,10\n2024-01-02,11\n2024-01-03,12\n2024-01-04,13\n",
        )
        .unwrap();
        let analysis = analyze(
            &table,
            "date",
            "value",
            &ForecastConfig::with_horizon(7),
            None,
            &TemplateReport,
        )
        .unwrap();
        AnalysisContext::from_summaries(&analysis.summaries)
    }

    #[test]
    fn test_prompt_embeds_context_and_sections() {
        let prompt = build_prompt(&context()).unwrap();
        assert!(prompt.contains("\"data_profile\""));
        assert!(prompt.contains("\"forecast_results\""));
        for section in REPORT_SECTIONS {
            assert!(prompt.contains(section));
        }
    }

    #[test]
    fn test_request_body() {
        let request = MessagesRequest::new(&ReportConfig::default(), "hi".into());
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["max_tokens"], 4000);
        assert_eq!(json["temperature"], 0.7);
        assert_eq!(json["messages"][0]["role"], "user");
    }

    #[test]
    fn test_response_text() {
        let response: MessagesResponse = serde_json::from_str(
            r##"{"id":"msg_1","content":[{"type":"text","text":"# Report"},{"type":"tool_use","id":"x"}]}"##,
        )
        .unwrap();
        assert_eq!(response.into_text().unwrap(), "# Report");

        let empty: MessagesResponse = serde_json::from_str(r#"{"content":[]}"#).unwrap();
        assert!(empty.into_text().is_err());
    }
}
