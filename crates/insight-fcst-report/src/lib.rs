//! External text generator for insight-fcst extended reports.
//!
//! [`HttpTextGenerator`] implements the core's `TextGenerator` over the
//! Anthropic messages API. It reports "not configured" when no API key is
//! available, which the narrative renderer turns into a setup notice.

pub mod client;
pub mod config;
pub mod error;
pub mod prompt;

pub use client::{HttpTextGenerator, UnavailableGenerator};
pub use config::{is_ci_environment, ReportConfig};
pub use error::ReportError;
pub use prompt::{build_prompt, MessagesRequest, MessagesResponse};
