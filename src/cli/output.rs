//! Output formatting for build reports and configuration

use anyhow::{Context, Result};
use serde_json;

use crate::config::CodeforgeConfig;
use crate::report::BuildReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON format (machine-readable)
    Json,
    /// The report text exactly as bridge callers receive it
    Human,
}

pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format(&self, report: &BuildReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "report": report,
                    "text": report.to_string(),
                });
                serde_json::to_string_pretty(&output)
                    .context("Failed to serialize build report to JSON")
            }
            OutputFormat::Human => Ok(report.to_string()),
        }
    }

    pub fn format_config(&self, config: &CodeforgeConfig) -> Result<String> {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&config.to_display_map())
                .context("Failed to serialize configuration to JSON"),
            OutputFormat::Human => Ok(config.to_string()),
        }
    }

    pub fn format_error(&self, error: &anyhow::Error) -> String {
        match self.format {
            OutputFormat::Json => serde_json::json!({ "error": format!("{:#}", error) }).to_string(),
            OutputFormat::Human => format!("Error: {:#}", error),
        }
    }
}
