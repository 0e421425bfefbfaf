//! Build reports returned to callers
//!
//! Callers only get text. The section markers are stable; everything between them
//! is toolchain output and must not be parsed.

use serde::Serialize;
use std::fmt;

pub const BUILD_OUTPUT_HEADER: &str = "--- Build Output ---";
pub const RUN_SKIPPED_HEADER: &str = "--- Run Skipped ---";
pub const RUN_INITIATED_HEADER: &str = "--- Run Initiated ---";

const RUN_SKIPPED_NOTICE: &str = "Project build failed, skipping execution.";
const RUN_INITIATED_NOTICE: &str = "Project execution started in a separate, visible shell.\n\
                                    Output will not be captured by this application.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// The action was `build`
    NotRequested,
    /// The build output carried a failure marker
    Skipped,
    /// The run step was launched; its output is not captured
    Initiated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    build_output: String,
    run_status: RunStatus,
}

impl BuildReport {
    pub fn new(build_output: impl Into<String>, run_status: RunStatus) -> Self {
        Self {
            build_output: build_output.into(),
            run_status,
        }
    }

    pub fn build_output(&self) -> &str {
        &self.build_output
    }

    pub fn run_status(&self) -> RunStatus {
        self.run_status
    }
}

impl fmt::Display for BuildReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", BUILD_OUTPUT_HEADER)?;
        writeln!(f, "{}", self.build_output)?;

        match self.run_status {
            RunStatus::NotRequested => Ok(()),
            RunStatus::Skipped => {
                writeln!(f, "\n{}", RUN_SKIPPED_HEADER)?;
                writeln!(f, "{}", RUN_SKIPPED_NOTICE)
            }
            RunStatus::Initiated => {
                writeln!(f, "\n{}", RUN_INITIATED_HEADER)?;
                writeln!(f, "{}", RUN_INITIATED_NOTICE)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_only_report() {
        let report = BuildReport::new("Build succeeded.", RunStatus::NotRequested);
        assert_eq!(report.to_string(), "--- Build Output ---\nBuild succeeded.\n");
    }

    #[test]
    fn test_skipped_report() {
        let report = BuildReport::new("error: oops", RunStatus::Skipped);
        assert_eq!(
            report.to_string(),
            "--- Build Output ---\nerror: oops\n\n--- Run Skipped ---\nProject build failed, skipping execution.\n"
        );
    }

    #[test]
    fn test_initiated_report() {
        let text = BuildReport::new("ok", RunStatus::Initiated).to_string();
        assert!(text.starts_with("--- Build Output ---\nok\n\n--- Run Initiated ---\n"));
        assert!(text.contains("Project execution started in a separate, visible shell.\n"));
        assert!(text.ends_with("Output will not be captured by this application.\n"));
    }

    #[test]
    fn test_report_serializes_status() {
        let json = serde_json::to_value(BuildReport::new("ok", RunStatus::NotRequested)).unwrap();
        assert_eq!(json["run_status"], "not_requested");
        assert_eq!(json["build_output"], "ok");
    }
}
