//! Toolchain adapters
//!
//! Each supported environment is served by one adapter that knows its toolchain's
//! command lines, how to judge the captured build output, and where to find what it
//! should launch afterwards:
//!
//! | Environment          | Adapter              | Build                         | Run                        |
//! |----------------------|----------------------|-------------------------------|----------------------------|
//! | `csharp`             | [`DotnetToolchain`]  | `dotnet build`                | `dotnet run` (visible)     |
//! | `cpp`                | [`CmakeToolchain`]   | `cmake -S . -B build` + build | discovered executable      |
//! | `arduino`, `esp32`   | [`ArduinoToolchain`] | `arduino-cli compile`         | `arduino-cli upload` shell |

pub mod arduino;
pub mod cmake;
pub mod discovery;
pub mod dotnet;
pub mod environment;
pub mod selector;

pub use arduino::ArduinoToolchain;
pub use cmake::CmakeToolchain;
pub use dotnet::DotnetToolchain;
pub use environment::EnvironmentId;
pub use selector::ToolchainSelector;

use crate::process::ProcessError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SelectError {
    #[error("Unsupported environment: {0}")]
    UnsupportedEnvironment(String),
}

/// Board and serial port for microcontroller targets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolchainConfig {
    /// Fully qualified board name, e.g. `arduino:avr:uno`
    #[serde(default)]
    pub board: String,

    /// Serial port, e.g. `/dev/ttyACM0` or `COM3`
    #[serde(default)]
    pub port: String,
}

impl ToolchainConfig {
    pub fn new(board: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            board: board.into(),
            port: port.into(),
        }
    }
}

/// Program names used to reach each toolchain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainSettings {
    pub dotnet_program: String,
    pub cmake_program: String,
    pub arduino_cli_program: String,
    /// Executable name looked up first after a CMake build
    pub cpp_target: Option<String>,
}

impl Default for ToolchainSettings {
    fn default() -> Self {
        Self {
            dotnet_program: "dotnet".to_string(),
            cmake_program: "cmake".to_string(),
            arduino_cli_program: "arduino-cli".to_string(),
            cpp_target: None,
        }
    }
}

/// Result of a run step.
///
/// Run steps are fire-and-forget from the caller's point of view: the outcome is
/// logged by the orchestrator and never folded into the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub started: bool,
    pub error: Option<String>,
}

impl RunOutcome {
    pub fn started() -> Self {
        Self {
            started: true,
            error: None,
        }
    }

    pub fn not_started(error: impl Into<String>) -> Self {
        Self {
            started: false,
            error: Some(error.into()),
        }
    }
}

impl From<Result<(), ProcessError>> for RunOutcome {
    fn from(result: Result<(), ProcessError>) -> Self {
        match result {
            Ok(()) => RunOutcome::started(),
            Err(e) => RunOutcome::not_started(e.to_string()),
        }
    }
}

#[async_trait]
pub trait Toolchain: Send + Sync {
    fn environment(&self) -> EnvironmentId;

    /// Builds the project in `workspace` and returns the captured toolchain output.
    ///
    /// Configuration problems are reported as output text; only a failure to start
    /// the toolchain is an `Err`.
    async fn build(&self, workspace: &Path) -> Result<String, ProcessError>;

    /// Launches the built project in a visible terminal. Never fails outward.
    async fn run(&self, workspace: &Path) -> RunOutcome;

    /// Failure-marker heuristic applied to the build output before running.
    fn reports_failure(&self, build_output: &str) -> bool {
        contains_failure_marker(build_output)
    }
}

/// `true` when the text contains `error:` or `failed`, ignoring case.
pub fn contains_failure_marker(output: &str) -> bool {
    let lowered = output.to_lowercase();
    lowered.contains("error:") || lowered.contains("failed")
}
