//! codeforge - build-and-run dispatcher for uploaded projects
//!
//! A request carries a zipped project, a target environment and an action. The
//! crate unpacks the archive into a throwaway workspace, builds it with the
//! environment's toolchain, optionally launches the result in a visible terminal,
//! and always removes the workspace before answering with a text report.
//!
//! # Core Concepts
//!
//! - **Toolchains**: one adapter per environment (`dotnet`, CMake, `arduino-cli`)
//!   behind the [`Toolchain`] trait, chosen by [`ToolchainSelector`]
//! - **Process runner**: [`ProcessRunner`] runs programs either captured (build
//!   output is returned as text) or visible (nothing is captured)
//! - **Orchestration**: [`BuildOrchestrator`] drives one request from validation to
//!   teardown and produces a [`BuildReport`]
//!
//! # Example Usage
//!
//! ```no_run
//! use codeforge::{BuildOrchestrator, CodeforgeConfig, RequestEnvelope, SystemRunner};
//! use std::sync::Arc;
//!
//! # async fn example(payload: String) -> Result<(), Box<dyn std::error::Error>> {
//! let config = CodeforgeConfig::default();
//! let orchestrator = BuildOrchestrator::new(&config, Arc::new(SystemRunner::new()))?;
//!
//! let report = orchestrator
//!     .process(RequestEnvelope {
//!         action: "build".to_string(),
//!         environment: "cpp".to_string(),
//!         payload,
//!         arduino_config: None,
//!     })
//!     .await?;
//! println!("{}", report);
//! # Ok(())
//! # }
//! ```
//!
//! # Project Structure
//!
//! - [`process`]: captured and visible process execution
//! - [`toolchain`]: environment adapters, selection, executable discovery
//! - [`orchestrator`]: the request lifecycle
//! - [`bridge`]: JSON message transport

pub mod archive;
pub mod bridge;
pub mod cli;
pub mod config;
pub mod orchestrator;
pub mod process;
pub mod progress;
pub mod report;
pub mod request;
pub mod toolchain;
pub mod util;
pub mod workspace;

// Re-export key types for convenient access
pub use archive::ArchiveError;
pub use bridge::{BridgeReply, MessageBridge};
pub use config::{CodeforgeConfig, ConfigError};
pub use orchestrator::{BuildOrchestrator, ProcessingError};
pub use process::{Invocation, ProcessError, ProcessRunner, SystemRunner, TerminalLauncher};
pub use report::{BuildReport, RunStatus};
pub use request::{Action, BuildRequest, RequestEnvelope, RequestError};
pub use toolchain::{
    EnvironmentId, RunOutcome, SelectError, Toolchain, ToolchainConfig, ToolchainSelector,
    ToolchainSettings,
};
pub use util::{init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
