//! Subcommand handlers. Each returns the process exit code.

use super::commands::{BuildArgs, ServeArgs};
use super::output::{OutputFormat, OutputFormatter};
use crate::archive;
use crate::bridge::MessageBridge;
use crate::config::CodeforgeConfig;
use crate::orchestrator::BuildOrchestrator;
use crate::process::SystemRunner;
use crate::progress::LoggingHandler;
use crate::request::BuildRequest;
use crate::toolchain::{EnvironmentId, ToolchainConfig};
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::{debug, error, info};

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_CONFIG_ERROR: i32 = 2;

fn load_config() -> Result<CodeforgeConfig> {
    let config = CodeforgeConfig::default();
    config.validate().context("Invalid configuration")?;
    debug!("{}", config);
    Ok(config)
}

fn build_orchestrator(config: &CodeforgeConfig) -> Result<BuildOrchestrator> {
    let runner = SystemRunner::with_terminal(config.terminal_launcher());
    match runner.terminal() {
        Some(terminal) => debug!("Visible runs open in '{}'", terminal.program()),
        None => debug!("No terminal for visible runs; their output goes to stderr"),
    }
    let orchestrator = BuildOrchestrator::new(config, Arc::new(runner))
        .context("Failed to initialize build orchestrator")?;
    Ok(orchestrator.with_progress(Arc::new(LoggingHandler)))
}

/// Reads a `.zip` as-is, or packs a directory in memory.
pub fn load_project(path: &Path) -> Result<Vec<u8>> {
    if path.is_dir() {
        info!("Packing project directory: {}", path.display());
        archive::pack_directory(path)
            .with_context(|| format!("Failed to pack directory {}", path.display()))
    } else {
        std::fs::read(path).with_context(|| format!("Failed to read archive {}", path.display()))
    }
}

pub async fn handle_build(args: &BuildArgs) -> i32 {
    let formatter = OutputFormatter::new(OutputFormat::from(args.format));

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", formatter.format_error(&e));
            return EXIT_CONFIG_ERROR;
        }
    };

    match run_build(args, &config, &formatter).await {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            error!("Build command failed: {:#}", e);
            eprintln!("{}", formatter.format_error(&e));
            EXIT_FAILURE
        }
    }
}

async fn run_build(
    args: &BuildArgs,
    config: &CodeforgeConfig,
    formatter: &OutputFormatter,
) -> Result<()> {
    let environment: EnvironmentId = args.environment.parse()?;
    let bytes = load_project(&args.project_path)?;

    let mut request = BuildRequest::new(args.action.into(), environment, bytes);
    if args.board.is_some() || args.port.is_some() {
        request = request.with_tool_config(ToolchainConfig::new(
            args.board.clone().unwrap_or_default(),
            args.port.clone().unwrap_or_default(),
        ));
    }

    let orchestrator = build_orchestrator(config)?;
    let report = orchestrator.execute(request).await?;
    let output = formatter.format(&report)?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, &output)
                .with_context(|| format!("Failed to write output to {}", path.display()))?;
            info!("Report written to {}", path.display());
        }
        None => print!("{}", output),
    }

    Ok(())
}

pub async fn handle_serve(args: &ServeArgs) -> i32 {
    let mut config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return EXIT_CONFIG_ERROR;
        }
    };
    if let Some(root) = &args.workspace_root {
        config.workspace_root = root.clone();
    }

    match run_serve(&config).await {
        Ok(handled) => {
            info!("Served {} request(s)", handled);
            EXIT_SUCCESS
        }
        Err(e) => {
            error!("Serve failed: {:#}", e);
            eprintln!("Error: {:#}", e);
            EXIT_FAILURE
        }
    }
}

async fn run_serve(config: &CodeforgeConfig) -> Result<usize> {
    let orchestrator = build_orchestrator(config)?;
    let bridge = MessageBridge::new(Arc::new(orchestrator));

    info!("Waiting for requests on stdin");
    bridge
        .serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await
        .context("Failed to serve requests")
}
