//! arduino-cli toolchain (Arduino and ESP32 boards)
//!
//! arduino-cli insists that a sketch lives at `<dir>/<dir>.ino`. Uploaded projects
//! rarely respect that, so both build and run first normalize the sketch name.

use super::{EnvironmentId, RunOutcome, Toolchain, ToolchainConfig};
use crate::process::{Invocation, ProcessError, ProcessRunner};
use async_trait::async_trait;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

pub const SKETCH_EXTENSION: &str = "ino";

pub struct ArduinoToolchain {
    environment: EnvironmentId,
    config: ToolchainConfig,
    program: String,
    runner: Arc<dyn ProcessRunner>,
}

impl ArduinoToolchain {
    pub fn new(
        environment: EnvironmentId,
        config: ToolchainConfig,
        program: impl Into<String>,
        runner: Arc<dyn ProcessRunner>,
    ) -> Self {
        Self {
            environment,
            config,
            program: program.into(),
            runner,
        }
    }

    pub fn config(&self) -> &ToolchainConfig {
        &self.config
    }

    /// Shell command line that uploads and then waits for a key press, so the
    /// terminal stays open long enough to read the result.
    fn upload_wrapper(&self, sketch: &Path, workspace: &Path) -> Invocation {
        let sketch = sketch.to_string_lossy();

        if cfg!(windows) {
            let upload = format!(
                "{} upload -p \"{}\" --fqbn {} \"{}\"",
                self.program, self.config.port, self.config.board, sketch
            );
            Invocation::new("cmd.exe")
                .arg("/c")
                .arg(format!("{} & pause", upload))
                .current_dir(workspace)
        } else {
            let upload = format!(
                "{} upload -p {} --fqbn {} {}",
                shell_quote(&self.program),
                shell_quote(&self.config.port),
                shell_quote(&self.config.board),
                shell_quote(&sketch)
            );
            Invocation::new("sh")
                .arg("-c")
                .arg(format!(
                    "{}; printf '\\nPress Enter to close...'; read _",
                    upload
                ))
                .current_dir(workspace)
        }
    }
}

#[async_trait]
impl Toolchain for ArduinoToolchain {
    fn environment(&self) -> EnvironmentId {
        self.environment
    }

    async fn build(&self, workspace: &Path) -> Result<String, ProcessError> {
        info!("Starting {} build at: {}", self.environment, workspace.display());

        if self.config.board.trim().is_empty() {
            return Ok("Error: Arduino board not specified.".to_string());
        }

        let Some(sketch) = prepare_sketch_blocking(workspace).await else {
            return Ok(format!(
                "Error: No .{} file found in {}.",
                SKETCH_EXTENSION,
                workspace.display()
            ));
        };

        let invocation = Invocation::new(&self.program)
            .args(["compile", "--fqbn", self.config.board.as_str()])
            .arg(sketch.to_string_lossy())
            .current_dir(workspace);
        self.runner.run_captured(&invocation).await
    }

    async fn run(&self, workspace: &Path) -> RunOutcome {
        info!("Uploading to {}...", self.config.board);

        let Some(sketch) = prepare_sketch_blocking(workspace).await else {
            let message = format!("No .{} sketch to upload", SKETCH_EXTENSION);
            error!("{}", message);
            return RunOutcome::not_started(message);
        };

        if self.config.port.trim().is_empty() {
            warn!("No serial port configured, arduino-cli upload will likely fail");
        }

        info!("Opening terminal for upload...");
        let invocation = self.upload_wrapper(&sketch, workspace);
        let outcome = RunOutcome::from(self.runner.run_visible(&invocation).await);

        match &outcome.error {
            None => info!("Arduino upload process finished"),
            Some(e) => error!("Visible upload could not be launched: {}", e),
        }
        outcome
    }
}

/// [`prepare_sketch`] on the blocking pool; the walk and rename touch the disk.
async fn prepare_sketch_blocking(workspace: &Path) -> Option<PathBuf> {
    let workspace = workspace.to_path_buf();
    match tokio::task::spawn_blocking(move || prepare_sketch(&workspace)).await {
        Ok(sketch) => sketch,
        Err(e) => {
            warn!("Sketch preparation task failed: {}", e);
            None
        }
    }
}

/// Finds the first sketch under `workspace` and renames it to match its parent
/// directory. Already-matching sketches are left alone. When `<dir>/<dir>.ino`
/// already exists it wins and nothing is renamed. A failed rename is logged and
/// the sketch keeps its old name.
pub fn prepare_sketch(workspace: &Path) -> Option<PathBuf> {
    let sketch = find_first_sketch(workspace)?;
    let parent = sketch.parent()?;
    let folder_name = parent.file_name()?.to_string_lossy().into_owned();

    let expected = parent.join(format!("{}.{}", folder_name, SKETCH_EXTENSION));
    if sketch == expected {
        return Some(sketch);
    }
    if expected.exists() {
        info!(
            "Using existing {}, leaving {} as a secondary tab",
            expected.display(),
            sketch.display()
        );
        return Some(expected);
    }

    info!(
        "Renaming {} to {}",
        sketch.file_name().map(|n| n.to_string_lossy()).unwrap_or_default(),
        expected.display()
    );
    match std::fs::rename(&sketch, &expected) {
        Ok(()) => Some(expected),
        Err(e) => {
            warn!("Failed to rename sketch {}: {}", sketch.display(), e);
            Some(sketch)
        }
    }
}

fn find_first_sketch(workspace: &Path) -> Option<PathBuf> {
    WalkBuilder::new(workspace)
        .standard_filters(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().map_or(false, |ft| ft.is_file()))
        .map(|entry| entry.into_path())
        .find(|path| {
            path.extension()
                .map_or(false, |ext| ext.eq_ignore_ascii_case(SKETCH_EXTENSION))
        })
}

fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}
