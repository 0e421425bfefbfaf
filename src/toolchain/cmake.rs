//! CMake toolchain (C/C++)

use super::discovery::{cmake_target_name, find_executable, DiscoveredExecutable};
use super::{EnvironmentId, RunOutcome, Toolchain};
use crate::process::{Invocation, ProcessError, ProcessRunner};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Out-of-source build directory, relative to the workspace
pub const BUILD_DIR: &str = "build";

/// Prefix of the report returned when the configure step aborts the build.
pub const CONFIGURE_FAILED: &str = "CMake configuration failed:";

pub struct CmakeToolchain {
    program: String,
    target: Option<String>,
    runner: Arc<dyn ProcessRunner>,
}

impl CmakeToolchain {
    pub fn new(program: impl Into<String>, runner: Arc<dyn ProcessRunner>) -> Self {
        Self {
            program: program.into(),
            target: None,
            runner,
        }
    }

    /// Executable name to probe before the generic scans.
    pub fn with_target(mut self, target: Option<String>) -> Self {
        self.target = target;
        self
    }

    /// Resolves the target name and searches `build/` on the blocking pool.
    async fn locate_executable(&self, workspace: &Path) -> Option<DiscoveredExecutable> {
        let workspace = workspace.to_path_buf();
        let configured = self.target.clone();

        let search = tokio::task::spawn_blocking(move || {
            let target = configured.or_else(|| target_from_lists(&workspace));
            find_executable(&workspace.join(BUILD_DIR), target.as_deref())
        });

        match search.await {
            Ok(found) => found,
            Err(e) => {
                warn!("Executable search task failed: {}", e);
                None
            }
        }
    }
}

fn target_from_lists(workspace: &Path) -> Option<String> {
    let lists = std::fs::read_to_string(workspace.join("CMakeLists.txt")).ok()?;
    cmake_target_name(&lists)
}

#[async_trait]
impl Toolchain for CmakeToolchain {
    fn environment(&self) -> EnvironmentId {
        EnvironmentId::Cpp
    }

    async fn build(&self, workspace: &Path) -> Result<String, ProcessError> {
        info!("Building C++ project at: {}", workspace.display());

        let configure = Invocation::new(&self.program)
            .args(["-S", ".", "-B", BUILD_DIR])
            .current_dir(workspace);
        let configure_output = self.runner.run_captured(&configure).await?;

        if configure_output.contains("Error") || configure_output.contains("error:") {
            warn!("CMake configure reported an error, skipping compile step");
            return Ok(format!("{}\n{}", CONFIGURE_FAILED, configure_output));
        }
        debug!("CMake configure output:\n{}", configure_output);

        let compile = Invocation::new(&self.program)
            .args(["--build", BUILD_DIR])
            .current_dir(workspace);
        self.runner.run_captured(&compile).await
    }

    async fn run(&self, workspace: &Path) -> RunOutcome {
        let build_dir = workspace.join(BUILD_DIR);

        let Some(found) = self.locate_executable(workspace).await else {
            let message = format!(
                "C++ executable not found in '{}'. Ensure the project builds an executable target.",
                build_dir.display()
            );
            error!("{}", message);
            return RunOutcome::not_started(message);
        };

        info!(
            tier = ?found.tier,
            "Executing C++ application: {} in a visible shell",
            found.path.display()
        );

        let mut invocation = Invocation::new(found.path.to_string_lossy());
        if let Some(dir) = found.path.parent() {
            invocation = invocation.current_dir(dir);
        }

        let outcome = RunOutcome::from(self.runner.run_visible(&invocation).await);
        if let Some(e) = &outcome.error {
            error!("C++ executable could not be launched: {}", e);
        }
        outcome
    }

    /// Configure steps routinely print error-like diagnostics that do not stop the
    /// build, so only an explicit configure abort counts as failure here.
    fn reports_failure(&self, build_output: &str) -> bool {
        build_output.starts_with(CONFIGURE_FAILED)
    }
}
