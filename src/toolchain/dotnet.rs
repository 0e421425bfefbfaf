//! .NET SDK toolchain (C#)

use super::{EnvironmentId, RunOutcome, Toolchain};
use crate::process::{Invocation, ProcessError, ProcessRunner};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

/// `dotnet build` / `dotnet run`. The SDK resolves the project entry point itself.
pub struct DotnetToolchain {
    program: String,
    runner: Arc<dyn ProcessRunner>,
}

impl DotnetToolchain {
    pub fn new(program: impl Into<String>, runner: Arc<dyn ProcessRunner>) -> Self {
        Self {
            program: program.into(),
            runner,
        }
    }
}

#[async_trait]
impl Toolchain for DotnetToolchain {
    fn environment(&self) -> EnvironmentId {
        EnvironmentId::CSharp
    }

    async fn build(&self, workspace: &Path) -> Result<String, ProcessError> {
        info!("Building C# project at: {}", workspace.display());

        let invocation = Invocation::new(&self.program)
            .arg("build")
            .current_dir(workspace);
        self.runner.run_captured(&invocation).await
    }

    async fn run(&self, workspace: &Path) -> RunOutcome {
        info!("Running C# project at: {} in a visible shell", workspace.display());

        let invocation = Invocation::new(&self.program)
            .arg("run")
            .current_dir(workspace);
        let outcome = RunOutcome::from(self.runner.run_visible(&invocation).await);

        if let Some(e) = &outcome.error {
            error!("dotnet run could not be launched: {}", e);
        }
        outcome
    }
}
